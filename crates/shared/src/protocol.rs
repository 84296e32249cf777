use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Absence, AbsenceId, AbsenceKind, Church, ChurchId, Employee, EmployeeId, Service, ServiceId,
    ServiceKind,
};

/// Window-and-mode key for one calendar fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub compact_mode: bool,
}

/// Everything the board needs for one window, returned by a single fetch.
///
/// `date_range` is the authoritative row set: in compact mode the
/// collaborator thins it down to event-bearing dates, so the core renders
/// exactly the returned range instead of recomputing it locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSnapshot {
    pub services: Vec<Service>,
    pub absences: Vec<Absence>,
    pub employees: Vec<Employee>,
    pub churches: Vec<Church>,
    pub date_range: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub position: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChurchRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurchPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDraft {
    pub kind: ServiceKind,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<EmployeeId>,
    pub church_id: ChurchId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ServiceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    /// `Some(None)` reassigns the service to the inbox.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<Option<EmployeeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub church_id: Option<ChurchId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceDraft {
    pub kind: AbsenceKind,
    pub employee_id: EmployeeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsencePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AbsenceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<EmployeeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One write against the collaborator. Every command is followed by an
/// unconditional refetch; the core never patches its model locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MutationCommand {
    CreateEmployee {
        name: String,
        position: u32,
    },
    RenameEmployee {
        id: EmployeeId,
        name: String,
    },
    CreateChurch {
        name: String,
    },
    RenameChurch {
        id: ChurchId,
        name: String,
    },
    CreateService(ServiceDraft),
    UpdateService {
        id: ServiceId,
        patch: ServicePatch,
    },
    CreateAbsence(AbsenceDraft),
    UpdateAbsence {
        id: AbsenceId,
        patch: AbsencePatch,
    },
}
