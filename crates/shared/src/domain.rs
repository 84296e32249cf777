use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(EmployeeId);
id_newtype!(ChurchId);
id_newtype!(ServiceId);
id_newtype!(AbsenceId);

/// Closed catalog of service kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Gudstjeneste,
    Vielse,
    Konsert,
    Annet,
    Vikartjeneste,
}

impl ServiceKind {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Gudstjeneste => "Gudstjeneste",
            Self::Vielse => "Vielse",
            Self::Konsert => "Konsert",
            Self::Annet => "Annet",
            Self::Vikartjeneste => "Vikartjeneste",
        }
    }

    /// Stable tag handed to the rendering layer for styling.
    pub fn style_tag(self) -> &'static str {
        match self {
            Self::Gudstjeneste => "gudstjeneste",
            Self::Vielse => "vielse",
            Self::Konsert => "konsert",
            Self::Annet => "annet",
            Self::Vikartjeneste => "vikartjeneste",
        }
    }
}

/// Closed catalog of absence kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceKind {
    Frihelg,
    Avspasering,
    Sykemelding,
    Ferie,
}

impl AbsenceKind {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Frihelg => "Frihelg",
            Self::Avspasering => "Avspasering",
            Self::Sykemelding => "Sykemelding",
            Self::Ferie => "Ferie",
        }
    }

    pub fn style_tag(self) -> &'static str {
        match self {
            Self::Frihelg => "frihelg",
            Self::Avspasering => "avspasering",
            Self::Sykemelding => "sykemelding",
            Self::Ferie => "ferie",
        }
    }
}

/// A named staff member. Identity is `id`; `position` is a display-order
/// hint assigned at creation time and never re-normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Church {
    pub id: ChurchId,
    pub name: String,
}

/// A single-day duty. `employee_id = None` means unassigned (inbox).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub kind: ServiceKind,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<EmployeeId>,
    pub church_id: ChurchId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A date-ranged unavailability record; the range is inclusive on both ends
/// and `start_date <= end_date` holds for every stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    pub id: AbsenceId,
    pub kind: AbsenceKind,
    pub employee_id: EmployeeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Absence {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}
