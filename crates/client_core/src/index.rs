use std::collections::HashMap;

use chrono::NaiveDate;
use shared::domain::{Absence, EmployeeId, Service};

/// In-memory index over one fetched snapshot.
///
/// Built wholesale per fetch and never patched incrementally. Services are
/// bucketed by `(date, employee)` with an explicit `None` bucket for the
/// inbox; absences are bucketed per employee and range-filtered per query,
/// so per-cell resolution stays proportional to the bucket, not the whole
/// collection.
#[derive(Debug, Default, Clone)]
pub struct EventIndex {
    services: HashMap<(NaiveDate, Option<EmployeeId>), Vec<Service>>,
    absences: HashMap<EmployeeId, Vec<Absence>>,
}

impl EventIndex {
    pub fn build(services: &[Service], absences: &[Absence]) -> Self {
        let mut index = Self::default();
        for service in services {
            index
                .services
                .entry((service.date, service.employee_id))
                .or_default()
                .push(service.clone());
        }
        for absence in absences {
            index
                .absences
                .entry(absence.employee_id)
                .or_default()
                .push(absence.clone());
        }
        index
    }

    /// Services on `date` for `employee`; `None` matches unassigned
    /// services only, never "any employee".
    pub fn services_for(&self, date: NaiveDate, employee: Option<EmployeeId>) -> &[Service] {
        self.services
            .get(&(date, employee))
            .map_or(&[], Vec::as_slice)
    }

    /// Absences whose inclusive range covers `date` for `employee`.
    /// Overlapping records are all returned; the core does not deduplicate.
    pub fn absences_for(&self, date: NaiveDate, employee: EmployeeId) -> Vec<&Absence> {
        self.absences
            .get(&employee)
            .into_iter()
            .flatten()
            .filter(|absence| absence.covers(date))
            .collect()
    }
}
