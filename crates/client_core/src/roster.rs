use std::collections::HashMap;

use shared::domain::{Church, ChurchId, Employee, EmployeeId};
use shared::protocol::MutationCommand;

/// Ordered employee list for the current snapshot.
///
/// Ordering authority is the collaborator: the model never reorders
/// locally, it renders employees exactly as fetched. The inbox and
/// new-employee columns are not roster entries; the projector synthesizes
/// them.
#[derive(Debug, Default, Clone)]
pub struct RosterModel {
    employees: Vec<Employee>,
}

impl RosterModel {
    pub fn from_employees(employees: Vec<Employee>) -> Self {
        Self { employees }
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    /// Total lookup; a missing id is a `ReferenceMiss`, not a failure.
    pub fn name_of(&self, id: EmployeeId) -> Option<&str> {
        self.employees
            .iter()
            .find(|employee| employee.id == id)
            .map(|employee| employee.name.as_str())
    }

    /// Creation command for a new employee appended after the current
    /// roster. Blank or whitespace-only names are silently discarded.
    pub fn append(&self, name: &str) -> Option<MutationCommand> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(MutationCommand::CreateEmployee {
            name: trimmed.to_string(),
            position: self.employees.len() as u32,
        })
    }

    /// Rename command for an existing employee; identity and position are
    /// untouched. Blank names are silently discarded.
    pub fn rename(&self, id: EmployeeId, new_name: &str) -> Option<MutationCommand> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(MutationCommand::RenameEmployee {
            id,
            name: trimmed.to_string(),
        })
    }
}

/// Church catalog for the current snapshot, keyed for total lookups.
#[derive(Debug, Default, Clone)]
pub struct ChurchDirectory {
    names: HashMap<ChurchId, String>,
}

impl ChurchDirectory {
    pub fn from_churches(churches: Vec<Church>) -> Self {
        Self {
            names: churches
                .into_iter()
                .map(|church| (church.id, church.name))
                .collect(),
        }
    }

    pub fn name_of(&self, id: ChurchId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }
}
