use chrono::NaiveDate;
use shared::domain::{Absence, EmployeeId, Service};

use crate::index::EventIndex;
use crate::roster::{ChurchDirectory, RosterModel};
use crate::window::{classify, DayKind};

/// Sentinel rendered when a service references a church that is not in the
/// loaded catalog.
pub const UNKNOWN_CHURCH: &str = "unknown church";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridColumn {
    /// Virtual column holding unassigned services.
    Inbox,
    Employee { id: EmployeeId, name: String },
    /// Affordance column for appending a new employee; never holds events.
    NewEmployee,
}

/// A service with its church reference resolved for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCell {
    pub service: Service,
    pub church_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridCell {
    pub services: Vec<ServiceCell>,
    pub absences: Vec<Absence>,
}

impl GridCell {
    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.absences.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub date: NaiveDate,
    pub day_kind: DayKind,
    /// One cell per column, in column order.
    pub cells: Vec<GridCell>,
}

/// Renderable board state, recomputed fresh per projection. It has no
/// identity of its own beyond the snapshot it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid {
    pub columns: Vec<GridColumn>,
    pub rows: Vec<GridRow>,
    pub compact_mode: bool,
}

/// Pure derivation of the grid from the fetched model.
///
/// `date_range` is the collaborator's authoritative row set. Columns are
/// `[inbox] ++ roster ++ [new-employee]`; the inbox is populated from
/// unassigned services only and never shows absences. `compact_mode` is
/// passed through for the rendering layer, it does not filter events here.
pub fn project(
    date_range: &[NaiveDate],
    roster: &RosterModel,
    churches: &ChurchDirectory,
    index: &EventIndex,
    compact_mode: bool,
) -> CalendarGrid {
    let mut columns = Vec::with_capacity(roster.len() + 2);
    columns.push(GridColumn::Inbox);
    for employee in roster.employees() {
        columns.push(GridColumn::Employee {
            id: employee.id,
            name: employee.name.clone(),
        });
    }
    columns.push(GridColumn::NewEmployee);

    let rows = date_range
        .iter()
        .map(|&date| {
            let cells = columns
                .iter()
                .map(|column| match column {
                    GridColumn::Inbox => GridCell {
                        services: resolve_services(index.services_for(date, None), churches),
                        absences: Vec::new(),
                    },
                    GridColumn::Employee { id, .. } => GridCell {
                        services: resolve_services(index.services_for(date, Some(*id)), churches),
                        absences: index
                            .absences_for(date, *id)
                            .into_iter()
                            .cloned()
                            .collect(),
                    },
                    GridColumn::NewEmployee => GridCell::default(),
                })
                .collect();
            GridRow {
                date,
                day_kind: classify(date),
                cells,
            }
        })
        .collect();

    CalendarGrid {
        columns,
        rows,
        compact_mode,
    }
}

fn resolve_services(services: &[Service], churches: &ChurchDirectory) -> Vec<ServiceCell> {
    services
        .iter()
        .map(|service| ServiceCell {
            service: service.clone(),
            church_name: churches
                .name_of(service.church_id)
                .unwrap_or(UNKNOWN_CHURCH)
                .to_string(),
        })
        .collect()
}
