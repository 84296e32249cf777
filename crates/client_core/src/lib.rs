use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use shared::domain::{AbsenceId, EmployeeId, ServiceId};
use shared::protocol::{
    AbsenceDraft, AbsencePatch, CalendarQuery, CalendarSnapshot, MutationCommand, ServiceDraft,
    ServicePatch,
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod backend;
pub mod grid;
pub mod index;
pub mod roster;
pub mod window;

pub use backend::{CalendarBackend, HttpCalendarBackend, MissingCalendarBackend};

use grid::CalendarGrid;
use index::EventIndex;
use roster::{ChurchDirectory, RosterModel};
use window::{DateWindow, NavDirection, QuickFilter};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("calendar fetch failed: {0}")]
    Fetch(String),
}

/// Controller lifecycle. `Failed` carries a human-readable error and halts
/// grid rendering until a user-triggered retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum CalendarEvent {
    Refreshed,
    RefreshFailed(String),
    /// Non-blocking: a reconciling refresh still runs after this.
    MutationFailed(String),
}

/// Everything derived from one successful fetch, replaced wholesale.
struct CalendarModel {
    roster: RosterModel,
    churches: ChurchDirectory,
    index: EventIndex,
    date_range: Vec<NaiveDate>,
}

impl CalendarModel {
    fn from_snapshot(snapshot: CalendarSnapshot) -> Self {
        Self {
            index: EventIndex::build(&snapshot.services, &snapshot.absences),
            roster: RosterModel::from_employees(snapshot.employees),
            churches: ChurchDirectory::from_churches(snapshot.churches),
            date_range: snapshot.date_range,
        }
    }
}

struct ClientState {
    phase: SyncPhase,
    anchor: NaiveDate,
    window: DateWindow,
    compact_mode: bool,
    model: Option<CalendarModel>,
    /// Sequence token of the most recently issued fetch; responses carrying
    /// an older token are discarded so a late arrival can never overwrite a
    /// newer window's data.
    issued_seq: u64,
}

/// Scheduling-board controller: owns the fetched model, derives the grid,
/// and drives every collaborator round-trip.
pub struct CalendarClient {
    backend: Arc<dyn CalendarBackend>,
    inner: Mutex<ClientState>,
    events: broadcast::Sender<CalendarEvent>,
}

impl CalendarClient {
    pub fn new(
        backend: Arc<dyn CalendarBackend>,
        anchor: NaiveDate,
        compact_mode: bool,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            backend,
            inner: Mutex::new(ClientState {
                phase: SyncPhase::Idle,
                anchor,
                window: DateWindow::from_anchor(anchor),
                compact_mode,
                model: None,
                issued_seq: 0,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CalendarEvent> {
        self.events.subscribe()
    }

    pub async fn phase(&self) -> SyncPhase {
        self.inner.lock().await.phase.clone()
    }

    pub async fn window(&self) -> DateWindow {
        self.inner.lock().await.window
    }

    pub async fn compact_mode(&self) -> bool {
        self.inner.lock().await.compact_mode
    }

    /// Projects the current model. `None` until the first successful fetch
    /// and whenever the controller is in `Failed`.
    pub async fn grid(&self) -> Option<CalendarGrid> {
        let guard = self.inner.lock().await;
        if guard.phase != SyncPhase::Ready {
            return None;
        }
        guard.model.as_ref().map(|model| {
            grid::project(
                &model.date_range,
                &model.roster,
                &model.churches,
                &model.index,
                guard.compact_mode,
            )
        })
    }

    /// Fetches the current window and replaces the model atomically.
    ///
    /// Overlapping calls are not serialized; each fetch carries a sequence
    /// token and only the most recently issued one may install its response
    /// (last-issued-wins).
    pub async fn refresh(&self) -> Result<()> {
        let (seq, query) = {
            let mut guard = self.inner.lock().await;
            guard.issued_seq += 1;
            guard.phase = SyncPhase::Loading;
            (
                guard.issued_seq,
                CalendarQuery {
                    start_date: guard.window.start,
                    end_date: guard.window.end,
                    compact_mode: guard.compact_mode,
                },
            )
        };

        let result = self.backend.fetch_calendar(&query).await;

        let mut guard = self.inner.lock().await;
        if guard.issued_seq != seq {
            info!(
                seq,
                latest = guard.issued_seq,
                "calendar: discarding superseded fetch response"
            );
            return Ok(());
        }
        match result {
            Ok(snapshot) => {
                guard.model = Some(CalendarModel::from_snapshot(snapshot));
                guard.phase = SyncPhase::Ready;
                drop(guard);
                let _ = self.events.send(CalendarEvent::Refreshed);
                Ok(())
            }
            Err(err) => {
                let message = format!("{err:#}");
                warn!(
                    start = %query.start_date,
                    end = %query.end_date,
                    "calendar: fetch failed: {message}"
                );
                guard.phase = SyncPhase::Failed(message.clone());
                drop(guard);
                let _ = self
                    .events
                    .send(CalendarEvent::RefreshFailed(message.clone()));
                Err(SyncError::Fetch(message).into())
            }
        }
    }

    /// Fire-and-refresh: issues the command and reconciles with an
    /// unconditional refetch regardless of the command's outcome. A failed
    /// command surfaces as a `MutationFailed` event, never as a blocking
    /// error.
    pub async fn mutate(&self, command: MutationCommand) -> Result<()> {
        if let Err(err) = self.apply_command(&command).await {
            let message = format!("{err:#}");
            warn!("calendar: mutation failed: {message}");
            let _ = self.events.send(CalendarEvent::MutationFailed(message));
        }
        self.refresh().await
    }

    async fn apply_command(&self, command: &MutationCommand) -> Result<()> {
        match command {
            MutationCommand::CreateEmployee { name, position } => {
                self.backend.create_employee(name, *position).await?;
            }
            MutationCommand::RenameEmployee { id, name } => {
                self.backend.rename_employee(*id, name).await?;
            }
            MutationCommand::CreateChurch { name } => {
                self.backend.create_church(name).await?;
            }
            MutationCommand::RenameChurch { id, name } => {
                self.backend.rename_church(*id, name).await?;
            }
            MutationCommand::CreateService(draft) => {
                self.backend.create_service(draft).await?;
            }
            MutationCommand::UpdateService { id, patch } => {
                self.backend.update_service(*id, patch).await?;
            }
            MutationCommand::CreateAbsence(draft) => {
                self.backend.create_absence(draft).await?;
            }
            MutationCommand::UpdateAbsence { id, patch } => {
                self.backend.update_absence(*id, patch).await?;
            }
        }
        Ok(())
    }

    /// Re-anchors the window to the week of `anchor` and refetches.
    pub async fn set_anchor(&self, anchor: NaiveDate) -> Result<()> {
        {
            let mut guard = self.inner.lock().await;
            guard.anchor = anchor;
            guard.window = DateWindow::from_anchor(anchor);
        }
        self.refresh().await
    }

    /// Shifts the anchor one ISO week and refetches.
    pub async fn navigate(&self, direction: NavDirection) -> Result<()> {
        let anchor = {
            let guard = self.inner.lock().await;
            let delta = match direction {
                NavDirection::Prev => -7,
                NavDirection::Next => 7,
            };
            guard.anchor + Duration::days(delta)
        };
        self.set_anchor(anchor).await
    }

    /// Applies a quick-filter preset anchored at `today` and refetches.
    pub async fn apply_quick_filter(&self, filter: QuickFilter, today: NaiveDate) -> Result<()> {
        {
            let mut guard = self.inner.lock().await;
            let (window, anchor) = filter.window_from(today);
            guard.window = window;
            guard.anchor = anchor;
        }
        self.refresh().await
    }

    /// Toggles display density; the collaborator pre-thins the date range
    /// in compact mode, so this is a refetch, not a local filter.
    pub async fn set_compact_mode(&self, compact_mode: bool) -> Result<()> {
        {
            let mut guard = self.inner.lock().await;
            if guard.compact_mode == compact_mode {
                return Ok(());
            }
            guard.compact_mode = compact_mode;
        }
        self.refresh().await
    }

    /// Appends a new employee after the current roster. Returns `Ok(false)`
    /// when the name is blank and the command was discarded.
    pub async fn append_employee(&self, name: &str) -> Result<bool> {
        let command = {
            let guard = self.inner.lock().await;
            match &guard.model {
                Some(model) => model.roster.append(name),
                None => RosterModel::default().append(name),
            }
        };
        match command {
            Some(command) => {
                self.mutate(command).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Renames an employee in place. Returns `Ok(false)` when the name is
    /// blank and the command was discarded.
    pub async fn rename_employee(&self, id: EmployeeId, name: &str) -> Result<bool> {
        let command = {
            let guard = self.inner.lock().await;
            match &guard.model {
                Some(model) => model.roster.rename(id, name),
                None => RosterModel::default().rename(id, name),
            }
        };
        match command {
            Some(command) => {
                self.mutate(command).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Places a new service; extension point for the edit affordance.
    pub async fn place_service(&self, draft: ServiceDraft) -> Result<()> {
        self.mutate(MutationCommand::CreateService(draft)).await
    }

    pub async fn edit_service(&self, id: ServiceId, patch: ServicePatch) -> Result<()> {
        self.mutate(MutationCommand::UpdateService { id, patch })
            .await
    }

    /// Places a new absence. Returns `Ok(false)` and discards the command
    /// when the draft violates `start_date <= end_date`.
    pub async fn place_absence(&self, draft: AbsenceDraft) -> Result<bool> {
        if draft.start_date > draft.end_date {
            return Ok(false);
        }
        self.mutate(MutationCommand::CreateAbsence(draft)).await?;
        Ok(true)
    }

    pub async fn edit_absence(&self, id: AbsenceId, patch: AbsencePatch) -> Result<()> {
        self.mutate(MutationCommand::UpdateAbsence { id, patch })
            .await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
