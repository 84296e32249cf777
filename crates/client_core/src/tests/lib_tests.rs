use super::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

use anyhow::anyhow;
use async_trait::async_trait;
use axum::{http::StatusCode, routing::post, Json, Router};
use chrono::NaiveTime;
use shared::domain::{
    Absence, AbsenceId, AbsenceKind, Church, ChurchId, Employee, Service, ServiceKind,
};
use shared::error::{ApiError, ErrorCode};
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn employee(name: &str, position: u32) -> Employee {
    Employee {
        id: EmployeeId::random(),
        name: name.to_string(),
        position,
    }
}

fn service_on(day: NaiveDate, employee_id: Option<EmployeeId>, church_id: ChurchId) -> Service {
    Service {
        id: ServiceId::random(),
        kind: ServiceKind::Gudstjeneste,
        date: day,
        time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        employee_id,
        church_id,
        notes: None,
    }
}

fn week_snapshot(start: NaiveDate, employees: Vec<Employee>) -> CalendarSnapshot {
    CalendarSnapshot {
        services: Vec::new(),
        absences: Vec::new(),
        employees,
        churches: Vec::new(),
        date_range: (0..7).map(|i| start + Duration::days(i)).collect(),
    }
}

#[derive(Default)]
struct TestCalendarBackend {
    /// Snapshots keyed by the query's start date.
    snapshots: HashMap<NaiveDate, CalendarSnapshot>,
    /// Artificial latency per start date, to simulate out-of-order arrival.
    delays: HashMap<NaiveDate, StdDuration>,
    fail_fetch: bool,
    fail_mutations: bool,
    fetches: AtomicUsize,
    created_employees: Mutex<Vec<(String, u32)>>,
}

impl TestCalendarBackend {
    fn with_snapshot(start: NaiveDate, snapshot: CalendarSnapshot) -> Self {
        let mut backend = Self::default();
        backend.snapshots.insert(start, snapshot);
        backend
    }

    fn failing_fetch() -> Self {
        Self {
            fail_fetch: true,
            ..Self::default()
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarBackend for TestCalendarBackend {
    async fn fetch_calendar(&self, query: &CalendarQuery) -> Result<CalendarSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch {
            return Err(anyhow!("connection refused"));
        }
        if let Some(delay) = self.delays.get(&query.start_date) {
            sleep(*delay).await;
        }
        self.snapshots
            .get(&query.start_date)
            .cloned()
            .ok_or_else(|| anyhow!("no snapshot staged for {}", query.start_date))
    }

    async fn create_employee(&self, name: &str, position: u32) -> Result<Employee> {
        if self.fail_mutations {
            return Err(anyhow!("employee creation rejected"));
        }
        self.created_employees
            .lock()
            .await
            .push((name.to_string(), position));
        Ok(employee(name, position))
    }

    async fn rename_employee(&self, id: EmployeeId, name: &str) -> Result<Employee> {
        if self.fail_mutations {
            return Err(anyhow!("employee rename rejected"));
        }
        Ok(Employee {
            id,
            name: name.to_string(),
            position: 0,
        })
    }

    async fn create_church(&self, _name: &str) -> Result<Church> {
        Err(anyhow!("unsupported in test backend"))
    }

    async fn rename_church(&self, _id: ChurchId, _name: &str) -> Result<Church> {
        Err(anyhow!("unsupported in test backend"))
    }

    async fn create_service(&self, _draft: &ServiceDraft) -> Result<Service> {
        Err(anyhow!("unsupported in test backend"))
    }

    async fn update_service(&self, _id: ServiceId, _patch: &ServicePatch) -> Result<Service> {
        Err(anyhow!("unsupported in test backend"))
    }

    async fn create_absence(&self, draft: &AbsenceDraft) -> Result<Absence> {
        if self.fail_mutations {
            return Err(anyhow!("absence creation rejected"));
        }
        Ok(Absence {
            id: AbsenceId::random(),
            kind: draft.kind,
            employee_id: draft.employee_id,
            start_date: draft.start_date,
            end_date: draft.end_date,
            notes: draft.notes.clone(),
        })
    }

    async fn update_absence(&self, _id: AbsenceId, _patch: &AbsencePatch) -> Result<Absence> {
        Err(anyhow!("unsupported in test backend"))
    }
}

#[tokio::test]
async fn refresh_installs_model_and_projects_grid() {
    let monday = date(2024, 1, 8);
    let anne = employee("Anne", 0);
    let church = Church {
        id: ChurchId::random(),
        name: "Domkirken".to_string(),
    };
    let snapshot = CalendarSnapshot {
        services: vec![service_on(monday, Some(anne.id), church.id)],
        absences: Vec::new(),
        employees: vec![anne],
        churches: vec![church],
        // Deliberately narrower than the 7-day window: the collaborator's
        // date_range is authoritative.
        date_range: vec![monday, monday + Duration::days(1)],
    };
    let backend = Arc::new(TestCalendarBackend::with_snapshot(monday, snapshot));
    let client = CalendarClient::new(backend, date(2024, 1, 10), false);

    assert_eq!(client.phase().await, SyncPhase::Idle);
    assert!(client.grid().await.is_none());

    client.refresh().await.unwrap();

    assert_eq!(client.phase().await, SyncPhase::Ready);
    let grid = client.grid().await.unwrap();
    assert_eq!(grid.rows.len(), 2);
    assert_eq!(grid.columns.len(), 3);
    assert_eq!(grid.rows[0].cells[1].services.len(), 1);
    assert_eq!(grid.rows[0].cells[1].services[0].church_name, "Domkirken");
    assert!(grid.rows[0].cells[0].is_empty());
}

#[tokio::test]
async fn failed_refresh_surfaces_error_and_blocks_grid() {
    let backend = Arc::new(TestCalendarBackend::failing_fetch());
    let client = CalendarClient::new(backend, date(2024, 1, 10), false);
    let mut events = client.subscribe_events();

    let err = client.refresh().await.unwrap_err();
    assert!(err.to_string().contains("calendar fetch failed"));

    match client.phase().await {
        SyncPhase::Failed(message) => assert!(message.contains("connection refused")),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(client.grid().await.is_none());

    let event = timeout(StdDuration::from_secs(1), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, CalendarEvent::RefreshFailed(_)));
}

#[tokio::test]
async fn stale_fetch_response_is_discarded() {
    let w1_start = date(2024, 1, 8);
    let w2_start = date(2024, 1, 15);

    let mut backend = TestCalendarBackend::with_snapshot(
        w1_start,
        week_snapshot(w1_start, vec![employee("Stale", 0)]),
    );
    backend
        .snapshots
        .insert(w2_start, week_snapshot(w2_start, vec![employee("Fresh", 0)]));
    backend.delays.insert(w1_start, StdDuration::from_millis(200));
    let backend = Arc::new(backend);

    let client = CalendarClient::new(Arc::clone(&backend) as Arc<dyn CalendarBackend>, w1_start, false);

    // R1 for the old window is slow; R2 supersedes it and returns first.
    let slow = {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            let _ = client.refresh().await;
        })
    };
    sleep(StdDuration::from_millis(30)).await;
    client.set_anchor(date(2024, 1, 17)).await.unwrap();
    slow.await.unwrap();

    assert_eq!(client.window().await.start, w2_start);
    assert_eq!(client.phase().await, SyncPhase::Ready);
    let grid = client.grid().await.unwrap();
    assert_eq!(grid.rows[0].date, w2_start);
    assert!(matches!(
        &grid.columns[1],
        grid::GridColumn::Employee { name, .. } if name == "Fresh"
    ));
}

#[tokio::test]
async fn failed_mutation_still_reconciles_with_a_refresh() {
    let monday = date(2024, 1, 8);
    let mut backend =
        TestCalendarBackend::with_snapshot(monday, week_snapshot(monday, Vec::new()));
    backend.fail_mutations = true;
    let backend = Arc::new(backend);

    let client = CalendarClient::new(
        Arc::clone(&backend) as Arc<dyn CalendarBackend>,
        monday,
        false,
    );
    client.refresh().await.unwrap();
    let mut events = client.subscribe_events();

    client
        .mutate(MutationCommand::CreateEmployee {
            name: "Ola".to_string(),
            position: 0,
        })
        .await
        .unwrap();

    let event = timeout(StdDuration::from_secs(1), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, CalendarEvent::MutationFailed(_)));
    assert_eq!(client.phase().await, SyncPhase::Ready);
    assert_eq!(backend.fetch_count(), 2);
}

#[tokio::test]
async fn blank_employee_name_is_discarded_without_a_roundtrip() {
    let backend = Arc::new(TestCalendarBackend::default());
    let client = CalendarClient::new(
        Arc::clone(&backend) as Arc<dyn CalendarBackend>,
        date(2024, 1, 8),
        false,
    );

    assert!(!client.append_employee("   ").await.unwrap());
    assert!(!client
        .rename_employee(EmployeeId::random(), "")
        .await
        .unwrap());

    assert_eq!(backend.fetch_count(), 0);
    assert!(backend.created_employees.lock().await.is_empty());
}

#[tokio::test]
async fn append_employee_trims_and_positions_after_roster() {
    let monday = date(2024, 1, 8);
    let backend = Arc::new(TestCalendarBackend::with_snapshot(
        monday,
        week_snapshot(monday, vec![employee("Anne", 0), employee("Bjørn", 1)]),
    ));
    let client = CalendarClient::new(
        Arc::clone(&backend) as Arc<dyn CalendarBackend>,
        monday,
        false,
    );
    client.refresh().await.unwrap();

    assert!(client.append_employee("Ola ").await.unwrap());

    assert_eq!(
        backend.created_employees.lock().await.as_slice(),
        &[("Ola".to_string(), 2)]
    );
    // Initial fetch plus the post-mutation reconcile.
    assert_eq!(backend.fetch_count(), 2);
}

#[tokio::test]
async fn absence_draft_with_inverted_range_is_discarded() {
    let backend = Arc::new(TestCalendarBackend::default());
    let client = CalendarClient::new(
        Arc::clone(&backend) as Arc<dyn CalendarBackend>,
        date(2024, 1, 8),
        false,
    );

    let placed = client
        .place_absence(AbsenceDraft {
            kind: AbsenceKind::Ferie,
            employee_id: EmployeeId::random(),
            start_date: date(2024, 1, 10),
            end_date: date(2024, 1, 9),
            notes: None,
        })
        .await
        .unwrap();

    assert!(!placed);
    assert_eq!(backend.fetch_count(), 0);
}

#[tokio::test]
async fn compact_mode_toggle_refetches_once() {
    let monday = date(2024, 1, 8);
    let backend = Arc::new(TestCalendarBackend::with_snapshot(
        monday,
        week_snapshot(monday, Vec::new()),
    ));
    let client = CalendarClient::new(
        Arc::clone(&backend) as Arc<dyn CalendarBackend>,
        monday,
        false,
    );
    client.refresh().await.unwrap();

    client.set_compact_mode(true).await.unwrap();
    assert!(client.compact_mode().await);
    // Toggling to the value already in effect is a no-op.
    client.set_compact_mode(true).await.unwrap();
    assert_eq!(backend.fetch_count(), 2);
}

async fn spawn_fake_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn http_backend_round_trips_calendar_fetch() {
    let monday = date(2024, 1, 8);
    let snapshot = week_snapshot(monday, vec![employee("Anne", 0)]);
    let served = snapshot.clone();
    let app = Router::new().route(
        "/api/calendar",
        post(move |Json(query): Json<CalendarQuery>| {
            let snapshot = served.clone();
            async move {
                assert_eq!(query.start_date, date(2024, 1, 8));
                assert!(query.compact_mode);
                Json(snapshot)
            }
        }),
    );
    let url = spawn_fake_server(app).await;

    let backend = HttpCalendarBackend::new(&url).unwrap();
    let fetched = backend
        .fetch_calendar(&CalendarQuery {
            start_date: monday,
            end_date: monday + Duration::days(6),
            compact_mode: true,
        })
        .await
        .unwrap();

    assert_eq!(fetched, snapshot);
}

#[tokio::test]
async fn http_backend_surfaces_api_error_body() {
    let app = Router::new().route(
        "/api/employees",
        post(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::new(ErrorCode::NotFound, "employee not found")),
            )
        }),
    );
    let url = spawn_fake_server(app).await;

    let backend = HttpCalendarBackend::new(&url).unwrap();
    let err = backend.create_employee("Ola", 0).await.unwrap_err();
    assert!(err.to_string().contains("employee not found"));
    assert!(err.to_string().contains("404"));
}
