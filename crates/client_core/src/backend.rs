use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::{Absence, AbsenceId, Church, ChurchId, Employee, EmployeeId, Service, ServiceId},
    error::ApiError,
    protocol::{
        AbsenceDraft, AbsencePatch, CalendarQuery, CalendarSnapshot, ChurchPatch,
        CreateChurchRequest, CreateEmployeeRequest, EmployeePatch, ServiceDraft, ServicePatch,
    },
};
use tracing::debug;
use url::Url;

/// External data collaborator the core syncs against.
///
/// `fetch_calendar` must be idempotent and side-effect-free; every mutation
/// is followed by a refetch, so implementations never need to return
/// authoritative ordering hints beyond the created/updated record itself.
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    async fn fetch_calendar(&self, query: &CalendarQuery) -> Result<CalendarSnapshot>;
    async fn create_employee(&self, name: &str, position: u32) -> Result<Employee>;
    async fn rename_employee(&self, id: EmployeeId, name: &str) -> Result<Employee>;
    async fn create_church(&self, name: &str) -> Result<Church>;
    async fn rename_church(&self, id: ChurchId, name: &str) -> Result<Church>;
    async fn create_service(&self, draft: &ServiceDraft) -> Result<Service>;
    async fn update_service(&self, id: ServiceId, patch: &ServicePatch) -> Result<Service>;
    async fn create_absence(&self, draft: &AbsenceDraft) -> Result<Absence>;
    async fn update_absence(&self, id: AbsenceId, patch: &AbsencePatch) -> Result<Absence>;
}

/// Placeholder collaborator used before a real backend is wired up.
pub struct MissingCalendarBackend;

#[async_trait]
impl CalendarBackend for MissingCalendarBackend {
    async fn fetch_calendar(&self, _query: &CalendarQuery) -> Result<CalendarSnapshot> {
        Err(anyhow!("calendar backend is unavailable"))
    }

    async fn create_employee(&self, _name: &str, _position: u32) -> Result<Employee> {
        Err(anyhow!("calendar backend is unavailable"))
    }

    async fn rename_employee(&self, _id: EmployeeId, _name: &str) -> Result<Employee> {
        Err(anyhow!("calendar backend is unavailable"))
    }

    async fn create_church(&self, _name: &str) -> Result<Church> {
        Err(anyhow!("calendar backend is unavailable"))
    }

    async fn rename_church(&self, _id: ChurchId, _name: &str) -> Result<Church> {
        Err(anyhow!("calendar backend is unavailable"))
    }

    async fn create_service(&self, _draft: &ServiceDraft) -> Result<Service> {
        Err(anyhow!("calendar backend is unavailable"))
    }

    async fn update_service(&self, _id: ServiceId, _patch: &ServicePatch) -> Result<Service> {
        Err(anyhow!("calendar backend is unavailable"))
    }

    async fn create_absence(&self, _draft: &AbsenceDraft) -> Result<Absence> {
        Err(anyhow!("calendar backend is unavailable"))
    }

    async fn update_absence(&self, _id: AbsenceId, _patch: &AbsencePatch) -> Result<Absence> {
        Err(anyhow!("calendar backend is unavailable"))
    }
}

/// JSON-over-HTTP collaborator speaking the original Kirkespor API routes.
pub struct HttpCalendarBackend {
    http: Client,
    base_url: String,
}

impl HttpCalendarBackend {
    pub fn new(server_url: &str) -> Result<Self> {
        let parsed = Url::parse(server_url)
            .with_context(|| format!("invalid calendar server url: {server_url}"))?;
        Ok(Self {
            http: Client::new(),
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|err| err.message)
            .unwrap_or(body);
        Err(anyhow!("calendar backend returned {status}: {message}"))
    }
}

#[async_trait]
impl CalendarBackend for HttpCalendarBackend {
    async fn fetch_calendar(&self, query: &CalendarQuery) -> Result<CalendarSnapshot> {
        debug!(
            start = %query.start_date,
            end = %query.end_date,
            compact = query.compact_mode,
            "calendar: fetching window"
        );
        let response = self
            .http
            .post(format!("{}/api/calendar", self.base_url))
            .json(query)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn create_employee(&self, name: &str, position: u32) -> Result<Employee> {
        let response = self
            .http
            .post(format!("{}/api/employees", self.base_url))
            .json(&CreateEmployeeRequest {
                name: name.to_string(),
                position,
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn rename_employee(&self, id: EmployeeId, name: &str) -> Result<Employee> {
        let response = self
            .http
            .put(format!("{}/api/employees/{id}", self.base_url))
            .json(&EmployeePatch {
                name: Some(name.to_string()),
                position: None,
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn create_church(&self, name: &str) -> Result<Church> {
        let response = self
            .http
            .post(format!("{}/api/churches", self.base_url))
            .json(&CreateChurchRequest {
                name: name.to_string(),
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn rename_church(&self, id: ChurchId, name: &str) -> Result<Church> {
        let response = self
            .http
            .put(format!("{}/api/churches/{id}", self.base_url))
            .json(&ChurchPatch {
                name: Some(name.to_string()),
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn create_service(&self, draft: &ServiceDraft) -> Result<Service> {
        let response = self
            .http
            .post(format!("{}/api/services", self.base_url))
            .json(draft)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn update_service(&self, id: ServiceId, patch: &ServicePatch) -> Result<Service> {
        let response = self
            .http
            .put(format!("{}/api/services/{id}", self.base_url))
            .json(patch)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn create_absence(&self, draft: &AbsenceDraft) -> Result<Absence> {
        let response = self
            .http
            .post(format!("{}/api/absences", self.base_url))
            .json(draft)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn update_absence(&self, id: AbsenceId, patch: &AbsencePatch) -> Result<Absence> {
        let response = self
            .http
            .put(format!("{}/api/absences/{id}", self.base_url))
            .json(patch)
            .send()
            .await?;
        Self::decode(response).await
    }
}
