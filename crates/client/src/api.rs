use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::debug;

use parcelo_core::config::ApiConfig;
use parcelo_core::text::title_case;

use crate::payloads::{scalar_to_string, ParcelDraft, ParcelReceipt, RouteIds, TripDraft};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    City,
    Material,
    Company,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Material => "material",
            Self::Company => "company",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response carried no usable identifier")]
    MissingIdentifier,
    #[error("could not decode response body: {0}")]
    Decode(String),
}

/// Seam over the remote logistics backend. The orchestrator and resolver
/// only talk to this trait, so tests substitute in-memory fakes.
#[async_trait]
pub trait LogisticsApi: Send + Sync {
    /// Filtered lookup of one entity catalog by name.
    async fn query_entities(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> Result<Vec<EntityRecord>, ApiError>;

    /// Full listing of one entity catalog.
    async fn list_entities(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, ApiError>;

    /// Creates a trip for the route and returns its identifier.
    async fn create_trip(&self, draft: &TripDraft) -> Result<String, ApiError>;

    /// Finds an existing trip matching the route, if any.
    async fn find_trip(&self, route: &RouteIds) -> Result<Option<String>, ApiError>;

    async fn submit_parcel(&self, draft: &ParcelDraft) -> Result<ParcelReceipt, ApiError>;
}

/// Enforces a minimum wall-clock duration on a remote call, measured from
/// before the call starts. Fast responses are padded with a sleep so the
/// backend's rate expectations hold; slow responses are untouched.
pub async fn enforce_call_floor<T, F>(min_call: Duration, operation: F) -> T
where
    F: Future<Output = T>,
{
    if min_call.is_zero() {
        return operation.await;
    }

    let started = Instant::now();
    let result = operation.await;
    let elapsed = started.elapsed();
    if elapsed < min_call {
        sleep(min_call - elapsed).await;
    }
    result
}

pub struct HttpLogisticsClient {
    http: reqwest::Client,
    cities_url: String,
    materials_url: String,
    companies_url: String,
    trips_url: String,
    parcels_url: String,
    username: SecretString,
    password: SecretString,
    min_call: Duration,
}

impl HttpLogisticsClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            cities_url: config.cities_url.clone(),
            materials_url: config.materials_url.clone(),
            companies_url: config.companies_url.clone(),
            trips_url: config.trips_url.clone(),
            parcels_url: config.parcels_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            min_call: Duration::from_millis(config.min_call_millis),
        })
    }

    /// Replaces the outbound credentials, e.g. with a per-request pair the
    /// inbound surface received from its caller.
    pub fn with_credentials(mut self, username: SecretString, password: SecretString) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    fn entity_url(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::City => &self.cities_url,
            EntityKind::Material => &self.materials_url,
            EntityKind::Company => &self.companies_url,
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(self.username.expose_secret(), Some(self.password.expose_secret()))
    }

    async fn read_success_body(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status: status.as_u16(), body });
        }
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl LogisticsApi for HttpLogisticsClient {
    async fn query_entities(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> Result<Vec<EntityRecord>, ApiError> {
        let filter = exact_match_filter(kind, name);
        debug!(event_name = "client.entity_query", kind = kind.as_str(), %filter);

        enforce_call_floor(self.min_call, async {
            let response = self
                .authorized(self.http.get(self.entity_url(kind)))
                .query(&[("where", filter.to_string())])
                .send()
                .await?;
            let body = Self::read_success_body(response).await?;
            Ok(entity_records(body)?)
        })
        .await
    }

    async fn list_entities(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, ApiError> {
        debug!(event_name = "client.entity_listing", kind = kind.as_str());

        enforce_call_floor(self.min_call, async {
            let response = self.authorized(self.http.get(self.entity_url(kind))).send().await?;
            let body = Self::read_success_body(response).await?;
            Ok(entity_records(body)?)
        })
        .await
    }

    async fn create_trip(&self, draft: &TripDraft) -> Result<String, ApiError> {
        enforce_call_floor(self.min_call, async {
            let response =
                self.authorized(self.http.post(&self.trips_url)).json(draft).send().await?;
            let body = Self::read_success_body(response).await?;
            identifier_of(&body).ok_or(ApiError::MissingIdentifier)
        })
        .await
    }

    async fn find_trip(&self, route: &RouteIds) -> Result<Option<String>, ApiError> {
        let filter = json!({
            "source": route.from_city_id,
            "destination": route.to_city_id,
        });

        enforce_call_floor(self.min_call, async {
            let response = self
                .authorized(self.http.get(&self.trips_url))
                .query(&[("where", filter.to_string())])
                .send()
                .await?;
            let body = Self::read_success_body(response).await?;
            let items = items_of(body)?;
            Ok(items.iter().find_map(identifier_of))
        })
        .await
    }

    async fn submit_parcel(&self, draft: &ParcelDraft) -> Result<ParcelReceipt, ApiError> {
        enforce_call_floor(self.min_call, async {
            let response =
                self.authorized(self.http.post(&self.parcels_url)).json(draft).send().await?;

            let status = response.status();
            if status != StatusCode::OK && status != StatusCode::CREATED {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::Status { status: status.as_u16(), body });
            }

            let body = response.json::<Value>().await?;
            Ok(ParcelReceipt::from_value(&body))
        })
        .await
    }
}

/// The catalog stores city names in Title Case and matches them exactly;
/// materials and companies take a case-insensitive prefix filter.
fn exact_match_filter(kind: EntityKind, name: &str) -> Value {
    match kind {
        EntityKind::City => json!({ "name": title_case(name) }),
        EntityKind::Material | EntityKind::Company => json!({
            "$or": [{ "name": { "$regex": format!("^{}", name.trim()), "$options": "-i" } }]
        }),
    }
}

fn items_of(body: Value) -> Result<Vec<Value>, ApiError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("_items") {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(ApiError::Decode("`_items` is not a list".to_string())),
            None => Err(ApiError::Decode(
                "response carried neither a list nor `_items`".to_string(),
            )),
        },
        other => Err(ApiError::Decode(format!("unexpected response shape: {other}"))),
    }
}

fn entity_records(body: Value) -> Result<Vec<EntityRecord>, ApiError> {
    let items = items_of(body)?;
    // Items without an id or name cannot be resolved against and are skipped.
    Ok(items
        .iter()
        .filter_map(|item| {
            let id = identifier_of(item)?;
            let name = item.get("name")?.as_str()?.trim().to_string();
            (!name.is_empty()).then_some(EntityRecord { id, name })
        })
        .collect())
}

fn identifier_of(item: &Value) -> Option<String> {
    ["_id", "id", "trip_id"].iter().find_map(|key| item.get(key)).and_then(scalar_to_string)
}
