use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use parcelo_agent::ParcelOutcome;
use parcelo_client::EntityKind;
use parcelo_core::errors::{ApplicationError, DomainError};
use parcelo_core::ExtractedRequest;

use crate::bootstrap::AppState;
use crate::health;

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    #[serde(default, alias = "question")]
    pub message: String,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ParcelResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parcel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parcel_info: Option<ExtractedRequest>,
    pub needs_input: bool,
}

impl ParcelResponse {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            parcel_id: None,
            cost: None,
            parcel_info: None,
            needs_input: false,
        }
    }

    /// Successful creations echo the extracted record as `parcel_info` so
    /// callers can show the user what was understood.
    fn from_outcome(outcome: ParcelOutcome) -> Self {
        match outcome {
            ParcelOutcome::Created { message, parcel_id, cost, request } => Self {
                success: true,
                message,
                parcel_id,
                cost: Some(cost),
                parcel_info: Some(request),
                needs_input: false,
            },
            ParcelOutcome::NeedsClarification { question } => Self {
                success: false,
                message: question,
                parcel_id: None,
                cost: None,
                parcel_info: None,
                needs_input: true,
            },
            ParcelOutcome::Failed { message } => Self::failure(message),
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct QuestionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub needs_input: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

impl QuestionResponse {
    fn found(message: String, entity_id: String) -> Self {
        Self {
            success: true,
            message,
            entity_id: Some(entity_id),
            needs_input: false,
            question: None,
        }
    }

    fn retry(message: &str, question: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            entity_id: None,
            needs_input: true,
            question: Some(question.to_string()),
        }
    }

    fn prompt(message: &str, question: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            entity_id: None,
            needs_input: true,
            question: Some(question.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntityListResponse {
    pub count: usize,
    pub names: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/create-parcel", post(create_parcel))
        .route("/api/ask-question", post(ask_question))
        .route("/api/cities", get(cities))
        .route("/api/materials", get(materials))
        .route("/health", get(health::health))
        .with_state(state)
}

pub async fn create_parcel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<MessageRequest>,
) -> (StatusCode, Json<ParcelResponse>) {
    let correlation_id = Uuid::new_v4().to_string();

    if body.message.trim().is_empty() {
        let error = ApplicationError::Domain(DomainError::InvariantViolation(
            "message must not be empty".to_string(),
        ))
        .into_interface(correlation_id.clone());
        warn!(
            event_name = "api.create_parcel.empty_message",
            correlation_id = %correlation_id,
        );
        return (
            StatusCode::BAD_REQUEST,
            Json(ParcelResponse::failure(error.user_message().to_string())),
        );
    }

    info!(
        event_name = "api.create_parcel.received",
        correlation_id = %correlation_id,
        message_len = body.message.len(),
    );

    let outcome = match bearer_credential(&headers) {
        Some((username, password)) => {
            match state.credentialed_orchestrator(username, password) {
                Ok(orchestrator) => orchestrator.process_message(&body.message).await,
                Err(error) => {
                    warn!(
                        event_name = "api.create_parcel.client_error",
                        correlation_id = %correlation_id,
                        error = %error,
                    );
                    let interface = ApplicationError::Configuration(error.to_string())
                        .into_interface(correlation_id);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ParcelResponse::failure(interface.user_message().to_string())),
                    );
                }
            }
        }
        None => state.orchestrator.process_message(&body.message).await,
    };

    match &outcome {
        ParcelOutcome::Created { parcel_id, cost, .. } => {
            info!(
                event_name = "api.create_parcel.created",
                correlation_id = %correlation_id,
                parcel_id = parcel_id.as_deref().unwrap_or("pending"),
                cost = *cost,
            );
        }
        ParcelOutcome::NeedsClarification { .. } => {
            info!(
                event_name = "api.create_parcel.needs_input",
                correlation_id = %correlation_id,
            );
        }
        ParcelOutcome::Failed { message } => {
            warn!(
                event_name = "api.create_parcel.failed",
                correlation_id = %correlation_id,
                detail = %message,
            );
        }
    }

    (StatusCode::OK, Json(ParcelResponse::from_outcome(outcome)))
}

/// Clarification follow-ups are answered with the same lookups the
/// pipeline uses: a city or material answer is resolved against the
/// backend so the caller knows the value will work before resubmitting.
/// A bare answer with no routing keyword is tried as a city name.
pub async fn ask_question(
    State(state): State<AppState>,
    Json(body): Json<MessageRequest>,
) -> (StatusCode, Json<QuestionResponse>) {
    let correlation_id = Uuid::new_v4().to_string();

    if body.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(QuestionResponse::retry(
                "The request could not be processed. Check inputs and try again.",
                "Please provide a question:",
            )),
        );
    }

    let question = body.message.trim().to_lowercase();
    info!(
        event_name = "api.ask_question.received",
        correlation_id = %correlation_id,
        question_len = question.len(),
    );

    let resolver = state.orchestrator.resolver();
    let response = if ["city", "from", "to"].iter().any(|keyword| question.contains(keyword)) {
        match resolver.resolve_city(&question).await {
            Some(city_id) => QuestionResponse::found(format!("Found city: {question}"), city_id),
            None => QuestionResponse::retry(
                "Could not find a matching city. Please be more specific.",
                "Please provide the exact city name:",
            ),
        }
    } else if ["material", "item", "product"].iter().any(|keyword| question.contains(keyword)) {
        match resolver.resolve(EntityKind::Material, &question).await {
            Some(material_id) => {
                QuestionResponse::found(format!("Found material: {question}"), material_id)
            }
            None => QuestionResponse::retry(
                "Could not find a matching material. Please be more specific.",
                "Please provide the exact material type:",
            ),
        }
    } else if question.contains("weight") {
        QuestionResponse::prompt(
            "Please specify the weight",
            "What is the weight of the parcel (e.g., 5kg, 2.5 tonnes)?",
        )
    } else if let Some(city_id) = resolver.resolve_city(&question).await {
        QuestionResponse::found(format!("Found city: {question}"), city_id)
    } else {
        QuestionResponse::prompt(
            "Please provide more details",
            "Can you provide more specific information?",
        )
    };

    (StatusCode::OK, Json(response))
}

pub async fn cities(State(state): State<AppState>) -> Json<EntityListResponse> {
    list_entities(&state, EntityKind::City).await
}

pub async fn materials(State(state): State<AppState>) -> Json<EntityListResponse> {
    list_entities(&state, EntityKind::Material).await
}

async fn list_entities(state: &AppState, kind: EntityKind) -> Json<EntityListResponse> {
    let listing = state.orchestrator.resolver().bulk_listing(kind).await;
    let mut names: Vec<String> = listing.into_keys().collect();
    names.sort();
    Json(EntityListResponse { count: names.len(), names })
}

/// Caller credentials ride in as `Authorization: Bearer <user>:<password>`,
/// with the `Bearer ` prefix optional. Anything else falls through to the
/// configured service credentials.
fn bearer_credential(headers: &HeaderMap) -> Option<(SecretString, SecretString)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    let (username, password) = token.split_once(':')?;
    if username.is_empty() || password.is_empty() {
        return None;
    }
    Some((
        SecretString::from(username.to_string()),
        SecretString::from(password.to_string()),
    ))
}
