use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use parcelo_client::EntityKind;
use serde::Serialize;

use crate::bootstrap::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub extraction: HealthCheck,
    pub cache: HealthCheck,
    pub checked_at: String,
}

/// Liveness probe. Configuration is validated at bootstrap and the remote
/// backend is only reached on demand, so a running process is a ready one;
/// the cache check reports warm-up progress without gating readiness.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let cached_cities = state.cache.len(EntityKind::City);

    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "parcelo-server runtime initialized".to_string(),
        },
        extraction: HealthCheck {
            status: "ready",
            detail: format!("{} extraction active", state.extractor_mode),
        },
        cache: HealthCheck {
            status: "ready",
            detail: if cached_cities == 0 {
                "city cache cold".to_string()
            } else {
                format!("{cached_cities} cities cached")
            },
        },
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
