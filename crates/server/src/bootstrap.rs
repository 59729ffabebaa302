use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;
use tracing::{info, warn};

use parcelo_agent::{
    FallbackExtractor, GeminiClient, InformationExtractor, ParcelOrchestrator, RequestExtractor,
};
use parcelo_client::{ApiError, EntityCache, EntityKind, HttpLogisticsClient};
use parcelo_core::config::{AppConfig, ConfigError};

/// Shared request-handling state. The orchestrator inside carries the
/// service credentials from configuration; callers that authenticate with
/// their own credentials get a per-request orchestrator instead, sharing
/// the same entity cache.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cache: Arc<EntityCache>,
    pub extractor: Arc<dyn RequestExtractor>,
    pub orchestrator: Arc<ParcelOrchestrator<HttpLogisticsClient>>,
    pub extractor_mode: &'static str,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("remote api client failed to initialize: {0}")]
    HttpClient(#[source] ApiError),
    #[error("model client failed to initialize: {0}")]
    Model(#[source] anyhow::Error),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<AppState, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let (extractor, extractor_mode): (Arc<dyn RequestExtractor>, &'static str) =
        if config.llm.enabled {
            let gemini = GeminiClient::new(&config.llm).map_err(BootstrapError::Model)?;
            (Arc::new(InformationExtractor::new(gemini)), "model")
        } else {
            (Arc::new(FallbackExtractor::new()), "fallback")
        };
    info!(
        event_name = "system.bootstrap.extractor_selected",
        correlation_id = "bootstrap",
        mode = extractor_mode,
        "extraction backend selected"
    );

    let api = Arc::new(HttpLogisticsClient::new(&config.api).map_err(BootstrapError::HttpClient)?);
    let cache = Arc::new(EntityCache::new());
    let orchestrator = Arc::new(ParcelOrchestrator::new(
        Arc::clone(&extractor),
        api,
        Arc::clone(&cache),
        &config.api,
    ));

    Ok(AppState { config: Arc::new(config), cache, extractor, orchestrator, extractor_mode })
}

impl AppState {
    /// Builds an orchestrator bound to caller-supplied credentials. The
    /// shared cache is reused so resolution work done under one credential
    /// benefits every other.
    pub fn credentialed_orchestrator(
        &self,
        username: SecretString,
        password: SecretString,
    ) -> Result<ParcelOrchestrator<HttpLogisticsClient>, ApiError> {
        let api =
            HttpLogisticsClient::new(&self.config.api)?.with_credentials(username, password);
        Ok(ParcelOrchestrator::new(
            Arc::clone(&self.extractor),
            Arc::new(api),
            Arc::clone(&self.cache),
            &self.config.api,
        ))
    }

    /// Warms the resolver caches in the background. Failures are tolerated;
    /// the first user request fills the cache on demand instead.
    pub fn spawn_cache_warmup(&self) {
        let resolver = self.orchestrator.resolver().clone();
        tokio::spawn(async move {
            for kind in [EntityKind::City, EntityKind::Material, EntityKind::Company] {
                let listing = resolver.bulk_listing(kind).await;
                if listing.is_empty() {
                    warn!(
                        event_name = "system.bootstrap.warmup_empty",
                        correlation_id = "bootstrap",
                        kind = kind.as_str(),
                        "warm-up listing came back empty"
                    );
                } else {
                    info!(
                        event_name = "system.bootstrap.warmup_loaded",
                        correlation_id = "bootstrap",
                        kind = kind.as_str(),
                        entries = listing.len(),
                        "warm-up listing cached"
                    );
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use parcelo_core::config::AppConfig;

    use crate::bootstrap::bootstrap_with_config;

    #[test]
    fn defaults_select_the_fallback_extractor() {
        let state = bootstrap_with_config(AppConfig::default()).expect("bootstrap");

        assert_eq!(state.extractor_mode, "fallback");
    }

    #[test]
    fn enabled_model_without_a_key_fails_fast() {
        let mut config = AppConfig::default();
        config.llm.enabled = true;

        let error = bootstrap_with_config(config).err().expect("bootstrap should fail");

        assert!(error.to_string().contains("api_key"));
    }
}
