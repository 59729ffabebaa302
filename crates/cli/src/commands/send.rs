use std::sync::Arc;

use parcelo_agent::{
    FallbackExtractor, GeminiClient, InformationExtractor, ParcelOrchestrator, ParcelOutcome,
    RequestExtractor,
};
use parcelo_client::{EntityCache, HttpLogisticsClient};
use parcelo_core::config::{AppConfig, LoadOptions};

use super::CommandResult;

/// Runs the full pipeline against the configured backend: extraction,
/// validation, entity resolution, trip setup, pricing, and submission.
pub fn run(message: &str) -> CommandResult {
    if message.trim().is_empty() {
        return CommandResult::failure("send", "validation", "message must not be empty", 2);
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("send", "config", error.to_string(), 2),
    };

    let extractor: Arc<dyn RequestExtractor> = if config.llm.enabled {
        match GeminiClient::new(&config.llm) {
            Ok(gemini) => Arc::new(InformationExtractor::new(gemini)),
            Err(error) => return CommandResult::failure("send", "config", error.to_string(), 2),
        }
    } else {
        Arc::new(FallbackExtractor::new())
    };

    let api = match HttpLogisticsClient::new(&config.api) {
        Ok(api) => Arc::new(api),
        Err(error) => return CommandResult::failure("send", "client", error.to_string(), 1),
    };

    let orchestrator =
        ParcelOrchestrator::new(extractor, api, Arc::new(EntityCache::new()), &config.api);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "send",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            );
        }
    };

    match runtime.block_on(orchestrator.process_message(message)) {
        ParcelOutcome::Created { message, .. } => CommandResult::success("send", message),
        ParcelOutcome::NeedsClarification { question } => {
            CommandResult::failure("send", "clarification_required", question, 2)
        }
        ParcelOutcome::Failed { message } => CommandResult::failure("send", "pipeline", message, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn empty_message_fails_before_loading_config() {
        let result = run("");

        assert_eq!(result.exit_code, 2);
        assert!(result.output.contains("message must not be empty"));
    }
}
