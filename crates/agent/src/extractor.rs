use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use parcelo_core::ExtractedRequest;

use crate::fallback::FallbackExtractor;
use crate::llm::LlmClient;
use crate::prompt::build_extraction_prompt;

/// Text-to-structured-record capability. The orchestrator is agnostic to
/// whether the active implementation is model-backed or deterministic.
#[async_trait]
pub trait RequestExtractor: Send + Sync {
    async fn extract(&self, message: &str) -> ExtractedRequest;
}

#[async_trait]
impl RequestExtractor for FallbackExtractor {
    async fn extract(&self, message: &str) -> ExtractedRequest {
        self.parse(message)
    }
}

/// Model-first extraction with the deterministic fallback as a safety net.
/// Extraction never fails: an unreachable model or unusable output is
/// logged and recovered locally, never surfaced to the caller.
pub struct InformationExtractor<C> {
    llm: C,
    fallback: FallbackExtractor,
}

/// Wire shape the model is prompted to produce. The model's own
/// `has_missing_info` claim deserializes but is discarded; completeness is
/// always recomputed from the fields.
#[derive(Debug, Default, Deserialize)]
struct WireRequest {
    company: Option<String>,
    from_city: Option<String>,
    to_city: Option<String>,
    weight: Option<f64>,
    weight_unit: Option<String>,
    material: Option<String>,
    price: Option<i64>,
    #[serde(default)]
    #[allow(dead_code)]
    has_missing_info: Option<bool>,
}

impl From<WireRequest> for ExtractedRequest {
    fn from(wire: WireRequest) -> Self {
        Self {
            company: wire.company,
            from_city: wire.from_city,
            to_city: wire.to_city,
            weight: wire.weight,
            weight_unit: wire.weight_unit,
            material: wire.material,
            price: wire.price,
        }
    }
}

impl<C: LlmClient> InformationExtractor<C> {
    pub fn new(llm: C) -> Self {
        Self { llm, fallback: FallbackExtractor::new() }
    }
}

#[async_trait]
impl<C: LlmClient> RequestExtractor for InformationExtractor<C> {
    async fn extract(&self, message: &str) -> ExtractedRequest {
        match self.llm.complete(&build_extraction_prompt(message)).await {
            Ok(raw) => match parse_wire_request(&raw) {
                Some(wire) => {
                    debug!(event_name = "extractor.model_parsed");
                    ExtractedRequest::from(wire).sanitize()
                }
                None => {
                    warn!(
                        event_name = "extractor.model_output_unusable",
                        "model output carried no parseable json object, using the fallback"
                    );
                    self.fallback.parse(message)
                }
            },
            Err(error) => {
                warn!(
                    event_name = "extractor.model_unreachable",
                    error = %error,
                    "model call failed, using the fallback"
                );
                self.fallback.parse(message)
            }
        }
    }
}

/// Parses the first-to-last brace span of the raw model output. Models wrap
/// their answer in prose or code fences often enough that strict whole-body
/// parsing is not worth it.
fn parse_wire_request(raw: &str) -> Option<WireRequest> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}
