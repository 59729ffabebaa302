//! Parcel agent - natural-language parcel creation
//!
//! This crate turns a free-text shipment request into a submitted parcel:
//!
//! 1. **Information extraction** (`extractor`) - Parse NL → structured
//!    `ExtractedRequest`, model-backed with a deterministic regex fallback
//! 2. **Validation** - Missing mandatory fields become a clarification
//!    question instead of an error
//! 3. **Orchestration** (`orchestrator`) - Resolve entity names to backend
//!    ids, secure a trip, estimate the cost, and submit the parcel
//!
//! # Safety Principle
//!
//! The language model is strictly a translator. It NEVER decides prices,
//! identifiers, or whether a request is complete. Those are deterministic
//! decisions made by the core.

pub mod extractor;
pub mod fallback;
pub mod llm;
pub mod orchestrator;
pub mod prompt;

pub use extractor::{InformationExtractor, RequestExtractor};
pub use fallback::FallbackExtractor;
pub use llm::{GeminiClient, LlmClient};
pub use orchestrator::{ParcelOrchestrator, ParcelOutcome};
