pub mod clarify;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod pricing;
pub mod text;
pub mod units;

pub use clarify::build_clarifying_question;
pub use domain::request::{ExtractedRequest, MissingField};
pub use domain::resolution::ResolvedIdentifiers;
pub use errors::{DomainError, ResolutionError};
pub use flows::{FlowAction, FlowContext, FlowEngine, FlowEvent, FlowState, ParcelFlow};
pub use pricing::estimate_cost;
pub use units::{to_api_unit, to_kilograms, CanonicalUnit};
