use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    ExtractInfo,
    ValidateMandatory,
    ResolveEntities,
    CreateOrFindTrip,
    ComputeCost,
    SubmitParcel,
    Done,
    NeedsClarification,
    Failed,
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::NeedsClarification | Self::Failed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    ExtractionCompleted,
    MandatoryFieldsPresent,
    MandatoryFieldsMissing,
    EntitiesResolved,
    ResolutionFailed,
    TripSecured,
    TripUnavailable,
    CostComputed,
    ParcelAccepted,
    SubmissionFailed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlowContext {
    pub missing_required_fields: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    CheckMandatoryFields,
    PromptForClarification,
    ResolveEntityIds,
    SecureTrip,
    EstimateCost,
    SubmitToRemote,
    ReportConfirmation,
    ReportFailure,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: FlowState,
    pub to: FlowState,
    pub event: FlowEvent,
    pub actions: Vec<FlowAction>,
}
