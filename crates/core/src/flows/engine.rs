use thiserror::Error;

use crate::flows::states::{FlowAction, FlowContext, FlowEvent, FlowState, TransitionOutcome};

pub trait FlowDefinition {
    fn initial_state(&self) -> FlowState;
    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// The single-pass parcel creation flow: extract, validate, resolve,
/// secure a trip, price, submit. Clarification and failure are absorbing.
#[derive(Clone, Debug, Default)]
pub struct ParcelFlow;

impl FlowDefinition for ParcelFlow {
    fn initial_state(&self) -> FlowState {
        FlowState::ExtractInfo
    }

    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_parcel(current, event, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> FlowState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event, context)
    }
}

impl Default for FlowEngine<ParcelFlow> {
    fn default() -> Self {
        Self::new(ParcelFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("mandatory fields missing before transition from {state:?}: {missing_fields:?}")]
    MissingRequiredFields { state: FlowState, missing_fields: Vec<String> },
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: FlowState, event: FlowEvent },
}

fn transition_parcel(
    current: &FlowState,
    event: &FlowEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowAction::{
        CheckMandatoryFields, EstimateCost, PromptForClarification, ReportConfirmation,
        ReportFailure, ResolveEntityIds, SecureTrip, SubmitToRemote,
    };
    use FlowEvent::{
        CostComputed, EntitiesResolved, ExtractionCompleted, MandatoryFieldsMissing,
        MandatoryFieldsPresent, ParcelAccepted, ResolutionFailed, SubmissionFailed, TripSecured,
        TripUnavailable,
    };
    use FlowState::{
        ComputeCost, CreateOrFindTrip, Done, ExtractInfo, Failed, NeedsClarification,
        ResolveEntities, SubmitParcel, ValidateMandatory,
    };

    let (to, actions) = match (current, event) {
        (ExtractInfo, ExtractionCompleted) => (ValidateMandatory, vec![CheckMandatoryFields]),
        (ValidateMandatory, MandatoryFieldsPresent) => {
            if !context.missing_required_fields.is_empty() {
                return Err(FlowTransitionError::MissingRequiredFields {
                    state: current.clone(),
                    missing_fields: context.missing_required_fields.clone(),
                });
            }
            (ResolveEntities, vec![ResolveEntityIds])
        }
        (ValidateMandatory, MandatoryFieldsMissing) => {
            (NeedsClarification, vec![PromptForClarification])
        }
        (ResolveEntities, EntitiesResolved) => (CreateOrFindTrip, vec![SecureTrip]),
        (ResolveEntities, ResolutionFailed) => (Failed, vec![ReportFailure]),
        (CreateOrFindTrip, TripSecured) => (ComputeCost, vec![EstimateCost]),
        (CreateOrFindTrip, TripUnavailable) => (Failed, vec![ReportFailure]),
        (ComputeCost, CostComputed) => (SubmitParcel, vec![SubmitToRemote]),
        (SubmitParcel, ParcelAccepted) => (Done, vec![ReportConfirmation]),
        (SubmitParcel, SubmissionFailed) => (Failed, vec![ReportFailure]),
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                state: current.clone(),
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: current.clone(), to, event: event.clone(), actions })
}
