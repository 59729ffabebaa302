use std::sync::Arc;

use tracing::{info, warn};

use parcelo_client::{
    EntityCache, EntityResolver, LogisticsApi, ParcelDraft, ParcelReceipt, PostalAddress,
    Receiver, RouteIds, Sender, TripDraft,
};
use parcelo_core::config::ApiConfig;
use parcelo_core::flows::{FlowContext, FlowEngine, FlowEvent, FlowState, ParcelFlow};
use parcelo_core::text::title_case;
use parcelo_core::{
    build_clarifying_question, estimate_cost, to_api_unit, to_kilograms, DomainError,
    ExtractedRequest, ResolutionError, ResolvedIdentifiers,
};

use crate::extractor::RequestExtractor;

/// Terminal result of one orchestration. Fatal errors share the shape of
/// success (a human-readable message) instead of propagating as faults.
#[derive(Clone, Debug, PartialEq)]
pub enum ParcelOutcome {
    Created { message: String, parcel_id: Option<String>, cost: i64, request: ExtractedRequest },
    NeedsClarification { question: String },
    Failed { message: String },
}

impl ParcelOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Created { .. })
    }

    pub fn user_message(&self) -> &str {
        match self {
            Self::Created { message, .. } => message,
            Self::NeedsClarification { question } => question,
            Self::Failed { message } => message,
        }
    }
}

/// Drives one free-text message through extraction, validation, entity
/// resolution, trip setup, pricing, and submission. Each step advances the
/// flow engine so illegal orderings are structurally impossible.
pub struct ParcelOrchestrator<A> {
    extractor: Arc<dyn RequestExtractor>,
    api: Arc<A>,
    resolver: EntityResolver<A>,
    engine: FlowEngine<ParcelFlow>,
    created_by: String,
    created_by_company: String,
    default_company_id: String,
    fallback_trip_id: Option<String>,
}

impl<A: LogisticsApi> ParcelOrchestrator<A> {
    pub fn new(
        extractor: Arc<dyn RequestExtractor>,
        api: Arc<A>,
        cache: Arc<EntityCache>,
        config: &ApiConfig,
    ) -> Self {
        let resolver =
            EntityResolver::new(Arc::clone(&api), cache, config.default_material_id.clone());
        Self {
            extractor,
            api,
            resolver,
            engine: FlowEngine::default(),
            created_by: config.created_by.clone(),
            created_by_company: config.created_by_company.clone(),
            default_company_id: config.default_company_id.clone(),
            fallback_trip_id: config.fallback_trip_id.clone(),
        }
    }

    pub fn resolver(&self) -> &EntityResolver<A> {
        &self.resolver
    }

    pub async fn process_message(&self, message: &str) -> ParcelOutcome {
        match self.run_pipeline(message).await {
            Ok(outcome) => outcome,
            Err(error) => ParcelOutcome::Failed { message: error.to_string() },
        }
    }

    async fn run_pipeline(&self, message: &str) -> Result<ParcelOutcome, DomainError> {
        let mut state = self.engine.initial_state();

        let request = self.extractor.extract(message).await;
        let missing = request.missing_fields();
        let context = FlowContext {
            missing_required_fields: missing
                .iter()
                .map(|field| field.label().to_string())
                .collect(),
        };
        state = self.advance(state, FlowEvent::ExtractionCompleted, &context)?;

        if !missing.is_empty() {
            self.advance(state, FlowEvent::MandatoryFieldsMissing, &context)?;
            let question = build_clarifying_question(&request)
                .unwrap_or_else(|| "I need more details to create your parcel.".to_string());
            info!(
                event_name = "orchestrator.needs_clarification",
                missing = ?missing,
            );
            return Ok(ParcelOutcome::NeedsClarification { question });
        }
        state = self.advance(state, FlowEvent::MandatoryFieldsPresent, &context)?;

        let resolved = match self.resolve_entities(&request).await {
            Ok(resolved) => resolved,
            Err(error) => {
                self.advance(state, FlowEvent::ResolutionFailed, &context)?;
                return Ok(ParcelOutcome::Failed { message: error.to_string() });
            }
        };
        state = self.advance(state, FlowEvent::EntitiesResolved, &context)?;
        info!(
            event_name = "orchestrator.entities_resolved",
            from_city_id = %resolved.from_city_id,
            to_city_id = %resolved.to_city_id,
        );

        let route = RouteIds {
            from_city_id: resolved.from_city_id.clone(),
            to_city_id: resolved.to_city_id.clone(),
        };
        let trip_id = match self.secure_trip(&route).await {
            Ok(trip_id) => trip_id,
            Err(message) => {
                self.advance(state, FlowEvent::TripUnavailable, &context)?;
                return Ok(ParcelOutcome::Failed { message });
            }
        };
        state = self.advance(state, FlowEvent::TripSecured, &context)?;

        let Some(weight) = request.weight else {
            return Err(DomainError::InvariantViolation(
                "weight absent after validation".to_string(),
            ));
        };
        let weight_kg = to_kilograms(weight, request.weight_unit.as_deref());
        let cost = estimate_cost(&request, weight_kg);
        state = self.advance(state, FlowEvent::CostComputed, &context)?;
        info!(event_name = "orchestrator.cost_computed", weight_kg, cost);

        let draft = self.build_draft(&request, &resolved, &trip_id, weight, cost);
        match self.api.submit_parcel(&draft).await {
            Ok(receipt) => {
                self.advance(state, FlowEvent::ParcelAccepted, &context)?;
                info!(
                    event_name = "orchestrator.parcel_created",
                    parcel_id = receipt.id.as_deref().unwrap_or("unknown"),
                    cost,
                );
                let message = confirmation_message(&request, &receipt, &trip_id, cost);
                Ok(ParcelOutcome::Created {
                    message,
                    parcel_id: receipt.id,
                    cost: receipt.cost.unwrap_or(cost),
                    request,
                })
            }
            Err(error) => {
                self.advance(state, FlowEvent::SubmissionFailed, &context)?;
                Ok(ParcelOutcome::Failed {
                    message: format!("parcel submission failed: {error}"),
                })
            }
        }
    }

    fn advance(
        &self,
        state: FlowState,
        event: FlowEvent,
        context: &FlowContext,
    ) -> Result<FlowState, DomainError> {
        Ok(self.engine.apply(&state, &event, context)?.to)
    }

    async fn resolve_entities(
        &self,
        request: &ExtractedRequest,
    ) -> Result<ResolvedIdentifiers, ResolutionError> {
        let from_city = request.from_city.as_deref().unwrap_or_default();
        let to_city = request.to_city.as_deref().unwrap_or_default();
        let material = request.material.as_deref().unwrap_or_default();

        let from_resolved = self.resolver.resolve_city(from_city).await;
        let to_resolved = self.resolver.resolve_city(to_city).await;

        let (from_city_id, to_city_id) = match (from_resolved, to_resolved) {
            (Some(from_city_id), Some(to_city_id)) => (from_city_id, to_city_id),
            (from_resolved, to_resolved) => {
                let mut unresolved = Vec::new();
                if from_resolved.is_none() {
                    unresolved.push(from_city.to_string());
                }
                if to_resolved.is_none() {
                    unresolved.push(to_city.to_string());
                }
                return Err(ResolutionError::UnresolvedCities(unresolved));
            }
        };

        let material_id = self.resolver.resolve_material(material).await;

        let company = request.company_or_default();
        let company_id = if company.eq_ignore_ascii_case("unknown") {
            self.default_company_id.clone()
        } else {
            match self.resolver.resolve_company(company).await {
                Some(company_id) => company_id,
                None => self.default_company_id.clone(),
            }
        };

        Ok(ResolvedIdentifiers { from_city_id, to_city_id, material_id, company_id })
    }

    /// Create first; a trip is remote-owned state that must exist before a
    /// parcel can reference its route. On creation failure, look for an
    /// existing trip on the same route, then the statically configured trip
    /// as a degraded last resort. Single attempt each, no retries.
    async fn secure_trip(&self, route: &RouteIds) -> Result<String, String> {
        let draft = TripDraft::new(route, &self.created_by, &self.created_by_company);

        let create_error = match self.api.create_trip(&draft).await {
            Ok(trip_id) => {
                info!(event_name = "orchestrator.trip_created", trip_id = %trip_id);
                return Ok(trip_id);
            }
            Err(error) => error,
        };
        warn!(
            event_name = "orchestrator.trip_create_failed",
            error = %create_error,
            "trip creation failed, searching for an existing trip"
        );

        let find_detail = match self.api.find_trip(route).await {
            Ok(Some(trip_id)) => {
                info!(event_name = "orchestrator.trip_reused", trip_id = %trip_id);
                return Ok(trip_id);
            }
            Ok(None) => "no existing trip matched the route".to_string(),
            Err(find_error) => format!("trip lookup failed: {find_error}"),
        };

        if let Some(fallback) = &self.fallback_trip_id {
            warn!(
                event_name = "orchestrator.trip_degraded",
                trip_id = %fallback,
                "using the statically configured trip id"
            );
            return Ok(fallback.clone());
        }

        Err(format!("trip creation failed: {create_error}; {find_detail}"))
    }

    fn build_draft(
        &self,
        request: &ExtractedRequest,
        resolved: &ResolvedIdentifiers,
        trip_id: &str,
        weight: f64,
        cost: i64,
    ) -> ParcelDraft {
        let (quantity, unit) = to_api_unit(weight, request.weight_unit.as_deref());

        ParcelDraft {
            material_type: resolved.material_id.clone(),
            quantity,
            quantity_unit: unit.as_api_str().to_string(),
            description: format!(
                "Parcel for {} - {}",
                request.company_or_default(),
                request.material.as_deref().unwrap_or("general goods"),
            ),
            cost,
            part_load: false,
            pickup_postal_address: PostalAddress::for_city(&resolved.from_city_id),
            unload_postal_address: PostalAddress::for_city(&resolved.to_city_id),
            sender: Sender {
                sender_company: Some(resolved.company_id.clone()),
                ..Sender::default()
            },
            receiver: Receiver::default(),
            created_by: self.created_by.clone(),
            trip_id: trip_id.to_string(),
            verification: "Verified".to_string(),
            created_by_company: self.created_by_company.clone(),
        }
    }
}

fn confirmation_message(
    request: &ExtractedRequest,
    receipt: &ParcelReceipt,
    trip_id: &str,
    cost: i64,
) -> String {
    let from = title_case(request.from_city.as_deref().unwrap_or_default());
    let to = title_case(request.to_city.as_deref().unwrap_or_default());
    let unit = request.weight_unit.as_deref().unwrap_or("kg");
    let weight = request.weight.unwrap_or_default();
    let material = request.material.as_deref().unwrap_or("general goods");
    let parcel_id = receipt.id.as_deref().unwrap_or("pending");

    format!(
        "Parcel created successfully!\n\
         Route: {from} -> {to}\n\
         Weight: {weight} {unit}\n\
         Material: {material}\n\
         Parcel id: {parcel_id}\n\
         Trip id: {trip_id}\n\
         Cost: Rs {cost}"
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use parcelo_client::{
        ApiError, EntityCache, EntityKind, EntityRecord, LogisticsApi, ParcelDraft,
        ParcelReceipt, RouteIds, TripDraft,
    };
    use parcelo_core::config::AppConfig;

    use crate::fallback::FallbackExtractor;

    use super::{ParcelOrchestrator, ParcelOutcome};

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum TripMode {
        Create,
        FindOnly,
        Neither,
    }

    struct FakeBackend {
        trip_mode: TripMode,
        reject_submission: bool,
        submissions: Mutex<Vec<ParcelDraft>>,
        trip_creates: AtomicUsize,
        trip_finds: AtomicUsize,
    }

    impl FakeBackend {
        fn new(trip_mode: TripMode) -> Self {
            Self {
                trip_mode,
                reject_submission: false,
                submissions: Mutex::new(Vec::new()),
                trip_creates: AtomicUsize::new(0),
                trip_finds: AtomicUsize::new(0),
            }
        }

        fn last_submission(&self) -> Option<ParcelDraft> {
            self.submissions.lock().expect("lock").last().cloned()
        }
    }

    #[async_trait]
    impl LogisticsApi for FakeBackend {
        async fn query_entities(
            &self,
            kind: EntityKind,
            name: &str,
        ) -> Result<Vec<EntityRecord>, ApiError> {
            let catalog: &[(&str, &str)] = match kind {
                EntityKind::City => &[("Jaipur", "city-jaipur"), ("Kolkata", "city-kolkata")],
                EntityKind::Material => &[("Electronics", "mat-elec")],
                EntityKind::Company => &[("Abc", "company-abc")],
            };
            Ok(catalog
                .iter()
                .filter(|(entry, _)| entry.eq_ignore_ascii_case(name.trim()))
                .map(|(entry, id)| EntityRecord {
                    id: (*id).to_string(),
                    name: (*entry).to_string(),
                })
                .collect())
        }

        async fn list_entities(&self, _kind: EntityKind) -> Result<Vec<EntityRecord>, ApiError> {
            Ok(Vec::new())
        }

        async fn create_trip(&self, _draft: &TripDraft) -> Result<String, ApiError> {
            self.trip_creates.fetch_add(1, Ordering::SeqCst);
            match self.trip_mode {
                TripMode::Create => Ok("trip-new".to_string()),
                _ => Err(ApiError::Status { status: 500, body: "trip create down".to_string() }),
            }
        }

        async fn find_trip(&self, _route: &RouteIds) -> Result<Option<String>, ApiError> {
            self.trip_finds.fetch_add(1, Ordering::SeqCst);
            match self.trip_mode {
                TripMode::FindOnly => Ok(Some("trip-existing".to_string())),
                _ => Ok(None),
            }
        }

        async fn submit_parcel(&self, draft: &ParcelDraft) -> Result<ParcelReceipt, ApiError> {
            if self.reject_submission {
                return Err(ApiError::Status { status: 422, body: "rejected".to_string() });
            }
            self.submissions.lock().expect("lock").push(draft.clone());
            Ok(ParcelReceipt { id: Some("parcel-1".to_string()), cost: None })
        }
    }

    fn orchestrator(backend: FakeBackend) -> ParcelOrchestrator<FakeBackend> {
        let mut config = AppConfig::default();
        config.api.default_material_id = "mat-default".to_string();
        config.api.default_company_id = "company-default".to_string();
        ParcelOrchestrator::new(
            Arc::new(FallbackExtractor::new()),
            Arc::new(backend),
            Arc::new(EntityCache::new()),
            &config.api,
        )
    }

    #[tokio::test]
    async fn complete_message_creates_a_parcel() {
        let orchestrator = orchestrator(FakeBackend::new(TripMode::Create));

        let outcome = orchestrator
            .process_message("Create parcel for ABC from jaipur to kolkata 200kg electronics Rs 2500")
            .await;

        let ParcelOutcome::Created { message, parcel_id, cost, request } = outcome else {
            panic!("expected a created parcel, got {outcome:?}");
        };
        assert_eq!(parcel_id.as_deref(), Some("parcel-1"));
        assert_eq!(cost, 2500, "explicit price wins over the estimate");
        assert_eq!(request.from_city.as_deref(), Some("jaipur"));
        assert!(message.contains("Jaipur -> Kolkata"));
        assert!(message.contains("Rs 2500"));

        let draft = orchestrator.api.last_submission().expect("one submission");
        assert_eq!(draft.material_type, "mat-elec");
        assert_eq!(draft.quantity, 200.0);
        assert_eq!(draft.quantity_unit, "KILOGRAMS");
        assert_eq!(draft.trip_id, "trip-new");
        assert_eq!(draft.verification, "Verified");
        assert_eq!(draft.sender.sender_company.as_deref(), Some("company-abc"));
        assert_eq!(
            draft.pickup_postal_address.city.as_deref(),
            Some("city-jaipur")
        );
    }

    #[tokio::test]
    async fn vague_message_returns_a_clarification() {
        let orchestrator = orchestrator(FakeBackend::new(TripMode::Create));

        let outcome = orchestrator.process_message("send something somewhere").await;

        let ParcelOutcome::NeedsClarification { question } = outcome else {
            panic!("expected clarification, got {outcome:?}");
        };
        assert!(question.contains("weight"));
        assert!(question.contains("material type"));
        // Validation never reaches the remote backend.
        assert_eq!(orchestrator.api.trip_creates.load(Ordering::SeqCst), 0);
        assert!(orchestrator.api.last_submission().is_none());
    }

    #[tokio::test]
    async fn unresolved_cities_fail_with_every_city_named() {
        let orchestrator = orchestrator(FakeBackend::new(TripMode::Create));

        let outcome = orchestrator
            .process_message("parcel for ABC from atlantis to eldorado 10kg electronics")
            .await;

        let ParcelOutcome::Failed { message } = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert!(message.contains("could not find id for"));
        assert!(message.contains("atlantis"));
        assert!(message.contains("eldorado"));
    }

    #[tokio::test]
    async fn trip_creation_failure_falls_back_to_find() {
        let orchestrator = orchestrator(FakeBackend::new(TripMode::FindOnly));

        let outcome = orchestrator
            .process_message("parcel for ABC from jaipur to kolkata 10kg electronics")
            .await;

        assert!(outcome.is_success(), "got {outcome:?}");
        let draft = orchestrator.api.last_submission().expect("one submission");
        assert_eq!(draft.trip_id, "trip-existing");
        assert_eq!(orchestrator.api.trip_creates.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.api.trip_finds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn trip_ladder_ends_at_the_configured_static_id() {
        let mut config = AppConfig::default();
        config.api.fallback_trip_id = Some("trip-static".to_string());
        let orchestrator = ParcelOrchestrator::new(
            Arc::new(FallbackExtractor::new()),
            Arc::new(FakeBackend::new(TripMode::Neither)),
            Arc::new(EntityCache::new()),
            &config.api,
        );

        let outcome = orchestrator
            .process_message("parcel for ABC from jaipur to kolkata 10kg electronics")
            .await;

        assert!(outcome.is_success(), "got {outcome:?}");
        let draft = orchestrator.api.last_submission().expect("one submission");
        assert_eq!(draft.trip_id, "trip-static");
    }

    #[tokio::test]
    async fn exhausted_trip_ladder_fails_with_the_remote_error() {
        let orchestrator = orchestrator(FakeBackend::new(TripMode::Neither));

        let outcome = orchestrator
            .process_message("parcel for ABC from jaipur to kolkata 10kg electronics")
            .await;

        let ParcelOutcome::Failed { message } = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert!(message.contains("trip creation failed"));
        assert!(message.contains("trip create down"));
        // Single attempt each, no retry loop.
        assert_eq!(orchestrator.api.trip_creates.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.api.trip_finds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn submission_failure_surfaces_status_and_body() {
        let mut backend = FakeBackend::new(TripMode::Create);
        backend.reject_submission = true;
        let orchestrator = orchestrator(backend);

        let outcome = orchestrator
            .process_message("parcel for ABC from jaipur to kolkata 10kg electronics")
            .await;

        let ParcelOutcome::Failed { message } = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert!(message.contains("parcel submission failed"));
        assert!(message.contains("422"));
        assert!(message.contains("rejected"));
    }

    #[tokio::test]
    async fn unknown_material_and_company_use_configured_defaults() {
        let orchestrator = orchestrator(FakeBackend::new(TripMode::Create));

        let outcome = orchestrator
            .process_message("parcel from jaipur to kolkata 10kg of material like granite")
            .await;

        assert!(outcome.is_success(), "got {outcome:?}");
        let draft = orchestrator.api.last_submission().expect("one submission");
        assert_eq!(draft.material_type, "mat-default");
        assert_eq!(draft.sender.sender_company.as_deref(), Some("company-default"));
    }
}
