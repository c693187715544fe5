use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use super::clock::{Clock, SystemClock};
use super::domain::{Address, ItemId, ItemStatus, RequestId, WarrantyRequest};
use super::gateway::{AddressDirectory, GatewayError, WarrantyRequestGateway};
use super::shipping::{ResolutionOutcome, ShippingFeeResolver, ShippingRateProvider};
use super::store::{DecisionDraft, DecisionStore, DecisionStoreError};
use super::submission::{self, DecisionSubmission, ItemDecisionWire};
use super::validation::{self, DecisionViolation};
use crate::config::WarrantyConfig;

/// Open adjudication form for one request. Owns its decision store exclusively.
#[derive(Debug, Clone)]
pub struct AdjudicationSession {
    request: WarrantyRequest,
    address: Option<Address>,
    store: DecisionStore,
    note_internal: Option<String>,
}

impl AdjudicationSession {
    pub fn new(
        request: WarrantyRequest,
        address: Option<Address>,
        clock: Arc<dyn Clock>,
        default_estimate_days: i64,
    ) -> Self {
        let store = DecisionStore::initialize_with(&request, clock, default_estimate_days);
        let note_internal = request.note_internal.clone();
        Self {
            request,
            address,
            store,
            note_internal,
        }
    }

    pub fn request(&self) -> &WarrantyRequest {
        &self.request
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn store(&self) -> &DecisionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DecisionStore {
        &mut self.store
    }

    pub fn note_internal(&self) -> Option<&str> {
        self.note_internal.as_deref()
    }

    pub fn set_note_internal(&mut self, note: Option<String>) {
        self.note_internal = note;
    }

    /// Applies every draft or none: drafts are checked against a scratch copy first.
    pub fn apply_drafts(&mut self, drafts: Vec<DecisionDraft>) -> Result<(), DecisionStoreError> {
        let mut scratch = self.store.clone();
        for draft in drafts {
            scratch.apply(draft)?;
        }
        self.store = scratch;
        Ok(())
    }

    pub fn validate(&self) -> Option<DecisionViolation> {
        validation::validate(&self.store)
    }

    pub fn assemble(&self) -> Vec<ItemDecisionWire> {
        submission::assemble(&self.store)
    }

    /// First item still awaiting a staff decision, with its 1-based position.
    pub fn first_undecided(&self) -> Option<(usize, ItemId)> {
        self.store
            .iter()
            .enumerate()
            .find(|(_, (_, decision))| decision.status == ItemStatus::Pending)
            .map(|(index, (item_id, _))| (index + 1, item_id.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Action {
    SubmitDecision,
    CreateShippingOrder,
}

/// Per-request "pending" flags preventing a second call while one is outstanding.
#[derive(Debug, Default)]
struct InFlightRegistry {
    active: Mutex<HashSet<(RequestId, Action)>>,
}

impl InFlightRegistry {
    fn acquire(
        &self,
        request_id: &RequestId,
        action: Action,
    ) -> Result<InFlightTicket<'_>, AdjudicationError> {
        let key = (request_id.clone(), action);
        if !self.lock().insert(key.clone()) {
            return Err(AdjudicationError::InFlight(request_id.clone()));
        }
        Ok(InFlightTicket {
            registry: self,
            key,
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<(RequestId, Action)>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct InFlightTicket<'a> {
    registry: &'a InFlightRegistry,
    key: (RequestId, Action),
}

impl Drop for InFlightTicket<'_> {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
    }
}

/// Service composing the backend gateway, address lookup, and shipping resolver.
pub struct WarrantyAdjudicationService {
    requests: Arc<dyn WarrantyRequestGateway>,
    addresses: Arc<dyn AddressDirectory>,
    resolver: ShippingFeeResolver,
    clock: Arc<dyn Clock>,
    config: WarrantyConfig,
    in_flight: InFlightRegistry,
}

impl WarrantyAdjudicationService {
    pub fn new(
        requests: Arc<dyn WarrantyRequestGateway>,
        addresses: Arc<dyn AddressDirectory>,
        rates: Arc<dyn ShippingRateProvider>,
        config: WarrantyConfig,
    ) -> Self {
        Self::with_clock(requests, addresses, rates, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        requests: Arc<dyn WarrantyRequestGateway>,
        addresses: Arc<dyn AddressDirectory>,
        rates: Arc<dyn ShippingRateProvider>,
        config: WarrantyConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let resolver = ShippingFeeResolver::with_declared_weight(rates, config.declared_weight_grams);
        Self {
            requests,
            addresses,
            resolver,
            clock,
            config,
            in_flight: InFlightRegistry::default(),
        }
    }

    pub fn config(&self) -> &WarrantyConfig {
        &self.config
    }

    /// Load a request and seed a fresh session from its current server state.
    pub async fn open(
        &self,
        request_id: &RequestId,
    ) -> Result<AdjudicationSession, AdjudicationError> {
        let request = self
            .requests
            .fetch_request(request_id)
            .await?
            .ok_or_else(|| AdjudicationError::NotFound(request_id.clone()))?;

        let address = match &request.address_id {
            Some(address_id) => match self.addresses.get_address(address_id).await {
                Ok(address) => Some(address),
                Err(err) => {
                    warn!(
                        request_id = %request_id,
                        address_id = %address_id.0,
                        error = %err,
                        "pickup address lookup failed; shipping fees must be entered manually"
                    );
                    None
                }
            },
            None => None,
        };

        Ok(AdjudicationSession::new(
            request,
            address,
            self.clock.clone(),
            self.config.default_estimate_days,
        ))
    }

    pub async fn quote_shipping(
        &self,
        session: &mut AdjudicationSession,
    ) -> Vec<(ItemId, ResolutionOutcome)> {
        self.resolver
            .resolve_all(&mut session.store, session.address.as_ref())
            .await
    }

    pub async fn quote_item(
        &self,
        session: &mut AdjudicationSession,
        item_id: &ItemId,
    ) -> ResolutionOutcome {
        self.resolver
            .resolve_one(&mut session.store, session.address.as_ref(), item_id)
            .await
    }

    /// Validate, assemble, and hand the decision set to the backend.
    ///
    /// The session is only borrowed, so every entered value survives a failure.
    pub async fn submit(
        &self,
        session: &AdjudicationSession,
    ) -> Result<DecisionSubmission, AdjudicationError> {
        let request_id = session.request.id.clone();

        if let Some(violation) = session.validate() {
            info!(request_id = %request_id, %violation, "decision submission blocked");
            return Err(AdjudicationError::Invalid(violation));
        }
        if !self.config.allow_pending_items {
            if let Some((position, item_id)) = session.first_undecided() {
                return Err(AdjudicationError::Undecided { position, item_id });
            }
        }

        let _ticket = self
            .in_flight
            .acquire(&request_id, Action::SubmitDecision)?;

        let payload =
            submission::assemble_submission(&session.store, session.note_internal.clone());

        if let Err(err) = self.requests.submit_decision(&request_id, &payload).await {
            warn!(request_id = %request_id, error = %err, "decision submission failed");
            return Err(err.into());
        }

        info!(
            request_id = %request_id,
            items = payload.items.len(),
            "warranty decisions submitted"
        );
        Ok(payload)
    }

    /// Create the outbound shipping order once the repair order is paid.
    pub async fn create_shipping_order(
        &self,
        request_id: &RequestId,
    ) -> Result<(), AdjudicationError> {
        let request = self
            .requests
            .fetch_request(request_id)
            .await?
            .ok_or_else(|| AdjudicationError::NotFound(request_id.clone()))?;

        if !request.can_create_shipping_order() {
            return Err(AdjudicationError::ShippingOrderUnavailable(request_id.clone()));
        }

        let _ticket = self
            .in_flight
            .acquire(request_id, Action::CreateShippingOrder)?;

        if let Err(err) = self.requests.create_shipping_order(request_id).await {
            warn!(request_id = %request_id, error = %err, "shipping order creation failed");
            return Err(err.into());
        }

        info!(request_id = %request_id, "shipping order created");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdjudicationError {
    #[error("warranty request {0} not found")]
    NotFound(RequestId),
    #[error(transparent)]
    Store(#[from] DecisionStoreError),
    #[error("decisions incomplete: {0}")]
    Invalid(DecisionViolation),
    #[error("item #{position} ({item_id}) has no decision yet")]
    Undecided { position: usize, item_id: ItemId },
    #[error("an operation for request {0} is already in progress")]
    InFlight(RequestId),
    #[error("shipping order for request {0} requires a completed payment")]
    ShippingOrderUnavailable(RequestId),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl AdjudicationError {
    /// Message shown to staff in a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            AdjudicationError::Gateway(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
