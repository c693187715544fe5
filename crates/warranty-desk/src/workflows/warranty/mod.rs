//! Warranty-claim adjudication: per-item approve/reject decisions, their
//! derived fees and estimates, validation, and the backend submission payload.

pub mod clock;
pub mod domain;
pub mod estimate;
pub mod gateway;
pub mod router;
pub mod service;
pub mod shipping;
pub mod store;
pub mod submission;
pub mod validation;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    Address, AddressId, CustomerContact, DestinationType, ItemId, ItemStatus, OrderReference,
    OrderStatus, RequestId, RequestStatus, RequestType, WarrantyItem, WarrantyRequest,
};
pub use gateway::{AddressDirectory, GatewayError, WarrantyRequestGateway};
pub use router::{warranty_router, AdjudicationDraft, SessionView};
pub use service::{AdjudicationError, AdjudicationSession, WarrantyAdjudicationService};
pub use shipping::{
    ResolutionOutcome, ShippingFeeResolver, ShippingQuote, ShippingQuoteRequest,
    ShippingRateError, ShippingRateProvider, SkipReason,
};
pub use store::{DecisionDraft, DecisionField, DecisionStore, DecisionStoreError, ItemDecision};
pub use submission::{assemble, assemble_submission, DecisionSubmission, ItemDecisionWire};
pub use validation::{validate, DecisionViolation};
