//! Completeness gate run over the whole decision set before submission.
//!
//! Decision table, checked per item in request order; the first hit wins:
//!
//! | status    | check                                   | request type |
//! |-----------|-----------------------------------------|--------------|
//! | REJECTED  | reason is non-blank                     | any          |
//! | APPROVED  | estimate days > 0                       | any          |
//! | APPROVED  | fee > 0, then shipping fee > 0          | FEE only     |
//!
//! PENDING and IN_TRANSIT items pass through unflagged.

use rust_decimal::Decimal;

use super::domain::{ItemId, ItemStatus, RequestType};
use super::store::{DecisionStore, ItemDecision};

/// First completeness problem found in a decision set.
///
/// `position` is the item's 1-based place in the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionViolation {
    #[error("item #{position} ({item_id}): a rejection reason is required")]
    MissingRejectionReason { position: usize, item_id: ItemId },
    #[error("item #{position} ({item_id}): estimated completion must be a positive number of days (got {days})")]
    InvalidEstimate {
        position: usize,
        item_id: ItemId,
        days: i64,
    },
    #[error("item #{position} ({item_id}): repair fee must be greater than zero")]
    MissingFee { position: usize, item_id: ItemId },
    #[error("item #{position} ({item_id}): shipping fee must be greater than zero")]
    MissingShippingFee { position: usize, item_id: ItemId },
}

impl DecisionViolation {
    pub fn item_id(&self) -> &ItemId {
        match self {
            DecisionViolation::MissingRejectionReason { item_id, .. }
            | DecisionViolation::InvalidEstimate { item_id, .. }
            | DecisionViolation::MissingFee { item_id, .. }
            | DecisionViolation::MissingShippingFee { item_id, .. } => item_id,
        }
    }
}

/// Returns the first violation in item order, or `None` when the set may be submitted.
pub fn validate(store: &DecisionStore) -> Option<DecisionViolation> {
    let request_type = store.request_type();
    store
        .iter()
        .enumerate()
        .find_map(|(index, (item_id, decision))| {
            check_item(index + 1, item_id, decision, request_type)
        })
}

fn check_item(
    position: usize,
    item_id: &ItemId,
    decision: &ItemDecision,
    request_type: RequestType,
) -> Option<DecisionViolation> {
    match decision.status {
        ItemStatus::Rejected if decision.rejected_reason.trim().is_empty() => {
            Some(DecisionViolation::MissingRejectionReason {
                position,
                item_id: item_id.clone(),
            })
        }
        ItemStatus::Approved => check_approval(position, item_id, decision, request_type),
        _ => None,
    }
}

fn check_approval(
    position: usize,
    item_id: &ItemId,
    decision: &ItemDecision,
    request_type: RequestType,
) -> Option<DecisionViolation> {
    if decision.estimate_days <= 0 {
        return Some(DecisionViolation::InvalidEstimate {
            position,
            item_id: item_id.clone(),
            days: decision.estimate_days,
        });
    }

    if !request_type.is_chargeable() {
        return None;
    }

    if !is_positive(decision.fee) {
        return Some(DecisionViolation::MissingFee {
            position,
            item_id: item_id.clone(),
        });
    }

    if !is_positive(decision.shipping_fee) {
        return Some(DecisionViolation::MissingShippingFee {
            position,
            item_id: item_id.clone(),
        });
    }

    None
}

fn is_positive(amount: Option<Decimal>) -> bool {
    amount.map(|value| value > Decimal::ZERO).unwrap_or(false)
}
