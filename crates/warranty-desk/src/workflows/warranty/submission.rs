//! Maps the decision store onto the backend's update payload.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{DestinationType, ItemId, ItemStatus, RequestType};
use super::store::{DecisionStore, ItemDecision};

/// Per-item decision exactly as the backend update operation expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDecisionWire {
    pub order_item_id: ItemId,
    pub status: ItemStatus,
    pub destination_type: DestinationType,
    pub shipping_fee: Option<Decimal>,
    pub fee: Option<Decimal>,
    pub rejected_reason: Option<String>,
    pub estimate_time: Option<DateTime<Utc>>,
}

/// Body handed to the external submit-decision operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionSubmission {
    pub note_internal: Option<String>,
    pub items: Vec<ItemDecisionWire>,
}

/// Builds the wire list in item order. Gating on validation is the caller's job.
pub fn assemble(store: &DecisionStore) -> Vec<ItemDecisionWire> {
    let now = store.now();
    let request_type = store.request_type();
    store
        .iter()
        .map(|(item_id, decision)| to_wire(item_id, decision, request_type, now))
        .collect()
}

pub fn assemble_submission(store: &DecisionStore, note_internal: Option<String>) -> DecisionSubmission {
    DecisionSubmission {
        note_internal: note_internal.filter(|note| !note.trim().is_empty()),
        items: assemble(store),
    }
}

fn to_wire(
    item_id: &ItemId,
    decision: &ItemDecision,
    request_type: RequestType,
    now: DateTime<Utc>,
) -> ItemDecisionWire {
    if decision.status == ItemStatus::Rejected {
        return ItemDecisionWire {
            order_item_id: item_id.clone(),
            status: decision.status,
            destination_type: DestinationType::Factory,
            shipping_fee: None,
            fee: None,
            rejected_reason: Some(decision.rejected_reason.clone()),
            estimate_time: None,
        };
    }

    let chargeable = request_type.is_chargeable();
    ItemDecisionWire {
        order_item_id: item_id.clone(),
        status: decision.status,
        destination_type: DestinationType::Factory,
        shipping_fee: decision.shipping_fee.filter(|_| chargeable),
        fee: decision.fee.filter(|_| chargeable),
        rejected_reason: None,
        estimate_time: Some(decision.estimate_time.unwrap_or(now)),
    }
}
