//! In-progress decisions for every item of the currently open request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::clock::Clock;
use super::domain::{ItemId, ItemStatus, RequestId, RequestType, WarrantyItem, WarrantyRequest};
use super::estimate;

pub const DEFAULT_ESTIMATE_DAYS: i64 = 7;

/// Mutable decision record for a single item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDecision {
    pub status: ItemStatus,
    pub fee: Option<Decimal>,
    pub shipping_fee: Option<Decimal>,
    pub rejected_reason: String,
    pub estimate_days: i64,
    pub estimate_time: Option<DateTime<Utc>>,
}

impl ItemDecision {
    fn seeded(item: &WarrantyItem, now: DateTime<Utc>, default_estimate_days: i64) -> Self {
        let estimate_days = match item.estimate_time {
            Some(stamp) => estimate::days_until(now, stamp),
            None => default_estimate_days,
        };

        Self {
            status: item.status,
            fee: item.fee,
            shipping_fee: item.shipping_fee,
            rejected_reason: item.rejected_reason.clone().unwrap_or_default(),
            estimate_days,
            estimate_time: item.estimate_time,
        }
    }
}

/// Single scalar field staff can overwrite.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionField {
    Fee(Option<Decimal>),
    ShippingFee(Option<Decimal>),
    RejectedReason(String),
}

/// Partial staff edit for one item; absent fields are left untouched.
///
/// Money fields distinguish an absent key (`None`) from an explicit `null`
/// (`Some(None)`), which clears the amount.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionDraft {
    pub item_id: ItemId,
    #[serde(default)]
    pub status: Option<ItemStatus>,
    #[serde(
        default,
        deserialize_with = "present_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub fee: Option<Option<Decimal>>,
    #[serde(
        default,
        deserialize_with = "present_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub shipping_fee: Option<Option<Decimal>>,
    #[serde(default)]
    pub rejected_reason: Option<String>,
    #[serde(default)]
    pub estimate_days: Option<i64>,
}

fn present_amount<'de, D>(deserializer: D) -> Result<Option<Option<Decimal>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Decimal>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionStoreError {
    #[error("item {0} is not part of this warranty request")]
    UnknownItem(ItemId),
    #[error("status {} is assigned by the backend and cannot be chosen", .0.label())]
    BackendOnlyStatus(ItemStatus),
    #[error("item {item_id}: {days} days cannot be turned into a completion date")]
    EstimateOutOfRange { item_id: ItemId, days: i64 },
}

/// Keyed decision map owned by one adjudication session.
///
/// Iteration order always matches the request's item order.
#[derive(Debug, Clone)]
pub struct DecisionStore {
    request_id: RequestId,
    request_type: RequestType,
    decisions: IndexMap<ItemId, ItemDecision>,
    clock: Arc<dyn Clock>,
}

impl DecisionStore {
    pub fn initialize(request: &WarrantyRequest, clock: Arc<dyn Clock>) -> Self {
        Self::initialize_with(request, clock, DEFAULT_ESTIMATE_DAYS)
    }

    pub fn initialize_with(
        request: &WarrantyRequest,
        clock: Arc<dyn Clock>,
        default_estimate_days: i64,
    ) -> Self {
        let now = clock.now();
        let decisions: IndexMap<ItemId, ItemDecision> = request
            .items
            .iter()
            .map(|item| {
                (
                    item.id.clone(),
                    ItemDecision::seeded(item, now, default_estimate_days),
                )
            })
            .collect();

        debug!(
            request_id = %request.id,
            items = decisions.len(),
            request_type = request.request_type.label(),
            "seeded decision store"
        );

        Self {
            request_id: request.id.clone(),
            request_type: request.request_type,
            decisions,
            clock,
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn get(&self, item_id: &ItemId) -> Option<&ItemDecision> {
        self.decisions.get(item_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &ItemDecision)> {
        self.decisions.iter()
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.decisions.keys().cloned().collect()
    }

    /// Overwrites only the status. Fee data entered earlier survives a
    /// reject-then-approve cycle.
    pub fn set_status(
        &mut self,
        item_id: &ItemId,
        status: ItemStatus,
    ) -> Result<(), DecisionStoreError> {
        if status == ItemStatus::InTransit {
            return Err(DecisionStoreError::BackendOnlyStatus(status));
        }
        self.decision_mut(item_id)?.status = status;
        Ok(())
    }

    pub fn set_field(
        &mut self,
        item_id: &ItemId,
        field: DecisionField,
    ) -> Result<(), DecisionStoreError> {
        let decision = self.decision_mut(item_id)?;
        match field {
            DecisionField::Fee(value) => decision.fee = value,
            DecisionField::ShippingFee(value) => decision.shipping_fee = value,
            DecisionField::RejectedReason(value) => decision.rejected_reason = value,
        }
        Ok(())
    }

    /// Sets the day count and re-stamps `estimate_time` from the current instant.
    ///
    /// A count too large to stamp leaves the decision unchanged.
    pub fn set_estimate_days(
        &mut self,
        item_id: &ItemId,
        days: i64,
    ) -> Result<(), DecisionStoreError> {
        let stamp = self.stamp_for(item_id, days)?;
        let decision = self.decision_mut(item_id)?;
        decision.estimate_days = days;
        decision.estimate_time = Some(stamp);
        Ok(())
    }

    /// Applies a staff draft through the individual mutators.
    pub fn apply(&mut self, draft: DecisionDraft) -> Result<(), DecisionStoreError> {
        let DecisionDraft {
            item_id,
            status,
            fee,
            shipping_fee,
            rejected_reason,
            estimate_days,
        } = draft;

        // Check everything that can fail before the first write.
        if !self.decisions.contains_key(&item_id) {
            return Err(DecisionStoreError::UnknownItem(item_id));
        }
        if status == Some(ItemStatus::InTransit) {
            return Err(DecisionStoreError::BackendOnlyStatus(ItemStatus::InTransit));
        }
        if let Some(days) = estimate_days {
            self.stamp_for(&item_id, days)?;
        }

        if let Some(status) = status {
            self.set_status(&item_id, status)?;
        }
        if let Some(fee) = fee {
            self.set_field(&item_id, DecisionField::Fee(fee))?;
        }
        if let Some(shipping_fee) = shipping_fee {
            self.set_field(&item_id, DecisionField::ShippingFee(shipping_fee))?;
        }
        if let Some(reason) = rejected_reason {
            self.set_field(&item_id, DecisionField::RejectedReason(reason))?;
        }
        if let Some(days) = estimate_days {
            self.set_estimate_days(&item_id, days)?;
        }
        Ok(())
    }

    fn stamp_for(&self, item_id: &ItemId, days: i64) -> Result<DateTime<Utc>, DecisionStoreError> {
        estimate::estimate_time(self.clock.now(), days).ok_or_else(|| {
            DecisionStoreError::EstimateOutOfRange {
                item_id: item_id.clone(),
                days,
            }
        })
    }

    fn decision_mut(&mut self, item_id: &ItemId) -> Result<&mut ItemDecision, DecisionStoreError> {
        self.decisions
            .get_mut(item_id)
            .ok_or_else(|| DecisionStoreError::UnknownItem(item_id.clone()))
    }
}
