//! Advisory shipping quotes for chargeable requests.
//!
//! A quote lands in the same `shipping_fee` field staff edit by hand, so a
//! manual value is only replaced when resolution is triggered again.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{Address, ItemId, RequestType};
use super::store::{DecisionField, DecisionStore};

pub const DEFAULT_DECLARED_WEIGHT_GRAMS: u32 = 500;

/// Query sent to the shipping-rate service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingQuoteRequest {
    pub province: String,
    pub district: String,
    /// Declared parcel weight in grams.
    pub weight: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub fee: Decimal,
}

/// External shipping-rate lookup.
#[async_trait]
pub trait ShippingRateProvider: Send + Sync {
    async fn quote(&self, request: &ShippingQuoteRequest)
        -> Result<ShippingQuote, ShippingRateError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShippingRateError {
    #[error("no shipping route to {district}, {province}")]
    UnsupportedRoute { province: String, district: String },
    #[error("shipping-rate transport failed: {0}")]
    Transport(String),
    #[error("shipping-rate response malformed: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoAddress,
    FreeRequest,
    UnknownItem,
}

/// Result of one resolution attempt. Only `Quoted` mutates the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Quoted { fee: Decimal },
    Skipped { reason: SkipReason },
    Failed { message: String },
}

#[derive(Clone)]
pub struct ShippingFeeResolver {
    provider: Arc<dyn ShippingRateProvider>,
    declared_weight_grams: u32,
}

impl std::fmt::Debug for ShippingFeeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShippingFeeResolver")
            .field("declared_weight_grams", &self.declared_weight_grams)
            .finish_non_exhaustive()
    }
}

impl ShippingFeeResolver {
    pub fn new(provider: Arc<dyn ShippingRateProvider>) -> Self {
        Self::with_declared_weight(provider, DEFAULT_DECLARED_WEIGHT_GRAMS)
    }

    pub fn with_declared_weight(
        provider: Arc<dyn ShippingRateProvider>,
        declared_weight_grams: u32,
    ) -> Self {
        Self {
            provider,
            declared_weight_grams,
        }
    }

    pub fn declared_weight_grams(&self) -> u32 {
        self.declared_weight_grams
    }

    pub async fn resolve_one(
        &self,
        store: &mut DecisionStore,
        address: Option<&Address>,
        item_id: &ItemId,
    ) -> ResolutionOutcome {
        let Some(address) = address else {
            return ResolutionOutcome::Skipped {
                reason: SkipReason::NoAddress,
            };
        };
        if store.request_type() != RequestType::Fee {
            return ResolutionOutcome::Skipped {
                reason: SkipReason::FreeRequest,
            };
        }
        if store.get(item_id).is_none() {
            return ResolutionOutcome::Skipped {
                reason: SkipReason::UnknownItem,
            };
        }

        let request = ShippingQuoteRequest {
            province: address.province.clone(),
            district: address.district.clone(),
            weight: self.declared_weight_grams,
        };

        match self.provider.quote(&request).await {
            Ok(quote) => match store.set_field(item_id, DecisionField::ShippingFee(Some(quote.fee)))
            {
                Ok(()) => {
                    debug!(item_id = %item_id, fee = %quote.fee, "shipping fee quoted");
                    ResolutionOutcome::Quoted { fee: quote.fee }
                }
                Err(err) => ResolutionOutcome::Failed {
                    message: err.to_string(),
                },
            },
            Err(err) => {
                warn!(
                    request_id = %store.request_id(),
                    item_id = %item_id,
                    error = %err,
                    "shipping fee lookup failed; keeping current value"
                );
                ResolutionOutcome::Failed {
                    message: err.to_string(),
                }
            }
        }
    }

    /// Quotes every item one after another; each lookup settles before the next starts.
    pub async fn resolve_all(
        &self,
        store: &mut DecisionStore,
        address: Option<&Address>,
    ) -> Vec<(ItemId, ResolutionOutcome)> {
        let mut outcomes = Vec::with_capacity(store.len());
        for item_id in store.item_ids() {
            let outcome = self.resolve_one(store, address, &item_id).await;
            outcomes.push((item_id, outcome));
        }
        outcomes
    }
}
