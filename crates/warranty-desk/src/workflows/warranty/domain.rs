use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for warranty requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

/// Identifier wrapper for the order item a warranty item refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressId(pub String);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether repair and shipping costs are chargeable to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    Fee,
    Free,
}

impl RequestType {
    pub const fn is_chargeable(self) -> bool {
        matches!(self, RequestType::Fee)
    }

    pub const fn label(self) -> &'static str {
        match self {
            RequestType::Fee => "fee",
            RequestType::Free => "free",
        }
    }
}

/// Per-item adjudication state.
///
/// `InTransit` is assigned by the backend once an approved item ships and is
/// never produced locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    InTransit,
}

impl ItemStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Approved => "approved",
            ItemStatus::Rejected => "rejected",
            ItemStatus::InTransit => "in_transit",
        }
    }
}

/// Overall lifecycle state of a warranty request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Processing,
    Completed,
    Rejected,
    Cancelled,
}

/// Payment/shipping state of the repair order attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    AwaitingPayment,
    PaymentCompleted,
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const fn allows_shipping_order(self) -> bool {
        matches!(self, OrderStatus::PaymentCompleted)
    }
}

/// Where an approved item is routed for repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DestinationType {
    Factory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContact {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Original purchase an item came from, shown to staff as context only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReference {
    pub order_id: String,
    pub order_code: String,
    #[serde(default)]
    pub purchased_at: Option<DateTime<Utc>>,
}

/// One physical unit under claim along with its last known server decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyItem {
    pub id: ItemId,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub warranty_round: u32,
    #[serde(default)]
    pub orders: Vec<OrderReference>,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub fee: Option<Decimal>,
    #[serde(default)]
    pub shipping_fee: Option<Decimal>,
    #[serde(default)]
    pub rejected_reason: Option<String>,
    #[serde(default)]
    pub estimate_time: Option<DateTime<Utc>>,
}

/// A customer's claim covering one or more purchased items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyRequest {
    pub id: RequestId,
    pub sku: String,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub customer: CustomerContact,
    #[serde(default)]
    pub address_id: Option<AddressId>,
    #[serde(default)]
    pub note_internal: Option<String>,
    #[serde(default)]
    pub order_status: Option<OrderStatus>,
    pub items: Vec<WarrantyItem>,
}

impl WarrantyRequest {
    pub fn can_create_shipping_order(&self) -> bool {
        self.order_status
            .map(OrderStatus::allows_shipping_order)
            .unwrap_or(false)
    }
}

/// Resolved pickup address supplied by the address directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub province: String,
    pub district: String,
    pub ward: String,
    pub street: String,
}
