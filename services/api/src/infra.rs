use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use warranty_desk::workflows::warranty::{
    Address, AddressDirectory, AddressId, CustomerContact, DecisionSubmission, GatewayError,
    ItemId, ItemStatus, OrderReference, OrderStatus, RequestId, RequestStatus, RequestType,
    ShippingQuote, ShippingQuoteRequest, ShippingRateError, ShippingRateProvider, WarrantyItem,
    WarrantyRequest, WarrantyRequestGateway,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stand-in for the warranty backend. Accepted decisions are written back so
/// a re-opened request reflects the new server state.
#[derive(Default, Clone)]
pub(crate) struct InMemoryWarrantyGateway {
    requests: Arc<Mutex<HashMap<RequestId, WarrantyRequest>>>,
}

impl InMemoryWarrantyGateway {
    pub(crate) fn seeded(requests: Vec<WarrantyRequest>) -> Self {
        let gateway = Self::default();
        {
            let mut guard = gateway.requests.lock().expect("gateway mutex poisoned");
            for request in requests {
                guard.insert(request.id.clone(), request);
            }
        }
        gateway
    }

    pub(crate) fn snapshot(&self, id: &RequestId) -> Option<WarrantyRequest> {
        let guard = self.requests.lock().expect("gateway mutex poisoned");
        guard.get(id).cloned()
    }
}

#[async_trait]
impl WarrantyRequestGateway for InMemoryWarrantyGateway {
    async fn fetch_request(
        &self,
        id: &RequestId,
    ) -> Result<Option<WarrantyRequest>, GatewayError> {
        Ok(self.snapshot(id))
    }

    async fn submit_decision(
        &self,
        id: &RequestId,
        submission: &DecisionSubmission,
    ) -> Result<(), GatewayError> {
        let mut guard = self.requests.lock().expect("gateway mutex poisoned");
        let request = guard.get_mut(id).ok_or(GatewayError::NotFound)?;

        if let Some(unknown) = submission.items.iter().find(|decision| {
            !request
                .items
                .iter()
                .any(|item| item.id == decision.order_item_id)
        }) {
            return Err(GatewayError::Rejected {
                message: Some(format!("unknown item {}", unknown.order_item_id)),
            });
        }

        for decision in &submission.items {
            let Some(item) = request
                .items
                .iter_mut()
                .find(|item| item.id == decision.order_item_id)
            else {
                continue;
            };
            item.status = decision.status;
            item.fee = decision.fee;
            item.shipping_fee = decision.shipping_fee;
            item.rejected_reason = decision.rejected_reason.clone();
            item.estimate_time = decision.estimate_time;
        }

        request.note_internal = submission.note_internal.clone();
        request.status = if request
            .items
            .iter()
            .all(|item| item.status == ItemStatus::Rejected)
        {
            RequestStatus::Rejected
        } else {
            RequestStatus::Processing
        };
        if request.request_type == RequestType::Free
            && request.items.iter().any(|item| item.status == ItemStatus::Approved)
        {
            request.order_status = Some(OrderStatus::PaymentCompleted);
        } else if request.order_status.is_none() {
            request.order_status = Some(OrderStatus::AwaitingPayment);
        }
        Ok(())
    }

    async fn create_shipping_order(&self, id: &RequestId) -> Result<(), GatewayError> {
        let mut guard = self.requests.lock().expect("gateway mutex poisoned");
        let request = guard.get_mut(id).ok_or(GatewayError::NotFound)?;
        request.order_status = Some(OrderStatus::Shipping);
        for item in request
            .items
            .iter_mut()
            .filter(|item| item.status == ItemStatus::Approved)
        {
            item.status = ItemStatus::InTransit;
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAddressDirectory {
    addresses: Arc<HashMap<AddressId, Address>>,
}

impl InMemoryAddressDirectory {
    pub(crate) fn seeded(addresses: Vec<(AddressId, Address)>) -> Self {
        Self {
            addresses: Arc::new(addresses.into_iter().collect()),
        }
    }
}

#[async_trait]
impl AddressDirectory for InMemoryAddressDirectory {
    async fn get_address(&self, id: &AddressId) -> Result<Address, GatewayError> {
        self.addresses.get(id).cloned().ok_or(GatewayError::NotFound)
    }
}

/// Flat zone pricing: intra-city base, inter-province base, plus a step per started 500 g.
#[derive(Debug, Clone)]
pub(crate) struct ZoneRateTable {
    home_province: String,
    intra_city: Decimal,
    inter_province: Decimal,
    per_half_kilo: Decimal,
}

impl Default for ZoneRateTable {
    fn default() -> Self {
        Self {
            home_province: "Ho Chi Minh".to_string(),
            intra_city: Decimal::new(22_000, 0),
            inter_province: Decimal::new(35_000, 0),
            per_half_kilo: Decimal::new(5_000, 0),
        }
    }
}

impl ZoneRateTable {
    pub(crate) fn price(&self, request: &ShippingQuoteRequest) -> Result<Decimal, ShippingRateError> {
        if request.province.trim().is_empty() || request.district.trim().is_empty() {
            return Err(ShippingRateError::UnsupportedRoute {
                province: request.province.clone(),
                district: request.district.clone(),
            });
        }

        let base = if request.province.eq_ignore_ascii_case(&self.home_province) {
            self.intra_city
        } else {
            self.inter_province
        };
        let extra_steps = request.weight.saturating_sub(1) / 500;
        Ok(base + self.per_half_kilo * Decimal::from(extra_steps))
    }
}

#[async_trait]
impl ShippingRateProvider for ZoneRateTable {
    async fn quote(
        &self,
        request: &ShippingQuoteRequest,
    ) -> Result<ShippingQuote, ShippingRateError> {
        self.price(request).map(|fee| ShippingQuote { fee })
    }
}

pub(crate) fn sample_request(id: &str, request_type: RequestType) -> WarrantyRequest {
    let item = |suffix: &str, description: &str, round: u32| WarrantyItem {
        id: ItemId(format!("{id}-{suffix}")),
        description: description.to_string(),
        images: vec![format!("https://cdn.example.com/warranty/{id}/{suffix}.jpg")],
        warranty_round: round,
        orders: vec![OrderReference {
            order_id: format!("ord-{suffix}"),
            order_code: format!("MW-{suffix}"),
            purchased_at: None,
        }],
        status: ItemStatus::Pending,
        fee: None,
        shipping_fee: None,
        rejected_reason: None,
        estimate_time: None,
    };

    WarrantyRequest {
        id: RequestId(id.to_string()),
        sku: "MD-2041".to_string(),
        request_type,
        status: RequestStatus::Pending,
        customer: CustomerContact {
            name: "Nguyen Thu Ha".to_string(),
            phone: "0912345678".to_string(),
            email: Some("ha@example.com".to_string()),
        },
        address_id: Some(AddressId("addr-hcm-3".to_string())),
        note_internal: None,
        order_status: None,
        items: vec![
            item("1", "Side zipper on maternity dress catches", 1),
            item("2", "Stretch panel seam opened", 1),
            item("3", "Nursing clip snapped", 2),
        ],
    }
}

pub(crate) fn sample_addresses() -> Vec<(AddressId, Address)> {
    vec![(
        AddressId("addr-hcm-3".to_string()),
        Address {
            province: "Ho Chi Minh".to_string(),
            district: "District 3".to_string(),
            ward: "Ward 7".to_string(),
            street: "12 Nguyen Dinh Chieu".to_string(),
        },
    )]
}
