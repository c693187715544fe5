use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tokio::sync::Notify;

use crate::config::WarrantyConfig;
use crate::workflows::warranty::clock::FixedClock;
use crate::workflows::warranty::domain::{
    Address, AddressId, CustomerContact, ItemId, ItemStatus, OrderReference, RequestId,
    RequestStatus, RequestType, WarrantyItem, WarrantyRequest,
};
use crate::workflows::warranty::gateway::{AddressDirectory, GatewayError, WarrantyRequestGateway};
use crate::workflows::warranty::service::WarrantyAdjudicationService;
use crate::workflows::warranty::shipping::{
    ShippingQuote, ShippingQuoteRequest, ShippingRateError, ShippingRateProvider,
};
use crate::workflows::warranty::store::DecisionStore;
use crate::workflows::warranty::submission::DecisionSubmission;

pub(super) fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 14, 10, 0, 0)
        .single()
        .expect("valid anchor")
}

pub(super) fn vnd(amount: i64) -> Decimal {
    Decimal::new(amount, 0)
}

pub(super) fn id(raw: &str) -> ItemId {
    ItemId(raw.to_string())
}

pub(super) fn item(raw_id: &str) -> WarrantyItem {
    WarrantyItem {
        id: id(raw_id),
        description: "Elastic waistband lost stretch".to_string(),
        images: vec![format!("https://cdn.example.com/warranty/{raw_id}.jpg")],
        warranty_round: 1,
        orders: vec![OrderReference {
            order_id: format!("ord-{raw_id}"),
            order_code: format!("MW-{raw_id}"),
            purchased_at: None,
        }],
        status: ItemStatus::Pending,
        fee: None,
        shipping_fee: None,
        rejected_reason: None,
        estimate_time: None,
    }
}

pub(super) fn request(request_type: RequestType, items: Vec<WarrantyItem>) -> WarrantyRequest {
    WarrantyRequest {
        id: RequestId("wr-2001".to_string()),
        sku: "MD-2041".to_string(),
        request_type,
        status: RequestStatus::Processing,
        customer: CustomerContact {
            name: "Nguyen Thu Ha".to_string(),
            phone: "0912345678".to_string(),
            email: Some("ha@example.com".to_string()),
        },
        address_id: Some(AddressId("addr-1".to_string())),
        note_internal: Some("customer prefers weekday pickup".to_string()),
        order_status: None,
        items,
    }
}

pub(super) fn three_items(request_type: RequestType) -> WarrantyRequest {
    request(request_type, vec![item("i-1"), item("i-2"), item("i-3")])
}

pub(super) fn address() -> Address {
    Address {
        province: "Ho Chi Minh".to_string(),
        district: "District 3".to_string(),
        ward: "Ward 7".to_string(),
        street: "12 Nguyen Dinh Chieu".to_string(),
    }
}

pub(super) fn store_for(request: &WarrantyRequest) -> (DecisionStore, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::at(anchor()));
    let store = DecisionStore::initialize(request, clock.clone());
    (store, clock)
}

/// Blocks `submit_decision` until released so tests can observe the pending guard.
#[derive(Default)]
pub(super) struct SubmitGate {
    pub(super) entered: Notify,
    pub(super) release: Notify,
}

#[derive(Default)]
pub(super) struct MemoryGateway {
    requests: Mutex<HashMap<RequestId, WarrantyRequest>>,
    submissions: Mutex<Vec<(RequestId, DecisionSubmission)>>,
    shipping_orders: Mutex<Vec<RequestId>>,
    submit_failure: Mutex<Option<GatewayError>>,
    pub(super) gate: Option<Arc<SubmitGate>>,
}

impl MemoryGateway {
    pub(super) fn with_request(request: WarrantyRequest) -> Self {
        let gateway = Self::default();
        gateway.put(request);
        gateway
    }

    pub(super) fn put(&self, request: WarrantyRequest) {
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .insert(request.id.clone(), request);
    }

    pub(super) fn fail_next_submit(&self, error: GatewayError) {
        *self.submit_failure.lock().expect("failure mutex poisoned") = Some(error);
    }

    pub(super) fn submissions(&self) -> Vec<(RequestId, DecisionSubmission)> {
        self.submissions
            .lock()
            .expect("submission mutex poisoned")
            .clone()
    }

    pub(super) fn shipping_orders(&self) -> Vec<RequestId> {
        self.shipping_orders
            .lock()
            .expect("shipping mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl WarrantyRequestGateway for MemoryGateway {
    async fn fetch_request(
        &self,
        id: &RequestId,
    ) -> Result<Option<WarrantyRequest>, GatewayError> {
        Ok(self
            .requests
            .lock()
            .expect("request mutex poisoned")
            .get(id)
            .cloned())
    }

    async fn submit_decision(
        &self,
        id: &RequestId,
        submission: &DecisionSubmission,
    ) -> Result<(), GatewayError> {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if let Some(error) = self
            .submit_failure
            .lock()
            .expect("failure mutex poisoned")
            .take()
        {
            return Err(error);
        }
        self.submissions
            .lock()
            .expect("submission mutex poisoned")
            .push((id.clone(), submission.clone()));
        Ok(())
    }

    async fn create_shipping_order(&self, id: &RequestId) -> Result<(), GatewayError> {
        self.shipping_orders
            .lock()
            .expect("shipping mutex poisoned")
            .push(id.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryAddresses {
    addresses: HashMap<AddressId, Address>,
}

impl MemoryAddresses {
    pub(super) fn with_default() -> Self {
        let mut addresses = HashMap::new();
        addresses.insert(AddressId("addr-1".to_string()), address());
        Self { addresses }
    }
}

#[async_trait]
impl AddressDirectory for MemoryAddresses {
    async fn get_address(&self, id: &AddressId) -> Result<Address, GatewayError> {
        self.addresses.get(id).cloned().ok_or(GatewayError::NotFound)
    }
}

/// Rate provider that logs call boundaries and can fail a chosen call.
pub(super) struct RecordingRates {
    fee: Decimal,
    fail_on_call: Option<usize>,
    calls: Mutex<usize>,
    events: Mutex<Vec<String>>,
    requests: Mutex<Vec<ShippingQuoteRequest>>,
}

impl RecordingRates {
    pub(super) fn quoting(fee: Decimal) -> Self {
        Self {
            fee,
            fail_on_call: None,
            calls: Mutex::new(0),
            events: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn failing_on(fee: Decimal, call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::quoting(fee)
        }
    }

    pub(super) fn events(&self) -> Vec<String> {
        self.events.lock().expect("event mutex poisoned").clone()
    }

    pub(super) fn requests(&self) -> Vec<ShippingQuoteRequest> {
        self.requests.lock().expect("request mutex poisoned").clone()
    }

    fn record(&self, event: String) {
        self.events.lock().expect("event mutex poisoned").push(event);
    }
}

#[async_trait]
impl ShippingRateProvider for RecordingRates {
    async fn quote(
        &self,
        request: &ShippingQuoteRequest,
    ) -> Result<ShippingQuote, ShippingRateError> {
        let call = {
            let mut calls = self.calls.lock().expect("call mutex poisoned");
            *calls += 1;
            *calls
        };
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .push(request.clone());

        self.record(format!("start:{call}"));
        tokio::task::yield_now().await;
        self.record(format!("end:{call}"));

        if self.fail_on_call == Some(call) {
            return Err(ShippingRateError::Transport("connection reset".to_string()));
        }
        Ok(ShippingQuote { fee: self.fee })
    }
}

pub(super) struct Harness {
    pub(super) service: Arc<WarrantyAdjudicationService>,
    pub(super) gateway: Arc<MemoryGateway>,
    pub(super) rates: Arc<RecordingRates>,
    pub(super) clock: Arc<FixedClock>,
}

pub(super) fn harness(request: WarrantyRequest) -> Harness {
    harness_with(
        MemoryGateway::with_request(request),
        RecordingRates::quoting(vnd(32_000)),
        WarrantyConfig::default(),
    )
}

pub(super) fn harness_with(
    gateway: MemoryGateway,
    rates: RecordingRates,
    config: WarrantyConfig,
) -> Harness {
    let gateway = Arc::new(gateway);
    let rates = Arc::new(rates);
    let clock = Arc::new(FixedClock::at(anchor()));
    let service = Arc::new(WarrantyAdjudicationService::with_clock(
        gateway.clone(),
        Arc::new(MemoryAddresses::with_default()),
        rates.clone(),
        config,
        clock.clone(),
    ));
    Harness {
        service,
        gateway,
        rates,
        clock,
    }
}
