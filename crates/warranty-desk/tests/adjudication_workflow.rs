use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use warranty_desk::workflows::warranty::{
    assemble, validate, DecisionField, DecisionStore, DecisionViolation, FixedClock, ItemId,
    ItemStatus, RequestType, WarrantyRequest,
};

fn backend_record() -> WarrantyRequest {
    serde_json::from_value(json!({
        "id": "wr-7788",
        "sku": "NB-118",
        "requestType": "FEE",
        "status": "PROCESSING",
        "customer": { "name": "Tran Minh Chau", "phone": "0987654321" },
        "addressId": "addr-42",
        "noteInternal": null,
        "orderStatus": "AWAITING_PAYMENT",
        "items": [
            {
                "id": "oi-1",
                "description": "Zip broken on maternity jeans",
                "images": ["https://cdn.example.com/oi-1-front.jpg"],
                "warrantyRound": 2,
                "orders": [{ "orderId": "o-1", "orderCode": "MW-0001" }],
                "status": "APPROVED",
                "fee": 120000,
                "shippingFee": 30000,
                "estimateTime": "2025-05-04T12:00:00Z"
            },
            {
                "id": "oi-2",
                "description": "Loose button on nursing blouse",
                "warrantyRound": 1
            }
        ]
    }))
    .expect("backend record deserializes")
}

#[test]
fn store_seeds_from_backend_record() {
    let now = Utc
        .with_ymd_and_hms(2025, 5, 1, 8, 0, 0)
        .single()
        .expect("valid instant");
    let store = DecisionStore::initialize(&backend_record(), Arc::new(FixedClock::at(now)));

    let previous = store.get(&ItemId("oi-1".to_string())).expect("seeded");
    assert_eq!(previous.status, ItemStatus::Approved);
    assert_eq!(previous.estimate_days, 4);
    assert_eq!(previous.fee, Some(Decimal::new(120_000, 0)));

    let fresh = store.get(&ItemId("oi-2".to_string())).expect("seeded");
    assert_eq!(fresh.status, ItemStatus::Pending);
    assert_eq!(fresh.estimate_days, 7);
    assert!(fresh.rejected_reason.is_empty());
}

#[test]
fn reject_then_approve_cycle_reaches_a_submittable_state() {
    let now = Utc
        .with_ymd_and_hms(2025, 5, 1, 8, 0, 0)
        .single()
        .expect("valid instant");
    let clock = Arc::new(FixedClock::at(now));
    let mut store = DecisionStore::initialize(&backend_record(), clock.clone());
    let second = ItemId("oi-2".to_string());

    assert_eq!(store.request_type(), RequestType::Fee);
    store
        .set_field(&second, DecisionField::Fee(Some(Decimal::new(45_000, 0))))
        .expect("known item");
    store
        .set_status(&second, ItemStatus::Rejected)
        .expect("known item");
    assert!(matches!(
        validate(&store),
        Some(DecisionViolation::MissingRejectionReason { position: 2, .. })
    ));

    store
        .set_status(&second, ItemStatus::Approved)
        .expect("known item");
    assert!(matches!(
        validate(&store),
        Some(DecisionViolation::MissingShippingFee { position: 2, .. })
    ));

    store
        .set_field(&second, DecisionField::ShippingFee(Some(Decimal::new(22_000, 0))))
        .expect("known item");
    clock.advance(Duration::minutes(5));
    store.set_estimate_days(&second, 6).expect("known item");
    assert_eq!(validate(&store), None);

    let wire = assemble(&store);
    assert_eq!(wire[1].fee, Some(Decimal::new(45_000, 0)));
    assert_eq!(
        wire[1].estimate_time,
        Some(now + Duration::minutes(5) + Duration::days(6))
    );
    assert_eq!(
        wire[0].estimate_time,
        Utc.with_ymd_and_hms(2025, 5, 4, 12, 0, 0).single(),
        "seeded stamp is carried over untouched"
    );
}
