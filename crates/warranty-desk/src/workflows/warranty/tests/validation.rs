use super::common::*;
use crate::workflows::warranty::domain::{ItemStatus, RequestType};
use crate::workflows::warranty::store::DecisionField;
use crate::workflows::warranty::validation::{validate, DecisionViolation};

#[test]
fn untouched_pending_items_are_not_flagged() {
    let (store, _) = store_for(&three_items(RequestType::Fee));
    assert_eq!(validate(&store), None);
}

#[test]
fn rejection_requires_a_reason_naming_the_item() {
    let (mut store, _) = store_for(&three_items(RequestType::Free));
    store
        .set_status(&id("i-2"), ItemStatus::Rejected)
        .expect("known item");
    store
        .set_field(&id("i-2"), DecisionField::RejectedReason("   ".to_string()))
        .expect("known item");

    let violation = validate(&store).expect("blank reason is flagged");
    assert_eq!(
        violation,
        DecisionViolation::MissingRejectionReason {
            position: 2,
            item_id: id("i-2"),
        }
    );
    assert!(violation.to_string().contains("i-2"));

    store
        .set_field(
            &id("i-2"),
            DecisionField::RejectedReason("Damage caused by bleach".to_string()),
        )
        .expect("known item");
    assert_eq!(validate(&store), None);
}

#[test]
fn approval_needs_a_positive_estimate() {
    let (mut store, _) = store_for(&request(RequestType::Free, vec![item("i-1")]));
    store
        .set_status(&id("i-1"), ItemStatus::Approved)
        .expect("known item");
    store.set_estimate_days(&id("i-1"), 0).expect("known item");

    assert!(matches!(
        validate(&store),
        Some(DecisionViolation::InvalidEstimate { days: 0, .. })
    ));

    store.set_estimate_days(&id("i-1"), 1).expect("known item");
    assert_eq!(validate(&store), None, "free requests need no fee data");
}

#[test]
fn chargeable_approval_needs_fee_then_shipping() {
    let (mut store, _) = store_for(&request(RequestType::Fee, vec![item("i-1")]));
    let item_id = id("i-1");
    store
        .set_status(&item_id, ItemStatus::Approved)
        .expect("known item");
    store.set_estimate_days(&item_id, 3).expect("known item");
    store
        .set_field(&item_id, DecisionField::Fee(Some(vnd(0))))
        .expect("known item");
    assert!(matches!(
        validate(&store),
        Some(DecisionViolation::MissingFee { .. })
    ));

    store
        .set_field(&item_id, DecisionField::Fee(Some(vnd(100))))
        .expect("known item");
    store
        .set_field(&item_id, DecisionField::ShippingFee(Some(vnd(0))))
        .expect("known item");
    assert!(matches!(
        validate(&store),
        Some(DecisionViolation::MissingShippingFee { .. })
    ));

    store
        .set_field(&item_id, DecisionField::ShippingFee(Some(vnd(50))))
        .expect("known item");
    assert_eq!(validate(&store), None);
}

#[test]
fn estimate_is_checked_before_fees() {
    let (mut store, _) = store_for(&request(RequestType::Fee, vec![item("i-1")]));
    store
        .set_status(&id("i-1"), ItemStatus::Approved)
        .expect("known item");
    store.set_estimate_days(&id("i-1"), -1).expect("known item");

    assert!(matches!(
        validate(&store),
        Some(DecisionViolation::InvalidEstimate { days: -1, .. })
    ));
}

#[test]
fn first_violation_in_item_order_wins() {
    let (mut store, _) = store_for(&three_items(RequestType::Fee));
    store
        .set_status(&id("i-3"), ItemStatus::Rejected)
        .expect("known item");
    store
        .set_status(&id("i-2"), ItemStatus::Approved)
        .expect("known item");

    let violation = validate(&store).expect("violations present");
    assert_eq!(violation.item_id(), &id("i-2"));
    assert!(matches!(violation, DecisionViolation::MissingFee { position: 2, .. }));
}

#[test]
fn past_seeded_estimate_fails_approval() {
    let mut stale = item("i-1");
    stale.status = ItemStatus::Approved;
    stale.estimate_time = Some(anchor() - chrono::Duration::days(2));
    let (store, _) = store_for(&request(RequestType::Free, vec![stale]));

    assert!(matches!(
        validate(&store),
        Some(DecisionViolation::InvalidEstimate { days: -2, .. })
    ));
}
