use crate::infra::{
    sample_addresses, sample_request, InMemoryAddressDirectory, InMemoryWarrantyGateway,
    ZoneRateTable,
};
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use std::sync::Arc;
use warranty_desk::config::WarrantyConfig;
use warranty_desk::error::AppError;
use warranty_desk::workflows::warranty::{
    AdjudicationError, AdjudicationSession, DecisionDraft, ItemStatus, RequestId, RequestType,
    ResolutionOutcome, WarrantyAdjudicationService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DemoRequestType {
    Fee,
    Free,
}

impl From<DemoRequestType> for RequestType {
    fn from(value: DemoRequestType) -> Self {
        match value {
            DemoRequestType::Fee => RequestType::Fee,
            DemoRequestType::Free => RequestType::Free,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Whether repairs on the sample request are chargeable
    #[arg(long, value_enum, default_value_t = DemoRequestType::Fee)]
    pub(crate) request_type: DemoRequestType,
    /// 1-based position of an item to reject instead of approve
    #[arg(long)]
    pub(crate) reject_item: Option<usize>,
    /// Estimated repair time in days for approved items
    #[arg(long, default_value_t = 5)]
    pub(crate) estimate_days: i64,
    /// Repair fee per approved item (VND)
    #[arg(long, default_value_t = 150_000)]
    pub(crate) fee: i64,
}

const DEMO_REQUEST_ID: &str = "wr-demo";

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        request_type,
        reject_item,
        estimate_days,
        fee,
    } = args;
    let request_type = RequestType::from(request_type);

    let gateway = Arc::new(InMemoryWarrantyGateway::seeded(vec![sample_request(
        DEMO_REQUEST_ID,
        request_type,
    )]));
    let service = WarrantyAdjudicationService::new(
        gateway.clone(),
        Arc::new(InMemoryAddressDirectory::seeded(sample_addresses())),
        Arc::new(ZoneRateTable::default()),
        WarrantyConfig::default(),
    );
    let request_id = RequestId(DEMO_REQUEST_ID.to_string());

    println!("Warranty adjudication demo");
    let mut session = service.open(&request_id).await?;
    render_request(&session);

    println!("\nShipping quotes");
    for (item_id, outcome) in service.quote_shipping(&mut session).await {
        match outcome {
            ResolutionOutcome::Quoted { fee } => println!("- {item_id}: {fee} VND"),
            ResolutionOutcome::Skipped { reason } => println!("- {item_id}: skipped ({reason:?})"),
            ResolutionOutcome::Failed { message } => println!("- {item_id}: failed ({message})"),
        }
    }

    let drafts: Vec<DecisionDraft> = session
        .store()
        .item_ids()
        .into_iter()
        .enumerate()
        .map(|(index, item_id)| {
            if reject_item == Some(index + 1) {
                DecisionDraft {
                    item_id,
                    status: Some(ItemStatus::Rejected),
                    rejected_reason: Some("Damage outside warranty coverage".to_string()),
                    ..DecisionDraft::default()
                }
            } else {
                DecisionDraft {
                    item_id,
                    status: Some(ItemStatus::Approved),
                    fee: Some(Some(Decimal::from(fee))),
                    estimate_days: Some(estimate_days),
                    ..DecisionDraft::default()
                }
            }
        })
        .collect();
    session
        .apply_drafts(drafts)
        .map_err(AdjudicationError::from)?;

    println!("\nValidation");
    match session.validate() {
        Some(violation) => {
            println!("- blocked: {violation}");
            return Ok(());
        }
        None => println!("- all items complete"),
    }

    let submission = match service.submit(&session).await {
        Ok(submission) => submission,
        Err(err) => {
            println!("- submission failed: {}", err.user_message());
            return Ok(());
        }
    };
    println!("\nSubmitted payload");
    match serde_json::to_string_pretty(&submission) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("  (unable to render payload: {err})"),
    }

    let refreshed = gateway.snapshot(&request_id);
    if refreshed
        .as_ref()
        .map(|request| request.can_create_shipping_order())
        .unwrap_or(false)
    {
        service.create_shipping_order(&request_id).await?;
        println!("\nShipping order created for {request_id}");
    } else {
        println!("\nShipping order waits for customer payment");
    }

    Ok(())
}

fn render_request(session: &AdjudicationSession) {
    let request = session.request();
    println!(
        "- Request {} ({}) for {} | {} item(s) | {} warranty",
        request.id,
        request.sku,
        request.customer.name,
        request.items.len(),
        request.request_type.label()
    );
    match session.address() {
        Some(address) => println!(
            "  Pickup: {}, {}, {}, {}",
            address.street, address.ward, address.district, address.province
        ),
        None => println!("  Pickup address unavailable; shipping fees need manual entry"),
    }
    for (item, (_, decision)) in request.items.iter().zip(session.store().iter()) {
        println!(
            "  - {} (round {}): {} | status {} | estimate {} day(s)",
            item.id,
            item.warranty_round,
            item.description,
            decision.status.label(),
            decision.estimate_days
        );
    }
}
