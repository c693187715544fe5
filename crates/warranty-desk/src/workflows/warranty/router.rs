use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{Address, ItemId, RequestId, RequestType};
use super::service::{AdjudicationError, AdjudicationSession, WarrantyAdjudicationService};
use super::shipping::ResolutionOutcome;
use super::store::{DecisionDraft, ItemDecision};
use super::validation::DecisionViolation;
use crate::error::workflow_status;

/// Router builder exposing the adjudication form over HTTP.
pub fn warranty_router(service: Arc<WarrantyAdjudicationService>) -> Router {
    Router::new()
        .route(
            "/api/v1/warranty/requests/:request_id/adjudication",
            get(open_handler).post(submit_handler),
        )
        .route(
            "/api/v1/warranty/requests/:request_id/adjudication/preview",
            post(preview_handler),
        )
        .route(
            "/api/v1/warranty/requests/:request_id/shipping-order",
            post(shipping_order_handler),
        )
        .with_state(service)
}

/// Staff edits posted by the console for one request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjudicationDraft {
    #[serde(default)]
    pub note_internal: Option<String>,
    #[serde(default)]
    pub decisions: Vec<DecisionDraft>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OpenParams {
    #[serde(default)]
    pub(crate) quote: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionView {
    pub item_id: ItemId,
    #[serde(flatten)]
    pub decision: ItemDecision,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteView {
    pub item_id: ItemId,
    #[serde(flatten)]
    pub outcome: ResolutionOutcome,
}

/// Seeded form state returned when the console opens a request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub request_id: RequestId,
    pub request_type: RequestType,
    pub can_create_shipping_order: bool,
    pub address: Option<Address>,
    pub note_internal: Option<String>,
    pub decisions: Vec<DecisionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_quotes: Option<Vec<QuoteView>>,
}

impl SessionView {
    pub fn from_session(
        session: &AdjudicationSession,
        quotes: Option<Vec<(ItemId, ResolutionOutcome)>>,
    ) -> Self {
        Self {
            request_id: session.request().id.clone(),
            request_type: session.request().request_type,
            can_create_shipping_order: session.request().can_create_shipping_order(),
            address: session.address().cloned(),
            note_internal: session.note_internal().map(str::to_string),
            decisions: session
                .store()
                .iter()
                .map(|(item_id, decision)| DecisionView {
                    item_id: item_id.clone(),
                    decision: decision.clone(),
                })
                .collect(),
            shipping_quotes: quotes.map(|quotes| {
                quotes
                    .into_iter()
                    .map(|(item_id, outcome)| QuoteView { item_id, outcome })
                    .collect()
            }),
        }
    }
}

pub(crate) async fn open_handler(
    State(service): State<Arc<WarrantyAdjudicationService>>,
    Path(request_id): Path<String>,
    Query(params): Query<OpenParams>,
) -> Response {
    let request_id = RequestId(request_id);
    let mut session = match service.open(&request_id).await {
        Ok(session) => session,
        Err(err) => return error_response(err),
    };

    let quotes = if params.quote {
        Some(service.quote_shipping(&mut session).await)
    } else {
        None
    };

    let view = SessionView::from_session(&session, quotes);
    (StatusCode::OK, Json(view)).into_response()
}

pub(crate) async fn preview_handler(
    State(service): State<Arc<WarrantyAdjudicationService>>,
    Path(request_id): Path<String>,
    Json(draft): Json<AdjudicationDraft>,
) -> Response {
    let session = match drafted_session(&service, RequestId(request_id), draft).await {
        Ok(session) => session,
        Err(err) => return error_response(err),
    };

    match session.validate() {
        Some(violation) => violation_response(&violation),
        None => {
            let payload = json!({
                "valid": true,
                "items": session.assemble(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn submit_handler(
    State(service): State<Arc<WarrantyAdjudicationService>>,
    Path(request_id): Path<String>,
    Json(draft): Json<AdjudicationDraft>,
) -> Response {
    let session = match drafted_session(&service, RequestId(request_id), draft).await {
        Ok(session) => session,
        Err(err) => return error_response(err),
    };

    match service.submit(&session).await {
        Ok(submission) => (StatusCode::ACCEPTED, Json(submission)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn shipping_order_handler(
    State(service): State<Arc<WarrantyAdjudicationService>>,
    Path(request_id): Path<String>,
) -> Response {
    let request_id = RequestId(request_id);
    match service.create_shipping_order(&request_id).await {
        Ok(()) => {
            let payload = json!({
                "requestId": request_id,
                "status": "shipping_order_created",
            });
            (StatusCode::ACCEPTED, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn drafted_session(
    service: &WarrantyAdjudicationService,
    request_id: RequestId,
    draft: AdjudicationDraft,
) -> Result<AdjudicationSession, AdjudicationError> {
    let mut session = service.open(&request_id).await?;
    if draft.note_internal.is_some() {
        session.set_note_internal(draft.note_internal);
    }
    session.apply_drafts(draft.decisions)?;
    Ok(session)
}

fn violation_response(violation: &DecisionViolation) -> Response {
    let payload = json!({
        "error": violation.to_string(),
        "itemId": violation.item_id(),
    });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}

fn error_response(err: AdjudicationError) -> Response {
    if let AdjudicationError::Invalid(violation) = &err {
        return violation_response(violation);
    }
    let payload = match &err {
        AdjudicationError::Undecided { item_id, .. } => json!({
            "error": err.user_message(),
            "itemId": item_id,
        }),
        _ => json!({ "error": err.user_message() }),
    };
    (workflow_status(&err), Json(payload)).into_response()
}
