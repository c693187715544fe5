use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use warranty_desk::workflows::warranty::{warranty_router, WarrantyAdjudicationService};

pub(crate) fn with_warranty_routes(service: Arc<WarrantyAdjudicationService>) -> axum::Router {
    warranty_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        sample_addresses, sample_request, InMemoryAddressDirectory, InMemoryWarrantyGateway,
        ZoneRateTable,
    };
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use warranty_desk::config::WarrantyConfig;
    use warranty_desk::workflows::warranty::RequestType;

    fn service() -> Arc<WarrantyAdjudicationService> {
        Arc::new(WarrantyAdjudicationService::new(
            Arc::new(InMemoryWarrantyGateway::seeded(vec![sample_request(
                "wr-1",
                RequestType::Fee,
            )])),
            Arc::new(InMemoryAddressDirectory::seeded(sample_addresses())),
            Arc::new(ZoneRateTable::default()),
            WarrantyConfig::default(),
        ))
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn warranty_routes_are_mounted_next_to_health() {
        let router = with_warranty_routes(service());

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/warranty/requests/wr-1/adjudication?quote=true")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        let value: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
        assert_eq!(value["decisions"][0]["shippingFee"], 22000.0);
    }
}
