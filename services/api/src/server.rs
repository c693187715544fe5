use crate::cli::ServeArgs;
use crate::infra::{
    sample_addresses, sample_request, AppState, InMemoryAddressDirectory,
    InMemoryWarrantyGateway, ZoneRateTable,
};
use crate::routes::with_warranty_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use warranty_desk::config::AppConfig;
use warranty_desk::error::AppError;
use warranty_desk::telemetry;
use warranty_desk::workflows::warranty::{RequestType, WarrantyAdjudicationService};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let gateway = Arc::new(InMemoryWarrantyGateway::seeded(vec![
        sample_request("wr-1001", RequestType::Fee),
        sample_request("wr-1002", RequestType::Free),
    ]));
    let addresses = Arc::new(InMemoryAddressDirectory::seeded(sample_addresses()));
    let rates = Arc::new(ZoneRateTable::default());
    let service = Arc::new(WarrantyAdjudicationService::new(
        gateway,
        addresses,
        rates,
        config.warranty.clone(),
    ));

    let app = with_warranty_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        declared_weight_grams = config.warranty.declared_weight_grams,
        "warranty adjudication service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
