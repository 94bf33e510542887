use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryAnalysisRepository, InMemoryBlobStore, StructuredTextOracle,
};
use crate::routes::with_feasibility_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use deal_flow::config::AppConfig;
use deal_flow::error::AppError;
use deal_flow::telemetry;
use deal_flow::workflows::analysis::AnalysisService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let analysis_service = Arc::new(AnalysisService::new(
        Arc::new(InMemoryAnalysisRepository::default()),
        Arc::new(InMemoryBlobStore::default()),
        Arc::new(StructuredTextOracle),
        config.feasibility.assumptions.clone(),
    ));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        calculator: Arc::new(analysis_service.calculator().clone()),
        target_roi: config.feasibility.target_roi,
    };

    let app = with_feasibility_routes(analysis_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        target_roi = config.feasibility.target_roi,
        "deal flow service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
