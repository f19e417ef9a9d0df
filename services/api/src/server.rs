use crate::cli::ServeArgs;
use crate::infra::{demo_stock, AppState};
use crate::routes::with_return_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use stock_rma::config::AppConfig;
use stock_rma::error::AppError;
use stock_rma::telemetry;
use stock_rma::workflows::returns::StockReturnService;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let stock = Arc::new(demo_stock()?);
    let return_service = Arc::new(StockReturnService::new(stock, config.returns));

    let app = with_return_routes(return_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        create_rma_by_default = config.returns.create_rma_by_default,
        "stock return service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
