use crate::cli::ServeArgs;
use crate::infra::{seed_demo_data, AppState, Platform};
use crate::routes::application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use maison::config::AppConfig;
use maison::error::AppError;
use maison::integrations::Integrations;
use maison::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let integrations =
        Integrations::from_config(&config.integrations, &config.marketplace.source_base_url)?;
    let platform = Platform::build(&config, &integrations)?;
    seed_demo_data(&platform.store)?;

    let app = application_routes(&platform)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        integrations = ?integrations.mode,
        %addr,
        "maison platform ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
