use crate::cli::ServeArgs;
use crate::infra::{build_campaign_service, AppState};
use crate::routes::with_campaign_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use lead_qualifier::config::AppConfig;
use lead_qualifier::error::AppError;
use lead_qualifier::telemetry;
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

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

    let shutdown = CancellationToken::new();
    let (service, _repository) =
        build_campaign_service(&config.qualification, args.offline, shutdown.clone())?;

    let app = with_campaign_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "lead qualification service ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown, readiness_flag))
        .await?;
    Ok(())
}

/// Waits for Ctrl-C, then stops scheduling new scoring work and marks the service unready.
async fn shutdown_signal(shutdown: CancellationToken, readiness: Arc<AtomicBool>) {
    shutdown_on(tokio::signal::ctrl_c(), shutdown, readiness).await;
}

/// Without a working signal handler the server keeps running until the process is killed.
async fn shutdown_on<F>(signal: F, shutdown: CancellationToken, readiness: Arc<AtomicBool>)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(err) = signal.await {
        warn!(error = %err, "failed to listen for shutdown signal; graceful shutdown disabled");
        std::future::pending::<()>().await;
    }

    info!("shutdown requested; cancelling in-flight campaigns");
    readiness.store(false, Ordering::Release);
    shutdown.cancel();
}
