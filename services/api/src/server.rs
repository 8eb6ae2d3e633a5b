use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryCertificateRepository, InMemoryEnrollmentRepository};
use crate::routes::with_certificate_routes;
use asecapt::certificates::CertificateService;
use asecapt::config::AppConfig;
use asecapt::error::AppError;
use asecapt::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    let service = Arc::new(CertificateService::new(
        Arc::new(InMemoryEnrollmentRepository::default()),
        Arc::new(InMemoryCertificateRepository::default()),
        config.certificates,
    ));

    let app = with_certificate_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        validity_days = ?config.certificates.validity_days,
        "certificate service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
