use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryApplicationRepository, InMemoryDiagnosisRepository,
    InMemoryMembershipDirectory, InMemoryNotificationPublisher,
};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use emplois::config::AppConfig;
use emplois::error::AppError;
use emplois::telemetry;
use emplois::workflows::apply::JobApplicationService;
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

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let diagnoses = Arc::new(InMemoryDiagnosisRepository::default());
    let directory = Arc::new(InMemoryMembershipDirectory::default());
    directory.seed_from_env();
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let application_service = Arc::new(JobApplicationService::new(
        repository,
        diagnoses,
        directory,
        notifications,
        config.workflow,
    ));

    let app = with_application_routes(application_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "job-application workflow service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
