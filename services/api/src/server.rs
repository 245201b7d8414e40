use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryCaseNotifier};
use crate::routes::with_case_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use onboard_ai::config::AppConfig;
use onboard_ai::error::AppError;
use onboard_ai::telemetry;
use onboard_ai::workflows::onboarding::cases::{InMemoryCaseStore, OnboardingCaseService};
use onboard_ai::workflows::onboarding::screening::ChecklistConfig;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryCaseStore::new());
    let notifier = Arc::new(InMemoryCaseNotifier::default());
    let case_service = Arc::new(
        OnboardingCaseService::new(store, notifier, ChecklistConfig::standard())
            .with_poll_interval(config.pipeline.poll_interval),
    );

    let app = with_case_routes(case_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "onboarding case service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
