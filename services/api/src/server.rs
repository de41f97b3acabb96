use crate::cli::ServeArgs;
use crate::infra::{default_scoring_config, AppState, FileSessionStore};
use crate::routes::with_debrief_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use empathy_coach::config::AppConfig;
use empathy_coach::error::AppError;
use empathy_coach::telemetry;
use empathy_coach::training::debrief::{DebriefService, DialogueBlueprint, ScoringMode};
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

    telemetry::init(&config)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(FileSessionStore::new(&config.session.storage_dir)?);
    let (script, catalog) = DialogueBlueprint::assessment();
    let debrief_service = Arc::new(DebriefService::new(
        script,
        catalog,
        ScoringMode::Assessment,
        default_scoring_config(),
        store,
    )?);

    if debrief_service.resume() {
        info!("resumed a persisted debrief session");
    }

    let app = with_debrief_routes(debrief_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "empathy coaching service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
