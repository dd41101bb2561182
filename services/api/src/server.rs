use crate::cli::ServeArgs;
use crate::infra::{population_store, AppState};
use crate::routes::with_leaderboard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use fast_track::config::AppConfig;
use fast_track::error::AppError;
use fast_track::leaderboard::LeaderboardService;
use fast_track::telemetry;
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
    if let Some(roster) = args.roster.take() {
        config.leaderboard.roster_path = Some(roster);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = population_store(config.leaderboard.roster_path.as_deref())?;
    let service = Arc::new(LeaderboardService::new(Arc::new(store), &config.leaderboard));
    // Seeded ranks may be stale or missing until the first pass.
    let ranked = service.recompute()?;
    info!(clients = ranked.len(), "initial leaderboard ranked");

    let app = with_leaderboard_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "fast track leaderboard ready");

    axum::serve(listener, app).await?;
    Ok(())
}
