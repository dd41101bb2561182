use chrono::NaiveDate;
use fast_track::error::AppError;
use fast_track::leaderboard::InMemoryPopulationStore;
use fast_track::roster::RosterImporter;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Build the process-local store, seeded from a roster when one is configured.
pub(crate) fn population_store(roster: Option<&Path>) -> Result<InMemoryPopulationStore, AppError> {
    let Some(path) = roster else {
        return Ok(InMemoryPopulationStore::default());
    };

    let clients = RosterImporter::from_path(path)?;
    info!(path = %path.display(), clients = clients.len(), "roster imported");
    Ok(InMemoryPopulationStore::seeded(clients))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
