use chrono::NaiveDate;
use tracing::{info, warn};

use super::domain::ClientId;

/// Notable transitions emitted by the ranking engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankingEvent {
    SubmissionApplied {
        client_id: ClientId,
        sprint_number: u8,
        quality_score: u8,
        on_time: bool,
    },
    SubmissionRejected {
        client_id: ClientId,
        reason: String,
    },
    ClientGraduated {
        client_id: ClientId,
        graduation_date: NaiveDate,
    },
    RanksRecomputed {
        population: usize,
        moved: usize,
    },
}

/// Sink for engine events so callers choose where they go (logs, metrics, test buffers).
pub trait RankingObserver: Send + Sync {
    fn record(&self, event: &RankingEvent);
}

/// Forwards every event to `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RankingObserver for TracingObserver {
    fn record(&self, event: &RankingEvent) {
        match event {
            RankingEvent::SubmissionApplied {
                client_id,
                sprint_number,
                quality_score,
                on_time,
            } => info!(
                %client_id,
                sprint_number,
                quality_score,
                on_time,
                "sprint submission applied"
            ),
            RankingEvent::SubmissionRejected { client_id, reason } => {
                warn!(%client_id, %reason, "sprint submission rejected")
            }
            RankingEvent::ClientGraduated {
                client_id,
                graduation_date,
            } => info!(%client_id, %graduation_date, "client graduated"),
            RankingEvent::RanksRecomputed { population, moved } => {
                info!(population, moved, "leaderboard ranks recomputed")
            }
        }
    }
}
