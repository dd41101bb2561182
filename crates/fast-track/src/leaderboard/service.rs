use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LeaderboardConfig;

use super::domain::{ClientId, ClientProgress, NewClient, SubmissionEvent};
use super::observer::{RankingObserver, TracingObserver};
use super::ranking::{
    recompute_ranks, record_submission, stage_recompute, validate_submission, RankingEngine,
    RankingError, StagedRanking,
};
use super::repository::{PopulationScope, PopulationStore, StoreError};
use super::scoring::Scorecard;
use super::status::determine_status;
use super::summary::{leaderboard_view, LeaderboardEntry, PortfolioSummary, SubmissionPreview};

/// Associate-supplied schedule facts used to refresh a client's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleUpdate {
    pub current_deadline: DateTime<Utc>,
    #[serde(default)]
    pub paused: bool,
}

/// Service composing the population store and the ranking engine.
///
/// Every write runs the full read-modify-write cycle under one gate and writes back
/// with the version it read, so two submissions can never interleave their rank passes.
/// A version conflict from a writer outside this process restarts the cycle. Engine
/// events reach the observer only after a successful write-back.
pub struct LeaderboardService<S, O = TracingObserver> {
    store: Arc<S>,
    engine: RankingEngine<O>,
    write_gate: Mutex<()>,
    max_write_attempts: u32,
}

impl<S> LeaderboardService<S, TracingObserver>
where
    S: PopulationStore + 'static,
{
    pub fn new(store: Arc<S>, config: &LeaderboardConfig) -> Self {
        Self::with_engine(store, RankingEngine::new(), config.max_write_attempts)
    }
}

impl<S, O> LeaderboardService<S, O>
where
    S: PopulationStore + 'static,
    O: RankingObserver + 'static,
{
    pub fn with_engine(store: Arc<S>, engine: RankingEngine<O>, max_write_attempts: u32) -> Self {
        Self {
            store,
            engine,
            write_gate: Mutex::new(()),
            max_write_attempts: max_write_attempts.max(1),
        }
    }

    /// Ranked rows for the scope. Ranks are always global; the scope only filters.
    pub fn leaderboard(
        &self,
        scope: &PopulationScope,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardServiceError> {
        let snapshot = self.store.fetch_population(scope)?;
        Ok(leaderboard_view(&snapshot.clients))
    }

    pub fn client(&self, id: &ClientId) -> Result<LeaderboardEntry, LeaderboardServiceError> {
        let client = self.store.fetch_one(id)?.ok_or(StoreError::NotFound)?;
        Ok(LeaderboardEntry::from_client(&client))
    }

    pub fn summary(
        &self,
        scope: &PopulationScope,
    ) -> Result<PortfolioSummary, LeaderboardServiceError> {
        let snapshot = self.store.fetch_population(scope)?;
        Ok(PortfolioSummary::from_clients(&snapshot.clients))
    }

    /// Project a submission without recording it.
    pub fn preview(
        &self,
        event: &SubmissionEvent,
    ) -> Result<SubmissionPreview, LeaderboardServiceError> {
        let snapshot = self.store.fetch_population(&PopulationScope::All)?;
        let index = validate_submission(&snapshot.clients, event)?;
        let current_rank = snapshot.clients[index].rank;

        let mut projected = snapshot.clients;
        let on_time = record_submission(&mut projected[index], event);
        let projected = recompute_ranks(projected);
        let client = &projected[index];
        let card = Scorecard::for_client(client);

        Ok(SubmissionPreview {
            client_id: client.id.clone(),
            on_time,
            speed_score: card.speed_score,
            quality_average: card.quality_average,
            quality_trend: card.quality_trend,
            combined_score: card.combined_score.value(),
            current_rank,
            predicted_rank: client.rank.unwrap_or(1),
            graduates: client.is_graduated(),
        })
    }

    /// Record a graded sprint and re-rank everyone.
    pub fn submit(
        &self,
        event: &SubmissionEvent,
    ) -> Result<LeaderboardEntry, LeaderboardServiceError> {
        let population =
            self.write_cycle(|clients| Ok(self.engine.stage_submission(clients, event)?))?;
        entry_for(&population, &event.client_id)
    }

    /// Enroll a client and give it a first rank.
    pub fn enroll(
        &self,
        new_client: NewClient,
    ) -> Result<LeaderboardEntry, LeaderboardServiceError> {
        if new_client.id.0.trim().is_empty() {
            return Err(LeaderboardServiceError::InvalidEnrollment("client id is required"));
        }
        if new_client.name.trim().is_empty() {
            return Err(LeaderboardServiceError::InvalidEnrollment("client name is required"));
        }

        let population = self.write_cycle(|clients| {
            if clients.iter().any(|client| client.id == new_client.id) {
                return Err(StoreError::Conflict.into());
            }
            let mut all = clients.to_vec();
            all.push(ClientProgress::enroll(
                new_client.id.clone(),
                new_client.name.trim(),
                new_client.associate_id.clone(),
                new_client.start_date,
            ));
            Ok(stage_recompute(all))
        })?;
        entry_for(&population, &new_client.id)
    }

    /// Re-rank the stored population without any new submission.
    pub fn recompute(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardServiceError> {
        let population = self.write_cycle(|clients| Ok(stage_recompute(clients.to_vec())))?;
        Ok(leaderboard_view(&population))
    }

    /// Refresh a client's status from its current deadline and pause flag.
    pub fn update_schedule(
        &self,
        id: &ClientId,
        update: &ScheduleUpdate,
        now: DateTime<Utc>,
    ) -> Result<LeaderboardEntry, LeaderboardServiceError> {
        let population = self.write_cycle(|clients| {
            let mut all = clients.to_vec();
            let client = all
                .iter_mut()
                .find(|client| &client.id == id)
                .ok_or(StoreError::NotFound)?;
            let status = determine_status(client, update.current_deadline, update.paused, now);
            client.status = status;
            Ok(StagedRanking {
                population: all,
                events: Vec::new(),
            })
        })?;
        entry_for(&population, id)
    }

    fn write_cycle<F>(&self, mut mutate: F) -> Result<Vec<ClientProgress>, LeaderboardServiceError>
    where
        F: FnMut(&[ClientProgress]) -> Result<StagedRanking, LeaderboardServiceError>,
    {
        let _gate = self
            .write_gate
            .lock()
            .map_err(|_| StoreError::Unavailable("write gate poisoned".to_string()))?;

        for attempt in 1..=self.max_write_attempts {
            let snapshot = self.store.fetch_population(&PopulationScope::All)?;
            let staged = mutate(&snapshot.clients)?;
            match self
                .store
                .write_back(snapshot.version, staged.population.clone())
            {
                Ok(version) => {
                    debug!(version, attempt, "population written back");
                    // observer only hears about populations that were stored
                    return Ok(self.engine.commit(staged));
                }
                Err(StoreError::VersionConflict { expected, actual }) => {
                    warn!(expected, actual, attempt, "population changed during write");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(LeaderboardServiceError::WriteContention {
            attempts: self.max_write_attempts,
        })
    }
}

fn entry_for(
    population: &[ClientProgress],
    id: &ClientId,
) -> Result<LeaderboardEntry, LeaderboardServiceError> {
    population
        .iter()
        .find(|client| &client.id == id)
        .map(LeaderboardEntry::from_client)
        .ok_or_else(|| StoreError::NotFound.into())
}

/// Error raised by the leaderboard service.
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardServiceError {
    #[error(transparent)]
    Ranking(#[from] RankingError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid enrollment: {0}")]
    InvalidEnrollment(&'static str),
    #[error("population kept changing; gave up after {attempts} write attempts")]
    WriteContention { attempts: u32 },
}
