//! Submission validation, counter updates, and dense rank assignment.

use std::sync::Arc;

use super::domain::{
    ClientId, ClientProgress, ClientStatus, SubmissionEvent, FINAL_SPRINT, FIRST_SPRINT,
    MAX_QUALITY_SCORE,
};
use super::observer::{RankingEvent, RankingObserver, TracingObserver};
use super::scoring::{CombinedScore, Scorecard};

/// Validation failures for a submission. None of them are retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RankingError {
    #[error("sprint {sprint_number} has already been completed for client {client_id}")]
    DuplicateSprint {
        client_id: ClientId,
        sprint_number: u8,
    },
    #[error("client {client_id} is not part of the leaderboard")]
    UnknownClient { client_id: ClientId },
    #[error("{field} must be between {min} and {max} (got {value})")]
    InvalidRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

/// Population produced by an engine pass, with the events that describe it.
///
/// Nothing has been reported yet; [`RankingEngine::commit`] publishes the events once the
/// caller has kept the population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedRanking {
    pub population: Vec<ClientProgress>,
    pub events: Vec<RankingEvent>,
}

/// Applies submissions to a population and keeps ranks dense across it.
///
/// The engine never mutates the population it is handed; every operation returns a new
/// vector, so a rejected submission leaves the caller's copy exactly as it was.
pub struct RankingEngine<O = TracingObserver> {
    observer: Arc<O>,
}

impl Default for RankingEngine<TracingObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl RankingEngine<TracingObserver> {
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }
}

impl<O> RankingEngine<O>
where
    O: RankingObserver,
{
    pub fn with_observer(observer: Arc<O>) -> Self {
        Self { observer }
    }

    /// Record one graded sprint for its client, then re-rank the whole population.
    pub fn apply_submission(
        &self,
        population: &[ClientProgress],
        event: &SubmissionEvent,
    ) -> Result<Vec<ClientProgress>, RankingError> {
        let staged = self.stage_submission(population, event)?;
        Ok(self.commit(staged))
    }

    /// Re-derive every client's rank from current scores.
    pub fn recompute_ranks(&self, population: Vec<ClientProgress>) -> Vec<ClientProgress> {
        self.commit(stage_recompute(population))
    }

    /// Like [`apply_submission`](Self::apply_submission) but holds the success events
    /// back. A rejection is final and is reported immediately.
    pub fn stage_submission(
        &self,
        population: &[ClientProgress],
        event: &SubmissionEvent,
    ) -> Result<StagedRanking, RankingError> {
        let index = match validate_submission(population, event) {
            Ok(index) => index,
            Err(err) => {
                self.observer.record(&RankingEvent::SubmissionRejected {
                    client_id: event.client_id.clone(),
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };

        let mut updated = population.to_vec();
        let client = &mut updated[index];
        let on_time = record_submission(client, event);
        let mut events = vec![RankingEvent::SubmissionApplied {
            client_id: client.id.clone(),
            sprint_number: event.sprint_number,
            quality_score: event.quality_score,
            on_time,
        }];
        if let (FINAL_SPRINT, Some(graduation_date)) = (event.sprint_number, client.graduation_date)
        {
            events.push(RankingEvent::ClientGraduated {
                client_id: client.id.clone(),
                graduation_date,
            });
        }

        let mut staged = stage_recompute(updated);
        events.append(&mut staged.events);
        staged.events = events;
        Ok(staged)
    }

    /// Publish a staged pass and hand back its population.
    pub fn commit(&self, staged: StagedRanking) -> Vec<ClientProgress> {
        for event in &staged.events {
            self.observer.record(event);
        }
        staged.population
    }
}

/// Dense re-rank of `population` with its `RanksRecomputed` event, unpublished.
pub fn stage_recompute(population: Vec<ClientProgress>) -> StagedRanking {
    let ranked = recompute_ranks(population);
    let moved = ranked
        .iter()
        .filter(|client| client.previous_rank != client.rank)
        .count();
    StagedRanking {
        events: vec![RankingEvent::RanksRecomputed {
            population: ranked.len(),
            moved,
        }],
        population: ranked,
    }
}

/// Check a submission against the population, returning the index of its client.
pub fn validate_submission(
    population: &[ClientProgress],
    event: &SubmissionEvent,
) -> Result<usize, RankingError> {
    if !(FIRST_SPRINT..=FINAL_SPRINT).contains(&event.sprint_number) {
        return Err(RankingError::InvalidRange {
            field: "sprint number",
            value: u32::from(event.sprint_number),
            min: u32::from(FIRST_SPRINT),
            max: u32::from(FINAL_SPRINT),
        });
    }
    if event.quality_score > MAX_QUALITY_SCORE {
        return Err(RankingError::InvalidRange {
            field: "quality score",
            value: u32::from(event.quality_score),
            min: 0,
            max: u32::from(MAX_QUALITY_SCORE),
        });
    }

    let index = population
        .iter()
        .position(|client| client.id == event.client_id)
        .ok_or_else(|| RankingError::UnknownClient {
            client_id: event.client_id.clone(),
        })?;

    if population[index].has_completed(event.sprint_number) {
        return Err(RankingError::DuplicateSprint {
            client_id: event.client_id.clone(),
            sprint_number: event.sprint_number,
        });
    }

    Ok(index)
}

/// Fold a validated submission into the client's counters. Returns whether it was on time.
pub fn record_submission(client: &mut ClientProgress, event: &SubmissionEvent) -> bool {
    let on_time = event.is_on_time();
    client.on_time_total += 1;
    if on_time {
        client.on_time_completed += 1;
    }
    client.quality_scores.push(event.quality_score);
    client.completed_sprints.insert(event.sprint_number);

    if event.sprint_number == FINAL_SPRINT {
        client.status = ClientStatus::Graduated;
        client.graduation_date = Some(event.submitted_at.date_naive());
    }

    on_time
}

/// Dense ranks by combined score, highest first.
///
/// Equal scores keep their previous relative standing (unranked clients after ranked
/// ones); anything still tied keeps input order. Records come back in input order with
/// `previous_rank` holding the rank they had before this pass.
pub fn recompute_ranks(mut population: Vec<ClientProgress>) -> Vec<ClientProgress> {
    for (position, index) in ranking_order(&population).into_iter().enumerate() {
        let client = &mut population[index];
        client.previous_rank = client.rank;
        client.rank = Some(position as u32 + 1);
    }
    population
}

/// Indices of `population` in leaderboard order.
pub fn ranking_order(population: &[ClientProgress]) -> Vec<usize> {
    let scores: Vec<CombinedScore> = population
        .iter()
        .map(|client| Scorecard::for_client(client).combined_score)
        .collect();

    let mut order: Vec<usize> = (0..population.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b].cmp(&scores[a]).then_with(|| {
            standing(population[a].rank).cmp(&standing(population[b].rank))
        })
    });
    order
}

fn standing(rank: Option<u32>) -> u32 {
    rank.unwrap_or(u32::MAX)
}
