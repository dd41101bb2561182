//! Leaderboard scoring, ranking, and the service that keeps a population ranked.
//!
//! Scoring is pure and total; ranking takes a population snapshot and returns a new one
//! with dense ranks; the service wraps both in a serialized, versioned write cycle over a
//! [`PopulationStore`].

pub mod domain;
pub mod memory;
pub mod observer;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod status;
pub mod summary;

#[cfg(test)]
mod tests;

pub use domain::{
    AssociateId, ClientId, ClientProgress, ClientStatus, NewClient, SubmissionEvent,
    FINAL_SPRINT, FIRST_SPRINT, MAX_QUALITY_SCORE,
};
pub use memory::InMemoryPopulationStore;
pub use observer::{RankingEvent, RankingObserver, TracingObserver};
pub use ranking::{recompute_ranks, RankingEngine, RankingError, StagedRanking};
pub use repository::{PopulationScope, PopulationSnapshot, PopulationStore, StoreError};
pub use router::leaderboard_router;
pub use scoring::{
    combined_score, quality_average, quality_trend, speed_score, CombinedScore, QualityTrend,
    Scorecard, QUALITY_WEIGHT_PCT, SPEED_WEIGHT_PCT,
};
pub use service::{LeaderboardService, LeaderboardServiceError, ScheduleUpdate};
pub use status::{days_ahead_behind, determine_status, RankChange, StatusTone};
pub use summary::{LeaderboardEntry, PortfolioSummary, SubmissionPreview};
