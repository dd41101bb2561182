use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{ClientProgress, ClientStatus};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Coarse colour family used when rendering a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Positive,
    Negative,
    Neutral,
}

impl ClientStatus {
    pub fn tone(&self) -> StatusTone {
        match self {
            ClientStatus::OnTime | ClientStatus::Graduated => StatusTone::Positive,
            ClientStatus::Delayed => StatusTone::Negative,
            ClientStatus::ProgressMeeting | ClientStatus::StartingSoon => StatusTone::Neutral,
        }
    }
}

/// Movement between two rank assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankChange {
    Up,
    Down,
    Same,
    New,
}

impl RankChange {
    /// A missing previous rank means the client has never been ranked before.
    pub fn between(current: Option<u32>, previous: Option<u32>) -> Self {
        match (current, previous) {
            (Some(current), Some(previous)) if current < previous => RankChange::Up,
            (Some(current), Some(previous)) if current > previous => RankChange::Down,
            (Some(_), Some(_)) => RankChange::Same,
            _ => RankChange::New,
        }
    }
}

/// Whole days between `reference` and `deadline`, rounded up.
///
/// Positive means the reference point is ahead of the deadline, negative means behind.
pub fn days_ahead_behind(deadline: DateTime<Utc>, reference: DateTime<Utc>) -> i64 {
    let millis = (deadline - reference).num_milliseconds();
    let whole = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) > 0 {
        whole + 1
    } else {
        whole
    }
}

/// Status implied by a client's progress against its current sprint deadline.
pub fn determine_status(
    client: &ClientProgress,
    current_deadline: DateTime<Utc>,
    paused: bool,
    now: DateTime<Utc>,
) -> ClientStatus {
    if client.is_graduated() {
        return ClientStatus::Graduated;
    }
    if paused {
        return ClientStatus::ProgressMeeting;
    }
    if client.completed_sprints.is_empty() {
        return ClientStatus::StartingSoon;
    }
    if days_ahead_behind(current_deadline, now) < 0 {
        return ClientStatus::Delayed;
    }
    ClientStatus::OnTime
}
