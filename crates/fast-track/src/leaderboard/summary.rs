use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{AssociateId, ClientId, ClientProgress, ClientStatus};
use super::scoring::{quality_average, QualityTrend, Scorecard};
use super::status::{RankChange, StatusTone};

/// One leaderboard row as served to the display layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub client_id: ClientId,
    pub name: String,
    pub associate_id: AssociateId,
    pub status: ClientStatus,
    pub status_label: &'static str,
    pub status_tone: StatusTone,
    pub rank: Option<u32>,
    pub previous_rank: Option<u32>,
    pub rank_change: RankChange,
    pub speed_score: u8,
    pub quality_average: u8,
    pub quality_trend: QualityTrend,
    pub combined_score: f64,
    pub sprints_completed: usize,
    pub on_time_completed: u32,
    pub on_time_total: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_date: Option<NaiveDate>,
}

impl LeaderboardEntry {
    pub fn from_client(client: &ClientProgress) -> Self {
        let card = Scorecard::for_client(client);
        Self {
            client_id: client.id.clone(),
            name: client.name.clone(),
            associate_id: client.associate_id.clone(),
            status: client.status,
            status_label: client.status.label(),
            status_tone: client.status.tone(),
            rank: client.rank,
            previous_rank: client.previous_rank,
            rank_change: RankChange::between(client.rank, client.previous_rank),
            speed_score: card.speed_score,
            quality_average: card.quality_average,
            quality_trend: card.quality_trend,
            combined_score: card.combined_score.value(),
            sprints_completed: client.completed_sprints.len(),
            on_time_completed: client.on_time_completed,
            on_time_total: client.on_time_total,
            graduation_date: client.graduation_date,
        }
    }
}

/// Rows ordered by rank; unranked clients trail, alphabetically.
pub fn leaderboard_view(clients: &[ClientProgress]) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> =
        clients.iter().map(LeaderboardEntry::from_client).collect();
    entries.sort_by(|a, b| {
        a.rank
            .unwrap_or(u32::MAX)
            .cmp(&b.rank.unwrap_or(u32::MAX))
            .then_with(|| a.name.cmp(&b.name))
    });
    entries
}

/// Portfolio counts shown on the associate dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioSummary {
    pub total_clients: usize,
    pub on_time: usize,
    pub delayed: usize,
    pub graduated: usize,
    pub progress_meeting: usize,
    pub starting_soon: usize,
    /// Mean over every recorded sprint score, not a mean of client averages.
    pub average_quality: u8,
}

impl PortfolioSummary {
    pub fn from_clients(clients: &[ClientProgress]) -> Self {
        let count = |status: ClientStatus| {
            clients
                .iter()
                .filter(|client| client.status == status)
                .count()
        };
        let all_scores: Vec<u8> = clients
            .iter()
            .flat_map(|client| client.quality_scores.iter().copied())
            .collect();

        Self {
            total_clients: clients.len(),
            on_time: count(ClientStatus::OnTime),
            delayed: count(ClientStatus::Delayed),
            graduated: count(ClientStatus::Graduated),
            progress_meeting: count(ClientStatus::ProgressMeeting),
            starting_soon: count(ClientStatus::StartingSoon),
            average_quality: quality_average(&all_scores),
        }
    }
}

/// Projected metrics for a submission that has not been recorded yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPreview {
    pub client_id: ClientId,
    pub on_time: bool,
    pub speed_score: u8,
    pub quality_average: u8,
    pub quality_trend: QualityTrend,
    pub combined_score: f64,
    pub current_rank: Option<u32>,
    pub predicted_rank: u32,
    pub graduates: bool,
}
