use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// First sprint of the program.
pub const FIRST_SPRINT: u8 = 1;
/// Final sprint; recording it graduates the client.
pub const FINAL_SPRINT: u8 = 30;
/// Upper bound of a per-sprint quality score.
pub const MAX_QUALITY_SCORE: u8 = 100;

/// Identifier wrapper for enrolled clients.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for the associate who manages a client.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssociateId(pub String);

impl fmt::Display for AssociateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Program state shown next to each client on the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientStatus {
    OnTime,
    Delayed,
    Graduated,
    ProgressMeeting,
    StartingSoon,
}

impl ClientStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ClientStatus::OnTime => "On time",
            ClientStatus::Delayed => "Delayed",
            ClientStatus::Graduated => "Graduated",
            ClientStatus::ProgressMeeting => "Progress meeting",
            ClientStatus::StartingSoon => "Starting soon",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ON_TIME" => Some(Self::OnTime),
            "DELAYED" => Some(Self::Delayed),
            "GRADUATED" => Some(Self::Graduated),
            "PROGRESS_MEETING" => Some(Self::ProgressMeeting),
            "STARTING_SOON" => Some(Self::StartingSoon),
            _ => None,
        }
    }
}

/// Cumulative progress for one client; the unit the ranking engine operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProgress {
    pub id: ClientId,
    pub name: String,
    pub associate_id: AssociateId,
    pub start_date: NaiveDate,
    pub on_time_completed: u32,
    pub on_time_total: u32,
    pub quality_scores: Vec<u8>,
    pub completed_sprints: BTreeSet<u8>,
    pub status: ClientStatus,
    /// `None` until the client has been through a rank recompute.
    pub rank: Option<u32>,
    pub previous_rank: Option<u32>,
    pub graduation_date: Option<NaiveDate>,
}

impl ClientProgress {
    /// Fresh enrollment: no submissions, unranked, starting soon.
    pub fn enroll(
        id: ClientId,
        name: impl Into<String>,
        associate_id: AssociateId,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            associate_id,
            start_date,
            on_time_completed: 0,
            on_time_total: 0,
            quality_scores: Vec::new(),
            completed_sprints: BTreeSet::new(),
            status: ClientStatus::StartingSoon,
            rank: None,
            previous_rank: None,
            graduation_date: None,
        }
    }

    pub fn has_completed(&self, sprint_number: u8) -> bool {
        self.completed_sprints.contains(&sprint_number)
    }

    pub fn is_graduated(&self) -> bool {
        self.status == ClientStatus::Graduated
    }

    /// Next sprint the client is expected to deliver, if any remain.
    pub fn next_sprint(&self) -> Option<u8> {
        (FIRST_SPRINT..=FINAL_SPRINT).find(|sprint| !self.completed_sprints.contains(sprint))
    }
}

/// A graded sprint delivery handed to the ranking engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionEvent {
    pub client_id: ClientId,
    pub sprint_number: u8,
    pub quality_score: u8,
    pub deadline: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    /// Manual on-time decision entered by the associate; wins over the timestamps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_time_override: Option<bool>,
}

impl SubmissionEvent {
    /// Deliveries exactly at the deadline count as on time.
    pub fn is_on_time(&self) -> bool {
        self.on_time_override
            .unwrap_or(self.submitted_at <= self.deadline)
    }
}

/// Data required to enroll a new client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub id: ClientId,
    pub name: String,
    pub associate_id: AssociateId,
    pub start_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(deadline_hour: u32, submitted_hour: u32, override_flag: Option<bool>) -> SubmissionEvent {
        SubmissionEvent {
            client_id: ClientId("acme".to_string()),
            sprint_number: 4,
            quality_score: 80,
            deadline: Utc
                .with_ymd_and_hms(2025, 3, 14, deadline_hour, 0, 0)
                .single()
                .expect("valid deadline"),
            submitted_at: Utc
                .with_ymd_and_hms(2025, 3, 14, submitted_hour, 0, 0)
                .single()
                .expect("valid submission"),
            on_time_override: override_flag,
        }
    }

    #[test]
    fn submission_at_deadline_is_on_time() {
        assert!(event(17, 17, None).is_on_time());
        assert!(event(17, 9, None).is_on_time());
        assert!(!event(17, 18, None).is_on_time());
    }

    #[test]
    fn manual_override_takes_precedence() {
        assert!(event(17, 23, Some(true)).is_on_time());
        assert!(!event(17, 9, Some(false)).is_on_time());
    }

    #[test]
    fn status_round_trips_through_wire_names() {
        let encoded = serde_json::to_string(&ClientStatus::ProgressMeeting).expect("encodes");
        assert_eq!(encoded, "\"PROGRESS_MEETING\"");
        assert_eq!(
            ClientStatus::parse("progress_meeting"),
            Some(ClientStatus::ProgressMeeting)
        );
        assert_eq!(ClientStatus::parse("paused"), None);
    }

    #[test]
    fn next_sprint_skips_completed_ones() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid date");
        let mut client = ClientProgress::enroll(
            ClientId("acme".to_string()),
            "Acme",
            AssociateId("guru-1".to_string()),
            start,
        );
        assert_eq!(client.next_sprint(), Some(1));
        client.completed_sprints.extend([1, 2, 4]);
        assert_eq!(client.next_sprint(), Some(3));
        client.completed_sprints.extend(FIRST_SPRINT..=FINAL_SPRINT);
        assert_eq!(client.next_sprint(), None);
    }
}
