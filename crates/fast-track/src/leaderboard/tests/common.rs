use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::leaderboard::domain::{AssociateId, ClientId, ClientProgress, SubmissionEvent};
use crate::leaderboard::memory::InMemoryPopulationStore;
use crate::leaderboard::observer::{RankingEvent, RankingObserver};
use crate::leaderboard::ranking::RankingEngine;
use crate::leaderboard::repository::{
    PopulationScope, PopulationSnapshot, PopulationStore, StoreError,
};
use crate::leaderboard::service::LeaderboardService;

pub(super) fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid start date")
}

pub(super) fn deadline() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 17, 0, 0)
        .single()
        .expect("valid deadline")
}

/// Client with `completed` of `total` deliveries on time and one quality score per sprint.
pub(super) fn client(
    id: &str,
    on_time: (u32, u32),
    scores: &[u8],
    rank: Option<u32>,
) -> ClientProgress {
    let mut client = ClientProgress::enroll(
        ClientId(id.to_string()),
        id.to_uppercase(),
        AssociateId("guru-1".to_string()),
        start_date(),
    );
    client.on_time_completed = on_time.0;
    client.on_time_total = on_time.1;
    client.quality_scores = scores.to_vec();
    client.completed_sprints = (1..=scores.len() as u8).collect();
    client.rank = rank;
    client
}

pub(super) fn submission(id: &str, sprint_number: u8, quality_score: u8) -> SubmissionEvent {
    SubmissionEvent {
        client_id: ClientId(id.to_string()),
        sprint_number,
        quality_score,
        deadline: deadline(),
        submitted_at: deadline() - Duration::hours(2),
        on_time_override: None,
    }
}

pub(super) fn late_submission(id: &str, sprint_number: u8, quality_score: u8) -> SubmissionEvent {
    SubmissionEvent {
        submitted_at: deadline() + Duration::days(1),
        ..submission(id, sprint_number, quality_score)
    }
}

/// alpha=(100% speed, 80 quality), bravo=(50% speed, 90 quality), charlie is an
/// unranked newcomer handled by a second associate.
pub(super) fn population() -> Vec<ClientProgress> {
    let mut charlie = client("charlie", (0, 0), &[], None);
    charlie.associate_id = AssociateId("guru-2".to_string());
    vec![
        client("alpha", (2, 2), &[80, 80], Some(2)),
        client("bravo", (1, 2), &[90, 90], Some(1)),
        charlie,
    ]
}

#[derive(Default)]
pub(super) struct RecordingObserver {
    events: Mutex<Vec<RankingEvent>>,
}

impl RankingObserver for RecordingObserver {
    fn record(&self, event: &RankingEvent) {
        self.events
            .lock()
            .expect("observer mutex poisoned")
            .push(event.clone());
    }
}

impl RecordingObserver {
    pub(super) fn events(&self) -> Vec<RankingEvent> {
        self.events.lock().expect("observer mutex poisoned").clone()
    }
}

pub(super) fn engine() -> (RankingEngine<RecordingObserver>, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    (RankingEngine::with_observer(observer.clone()), observer)
}

pub(super) fn build_service() -> (
    LeaderboardService<InMemoryPopulationStore, RecordingObserver>,
    InMemoryPopulationStore,
    Arc<RecordingObserver>,
) {
    let store = InMemoryPopulationStore::seeded(population());
    let (engine, observer) = engine();
    let service = LeaderboardService::with_engine(Arc::new(store.clone()), engine, 3);
    (service, store, observer)
}

/// Store whose population is always rewritten by "someone else" between read and write.
pub(super) struct ContendedStore {
    pub(super) inner: InMemoryPopulationStore,
}

impl PopulationStore for ContendedStore {
    fn fetch_population(&self, scope: &PopulationScope) -> Result<PopulationSnapshot, StoreError> {
        let snapshot = self.inner.fetch_population(scope)?;
        self.inner
            .write_back(snapshot.version, Vec::new())
            .expect("interfering write succeeds");
        Ok(snapshot)
    }

    fn fetch_one(&self, id: &ClientId) -> Result<Option<ClientProgress>, StoreError> {
        self.inner.fetch_one(id)
    }

    fn write_back(
        &self,
        expected_version: u64,
        clients: Vec<ClientProgress>,
    ) -> Result<u64, StoreError> {
        self.inner.write_back(expected_version, clients)
    }
}

pub(super) struct UnavailableStore;

impl PopulationStore for UnavailableStore {
    fn fetch_population(&self, _scope: &PopulationScope) -> Result<PopulationSnapshot, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch_one(&self, _id: &ClientId) -> Result<Option<ClientProgress>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn write_back(
        &self,
        _expected_version: u64,
        _clients: Vec<ClientProgress>,
    ) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn ranks(population: &[ClientProgress]) -> Vec<(String, Option<u32>)> {
    population
        .iter()
        .map(|client| (client.id.0.clone(), client.rank))
        .collect()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
