use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{AssociateId, ClientId, NewClient, SubmissionEvent};
use super::observer::RankingObserver;
use super::ranking::RankingError;
use super::repository::{PopulationScope, PopulationStore, StoreError};
use super::service::{LeaderboardService, LeaderboardServiceError, ScheduleUpdate};

/// Optional associate filter accepted by the read endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    #[serde(default)]
    pub associate_id: Option<String>,
}

impl ScopeQuery {
    fn scope(self) -> PopulationScope {
        PopulationScope::for_associate(
            self.associate_id
                .filter(|value| !value.trim().is_empty())
                .map(AssociateId),
        )
    }
}

/// Router builder exposing the leaderboard read, submission, and enrollment endpoints.
pub fn leaderboard_router<S, O>(service: Arc<LeaderboardService<S, O>>) -> Router
where
    S: PopulationStore + 'static,
    O: RankingObserver + 'static,
{
    Router::new()
        .route("/api/v1/leaderboard", get(leaderboard_handler::<S, O>))
        .route("/api/v1/leaderboard/summary", get(summary_handler::<S, O>))
        .route(
            "/api/v1/leaderboard/recompute",
            post(recompute_handler::<S, O>),
        )
        .route("/api/v1/leaderboard/clients", post(enroll_handler::<S, O>))
        .route(
            "/api/v1/leaderboard/clients/:client_id",
            get(client_handler::<S, O>),
        )
        .route(
            "/api/v1/leaderboard/clients/:client_id/schedule",
            post(schedule_handler::<S, O>),
        )
        .route(
            "/api/v1/leaderboard/submissions",
            post(submit_handler::<S, O>),
        )
        .route(
            "/api/v1/leaderboard/submissions/preview",
            post(preview_handler::<S, O>),
        )
        .with_state(service)
}

pub(crate) async fn leaderboard_handler<S, O>(
    State(service): State<Arc<LeaderboardService<S, O>>>,
    Query(query): Query<ScopeQuery>,
) -> Response
where
    S: PopulationStore + 'static,
    O: RankingObserver + 'static,
{
    match service.leaderboard(&query.scope()) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn summary_handler<S, O>(
    State(service): State<Arc<LeaderboardService<S, O>>>,
    Query(query): Query<ScopeQuery>,
) -> Response
where
    S: PopulationStore + 'static,
    O: RankingObserver + 'static,
{
    match service.summary(&query.scope()) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn recompute_handler<S, O>(
    State(service): State<Arc<LeaderboardService<S, O>>>,
) -> Response
where
    S: PopulationStore + 'static,
    O: RankingObserver + 'static,
{
    match service.recompute() {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn client_handler<S, O>(
    State(service): State<Arc<LeaderboardService<S, O>>>,
    Path(client_id): Path<String>,
) -> Response
where
    S: PopulationStore + 'static,
    O: RankingObserver + 'static,
{
    match service.client(&ClientId(client_id)) {
        Ok(entry) => (StatusCode::OK, axum::Json(entry)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn enroll_handler<S, O>(
    State(service): State<Arc<LeaderboardService<S, O>>>,
    payload: Result<axum::Json<NewClient>, JsonRejection>,
) -> Response
where
    S: PopulationStore + 'static,
    O: RankingObserver + 'static,
{
    let axum::Json(new_client) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    match service.enroll(new_client) {
        Ok(entry) => (StatusCode::CREATED, axum::Json(entry)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn schedule_handler<S, O>(
    State(service): State<Arc<LeaderboardService<S, O>>>,
    Path(client_id): Path<String>,
    payload: Result<axum::Json<ScheduleUpdate>, JsonRejection>,
) -> Response
where
    S: PopulationStore + 'static,
    O: RankingObserver + 'static,
{
    let axum::Json(update) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    match service.update_schedule(&ClientId(client_id), &update, Utc::now()) {
        Ok(entry) => (StatusCode::OK, axum::Json(entry)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<S, O>(
    State(service): State<Arc<LeaderboardService<S, O>>>,
    payload: Result<axum::Json<SubmissionEvent>, JsonRejection>,
) -> Response
where
    S: PopulationStore + 'static,
    O: RankingObserver + 'static,
{
    let axum::Json(event) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    match service.submit(&event) {
        Ok(entry) => (StatusCode::OK, axum::Json(entry)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn preview_handler<S, O>(
    State(service): State<Arc<LeaderboardService<S, O>>>,
    payload: Result<axum::Json<SubmissionEvent>, JsonRejection>,
) -> Response
where
    S: PopulationStore + 'static,
    O: RankingObserver + 'static,
{
    let axum::Json(event) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    match service.preview(&event) {
        Ok(preview) => (StatusCode::OK, axum::Json(preview)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn status_for(err: &LeaderboardServiceError) -> StatusCode {
    match err {
        LeaderboardServiceError::Ranking(RankingError::UnknownClient { .. })
        | LeaderboardServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        LeaderboardServiceError::Ranking(RankingError::DuplicateSprint { .. })
        | LeaderboardServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        LeaderboardServiceError::Ranking(RankingError::InvalidRange { .. })
        | LeaderboardServiceError::InvalidEnrollment(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LeaderboardServiceError::WriteContention { .. } => StatusCode::SERVICE_UNAVAILABLE,
        LeaderboardServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: LeaderboardServiceError) -> Response {
    let payload = json!({
        "error": err.to_string(),
    });
    (status_for(&err), axum::Json(payload)).into_response()
}

/// Malformed or mistyped bodies get the same JSON error shape as domain errors.
fn rejection_response(rejection: JsonRejection) -> Response {
    let payload = json!({
        "error": rejection.body_text(),
    });
    (rejection.status(), axum::Json(payload)).into_response()
}
