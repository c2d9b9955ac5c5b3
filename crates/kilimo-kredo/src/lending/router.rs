use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ApplicationId, ApplicationStatus, DecisionRequest, FarmerProfileSubmission, LoanRequest,
};
use super::environment::EnvironmentalDataProvider;
use super::repository::{ApplicationRepository, ProfileRepository, RepositoryError};
use super::scoring::ScoringInput;
use super::service::{LendingService, LendingServiceError};

type SharedService<P, A, E> = Arc<LendingService<P, A, E>>;

/// Router builder exposing the farmer and creditor endpoints.
pub fn lending_router<P, A, E>(service: SharedService<P, A, E>) -> Router
where
    P: ProfileRepository + 'static,
    A: ApplicationRepository + 'static,
    E: EnvironmentalDataProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/profile",
            get(profile_handler::<P, A, E>).put(submit_profile_handler::<P, A, E>),
        )
        .route("/api/v1/assessments", post(assess_handler::<P, A, E>))
        .route(
            "/api/v1/applications",
            get(list_handler::<P, A, E>).post(submit_handler::<P, A, E>),
        )
        .route("/api/v1/applications/stats", get(stats_handler::<P, A, E>))
        .route(
            "/api/v1/applications/:application_id",
            get(application_handler::<P, A, E>),
        )
        .route(
            "/api/v1/applications/:application_id/review",
            post(review_handler::<P, A, E>),
        )
        .route(
            "/api/v1/applications/:application_id/decision",
            post(decision_handler::<P, A, E>),
        )
        .with_state(service)
}

impl LendingServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LendingServiceError::ProfileRequired
            | LendingServiceError::TerminalStateViolation { .. } => StatusCode::CONFLICT,
            LendingServiceError::IncompleteProfile(_)
            | LendingServiceError::CommentsRequired
            | LendingServiceError::InvalidDecision(_)
            | LendingServiceError::InvalidAdjustment(_)
            | LendingServiceError::InvalidLoanRequest(_)
            | LendingServiceError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LendingServiceError::ApplicationNotFound(_)
            | LendingServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            LendingServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            LendingServiceError::ProviderUnavailable(_)
            | LendingServiceError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

pub(crate) fn error_response(error: LendingServiceError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (error.status_code(), Json(payload)).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) status: Option<String>,
}

pub(crate) async fn submit_profile_handler<P, A, E>(
    State(service): State<SharedService<P, A, E>>,
    Json(submission): Json<FarmerProfileSubmission>,
) -> Response
where
    P: ProfileRepository + 'static,
    A: ApplicationRepository + 'static,
    E: EnvironmentalDataProvider + 'static,
{
    // The provider may back off between retries, so keep it off the async workers.
    let outcome = tokio::task::spawn_blocking(move || service.submit_profile(submission)).await;

    match outcome {
        Ok(Ok(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(Err(error)) => error_response(error),
        Err(join_error) => {
            let payload = json!({
                "error": format!("profile assessment aborted: {join_error}"),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn profile_handler<P, A, E>(
    State(service): State<SharedService<P, A, E>>,
) -> Response
where
    P: ProfileRepository + 'static,
    A: ApplicationRepository + 'static,
    E: EnvironmentalDataProvider + 'static,
{
    match service.current_profile() {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => {
            let payload = json!({
                "error": "no farmer profile has been submitted",
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn assess_handler<P, A, E>(
    State(service): State<SharedService<P, A, E>>,
    Json(input): Json<ScoringInput>,
) -> Response
where
    P: ProfileRepository + 'static,
    A: ApplicationRepository + 'static,
    E: EnvironmentalDataProvider + 'static,
{
    match service.assess(&input) {
        Ok(assessment) => (StatusCode::OK, Json(assessment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<P, A, E>(
    State(service): State<SharedService<P, A, E>>,
    Json(request): Json<LoanRequest>,
) -> Response
where
    P: ProfileRepository + 'static,
    A: ApplicationRepository + 'static,
    E: EnvironmentalDataProvider + 'static,
{
    match service.submit(request) {
        Ok(application) => (StatusCode::CREATED, Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<P, A, E>(
    State(service): State<SharedService<P, A, E>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    P: ProfileRepository + 'static,
    A: ApplicationRepository + 'static,
    E: EnvironmentalDataProvider + 'static,
{
    let filter = match query.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => match raw.parse::<ApplicationStatus>() {
            Ok(status) => Some(status),
            Err(error) => {
                let payload = json!({
                    "error": error.to_string(),
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
            }
        },
    };

    match service.list(filter) {
        Ok(applications) => (StatusCode::OK, Json(applications)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn application_handler<P, A, E>(
    State(service): State<SharedService<P, A, E>>,
    Path(application_id): Path<String>,
) -> Response
where
    P: ProfileRepository + 'static,
    A: ApplicationRepository + 'static,
    E: EnvironmentalDataProvider + 'static,
{
    match service.get(&ApplicationId(application_id)) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn review_handler<P, A, E>(
    State(service): State<SharedService<P, A, E>>,
    Path(application_id): Path<String>,
) -> Response
where
    P: ProfileRepository + 'static,
    A: ApplicationRepository + 'static,
    E: EnvironmentalDataProvider + 'static,
{
    match service.start_review(&ApplicationId(application_id)) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decision_handler<P, A, E>(
    State(service): State<SharedService<P, A, E>>,
    Path(application_id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> Response
where
    P: ProfileRepository + 'static,
    A: ApplicationRepository + 'static,
    E: EnvironmentalDataProvider + 'static,
{
    match service.decide(&ApplicationId(application_id), request) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stats_handler<P, A, E>(
    State(service): State<SharedService<P, A, E>>,
) -> Response
where
    P: ProfileRepository + 'static,
    A: ApplicationRepository + 'static,
    E: EnvironmentalDataProvider + 'static,
{
    match service.stats() {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}
