use super::domain::{CaseId, CaseStatus, CaseSubmission, OfficerAction};
use super::service::{CaseServiceError, OnboardingCaseService};
use super::store::{CaseNotifier, CaseStore};
use super::transitions::TransitionError;
use crate::workflows::onboarding::progress::{is_in_flight, phase_for, Phase};
use crate::workflows::onboarding::screening::{AgentLogDraft, RiskLevel};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// HTTP surface of the onboarding pipeline. All routes share one service
/// instance; screening agents and the review UI talk to the same state
/// machine.
pub fn case_router<S, N>(service: Arc<OnboardingCaseService<S, N>>) -> Router
where
    S: CaseStore + 'static,
    N: CaseNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/onboarding/cases",
            post(create_case_handler::<S, N>).get(list_cases_handler::<S, N>),
        )
        .route(
            "/api/v1/onboarding/cases/:case_id",
            get(case_detail_handler::<S, N>),
        )
        .route(
            "/api/v1/onboarding/cases/:case_id/action",
            post(case_action_handler::<S, N>),
        )
        .route(
            "/api/v1/onboarding/cases/:case_id/agent-logs",
            post(ingest_log_handler::<S, N>).get(agent_logs_handler::<S, N>),
        )
        .route(
            "/api/v1/onboarding/cases/:case_id/progress",
            get(case_progress_handler::<S, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActionRequest {
    pub action: OfficerAction,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

/// Poll payload for applicant portals: the collapsed phase plus whether and
/// when to poll again.
#[derive(Debug, Clone, Serialize)]
pub struct CaseProgressView {
    pub case_id: CaseId,
    pub tracking_code: String,
    pub status: CaseStatus,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_risk: Option<RiskLevel>,
    pub keep_polling: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,
}

pub(crate) async fn create_case_handler<S, N>(
    State(service): State<Arc<OnboardingCaseService<S, N>>>,
    Json(submission): Json<CaseSubmission>,
) -> Response
where
    S: CaseStore + 'static,
    N: CaseNotifier + 'static,
{
    match service.create_case(submission) {
        Ok(record) => (StatusCode::CREATED, Json(record.detail_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_cases_handler<S, N>(
    State(service): State<Arc<OnboardingCaseService<S, N>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: CaseStore + 'static,
    N: CaseNotifier + 'static,
{
    let status = match query.status.as_deref() {
        None => None,
        Some(label) => match CaseStatus::parse(label) {
            Some(status) => Some(status),
            None => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "error": format!("unknown status filter '{label}'") })),
                )
                    .into_response()
            }
        },
    };

    match service.list_cases(status) {
        Ok(summaries) => (StatusCode::OK, Json(summaries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn case_detail_handler<S, N>(
    State(service): State<Arc<OnboardingCaseService<S, N>>>,
    Path(case_id): Path<String>,
) -> Response
where
    S: CaseStore + 'static,
    N: CaseNotifier + 'static,
{
    match service.case_detail(&CaseId(case_id)) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn case_action_handler<S, N>(
    State(service): State<Arc<OnboardingCaseService<S, N>>>,
    Path(case_id): Path<String>,
    Json(request): Json<ActionRequest>,
) -> Response
where
    S: CaseStore + 'static,
    N: CaseNotifier + 'static,
{
    match service.submit_action(&CaseId(case_id), request.action, request.remarks) {
        Ok(record) => (StatusCode::OK, Json(record.detail_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn ingest_log_handler<S, N>(
    State(service): State<Arc<OnboardingCaseService<S, N>>>,
    Path(case_id): Path<String>,
    Json(draft): Json<AgentLogDraft>,
) -> Response
where
    S: CaseStore + 'static,
    N: CaseNotifier + 'static,
{
    match service.ingest_agent_log(&CaseId(case_id), draft) {
        Ok(receipt) => (StatusCode::ACCEPTED, Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn agent_logs_handler<S, N>(
    State(service): State<Arc<OnboardingCaseService<S, N>>>,
    Path(case_id): Path<String>,
) -> Response
where
    S: CaseStore + 'static,
    N: CaseNotifier + 'static,
{
    match service.agent_logs(&CaseId(case_id)) {
        Ok(grouped) => (StatusCode::OK, Json(grouped)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn case_progress_handler<S, N>(
    State(service): State<Arc<OnboardingCaseService<S, N>>>,
    Path(case_id): Path<String>,
) -> Response
where
    S: CaseStore + 'static,
    N: CaseNotifier + 'static,
{
    match service.fetch_case(&CaseId(case_id)) {
        Ok(case) => {
            let keep_polling = is_in_flight(case.status);
            let view = CaseProgressView {
                case_id: case.case_id,
                tracking_code: case.tracking_code,
                status: case.status,
                phase: phase_for(case.status),
                derived_risk: case.derived_risk,
                keep_polling,
                poll_interval_secs: keep_polling.then(|| service.poll_interval().as_secs()),
            };
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

/// Error mapping shared by every handler. Refused transitions and stale
/// decisions are both conflicts, distinguished by a machine-readable code so
/// the review UI can tell "button should not exist" from "refresh and retry".
fn error_response(error: CaseServiceError) -> Response {
    use super::store::StoreError;

    let (status, body) = match &error {
        CaseServiceError::Validation(validation) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": validation.to_string() }),
        ),
        CaseServiceError::Transition(TransitionError::InvalidTransition { .. }) => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string(), "code": "invalid_transition" }),
        ),
        CaseServiceError::Transition(TransitionError::Stale { .. }) => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string(), "code": "stale_transition" }),
        ),
        CaseServiceError::Store(StoreError::NotFound) => (
            StatusCode::NOT_FOUND,
            json!({ "error": "case not found" }),
        ),
        CaseServiceError::Store(StoreError::Conflict) => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string() }),
        ),
        CaseServiceError::Store(StoreError::Unavailable(_)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "error": error.to_string() }),
        ),
        CaseServiceError::Store(StoreError::RevisionMismatch) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": error.to_string() }),
        ),
    };

    (status, Json(body)).into_response()
}
