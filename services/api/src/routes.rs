use crate::infra::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use onboard_ai::error::AppError;
use onboard_ai::workflows::backfill::{CaseBackfillImporter, SkippedRow};
use onboard_ai::workflows::onboarding::cases::{
    case_router, CaseId, CaseNotifier, CaseStore, OnboardingCaseService,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct BackfillRequest {
    pub(crate) csv: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct BackfillResponse {
    pub(crate) restored: Vec<RestoredCase>,
    pub(crate) skipped: Vec<SkippedRow>,
    pub(crate) failed: Vec<RestoreFailure>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RestoredCase {
    pub(crate) case_id: CaseId,
    pub(crate) tracking_code: String,
    pub(crate) status: &'static str,
}

/// A seed the importer accepted but the service refused, usually because the
/// exported row no longer passes intake validation.
#[derive(Debug, Serialize)]
pub(crate) struct RestoreFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tracking_code: Option<String>,
    pub(crate) reason: String,
}

pub(crate) fn with_case_routes<S, N>(service: Arc<OnboardingCaseService<S, N>>) -> axum::Router
where
    S: CaseStore + 'static,
    N: CaseNotifier + 'static,
{
    case_router(service.clone())
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .merge(
            axum::Router::new()
                .route(
                    "/api/v1/onboarding/backfill",
                    axum::routing::post(backfill_endpoint::<S, N>),
                )
                .with_state(service),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Restore cases from a legacy intake export posted as CSV text. Rows the
/// importer cannot map are reported under `skipped`; seeds the service
/// refuses land under `failed`; neither stops the rest of the import.
pub(crate) async fn backfill_endpoint<S, N>(
    State(service): State<Arc<OnboardingCaseService<S, N>>>,
    Json(request): Json<BackfillRequest>,
) -> Result<Json<BackfillResponse>, AppError>
where
    S: CaseStore + 'static,
    N: CaseNotifier + 'static,
{
    let backfill = CaseBackfillImporter::from_reader(Cursor::new(request.csv.into_bytes()))?;

    let mut restored = Vec::new();
    let mut failed = Vec::new();
    for seed in backfill.seeds {
        let tracking_code = seed.tracking_code.clone();
        match service.restore(seed) {
            Ok(record) => restored.push(RestoredCase {
                case_id: record.case.case_id,
                tracking_code: record.case.tracking_code,
                status: record.case.status.label(),
            }),
            Err(error) => failed.push(RestoreFailure {
                tracking_code,
                reason: error.to_string(),
            }),
        }
    }

    Ok(Json(BackfillResponse {
        restored,
        skipped: backfill.skipped,
        failed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryCaseNotifier;
    use onboard_ai::workflows::onboarding::cases::{CaseStatus, InMemoryCaseStore};
    use onboard_ai::workflows::onboarding::screening::ChecklistConfig;

    const EXPORT_HEADER: &str = "Tracking ID,Company Name,Registration Number,Entity Type,Country,Incorporation Date,Contact Name,Contact Email,Website,Expected Volume,Status,Submitted At\n";

    fn build_service() -> Arc<OnboardingCaseService<InMemoryCaseStore, InMemoryCaseNotifier>> {
        Arc::new(OnboardingCaseService::new(
            Arc::new(InMemoryCaseStore::new()),
            Arc::new(InMemoryCaseNotifier::default()),
            ChecklistConfig::standard(),
        ))
    }

    #[tokio::test]
    async fn backfill_endpoint_restores_mapped_rows_and_reports_the_rest() {
        let service = build_service();
        let csv = format!(
            "{EXPORT_HEADER}\
LEG-00017,Helios Trade Systems GmbH,HRB 74821,GmbH,Germany,2019-05-20,Clara Novak,clara.novak@heliostrade.example,,,KYC_IN_PROGRESS,2026-01-12T08:45:00Z\n\
LEG-00018,Meridian Freight AG,CHE-123.456.789,AG,Switzerland,2015-02-11,Jonas Frei,jonas.frei@meridianfreight.example,,,AML_STAGE3_COMPLETE,2026-01-15\n",
        );

        let Json(body) = backfill_endpoint(
            State(service.clone()),
            Json(BackfillRequest { csv }),
        )
        .await
        .expect("import runs");

        assert_eq!(body.restored.len(), 1);
        assert_eq!(body.restored[0].tracking_code, "LEG-00017");
        assert_eq!(body.restored[0].status, "PENDING_REVIEW");
        assert_eq!(body.skipped.len(), 1);
        assert!(body.skipped[0].reason.contains("AML_STAGE3_COMPLETE"));
        assert!(body.failed.is_empty());

        let summaries = service
            .list_cases(Some(CaseStatus::PendingReview))
            .expect("list succeeds");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].company_name, "Helios Trade Systems GmbH");
    }

    #[tokio::test]
    async fn backfill_endpoint_reports_seeds_the_service_refuses() {
        let service = build_service();
        // The contact email does not route, so intake refuses the restore.
        let csv = format!(
            "{EXPORT_HEADER}\
LEG-00019,Baltic Components OU,14523311,OU,Estonia,2021-06-01,Mari Tamm,not-an-address,,,APPROVED,2026-01-16\n",
        );

        let Json(body) = backfill_endpoint(State(service), Json(BackfillRequest { csv }))
            .await
            .expect("import runs");

        assert!(body.restored.is_empty());
        assert!(body.skipped.is_empty());
        assert_eq!(body.failed.len(), 1);
        assert_eq!(body.failed[0].tracking_code.as_deref(), Some("LEG-00019"));
        assert!(body.failed[0].reason.contains("not-an-address"));
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }
}
