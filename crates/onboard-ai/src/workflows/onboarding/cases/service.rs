use super::domain::{
    AuditEntry, CaseId, CaseSeed, CaseStatus, CaseSubmission, OfficerAction, OnboardingCase,
};
use super::intake::{IntakeValidator, ValidationError};
use super::store::{
    CaseNotice, CaseNotifier, CaseRecord, CaseStore, CaseSummary, CaseDetailView, StageGroupedLogs,
    StoreError,
};
use super::transitions::{self, TransitionError};
use crate::workflows::onboarding::progress::DEFAULT_POLL_INTERVAL;
use crate::workflows::onboarding::screening::{
    AgentLogDraft, ChecklistConfig, Recommendation, RiskLevel, ScreeningEngine,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Actor recorded on entries written by the submitting company.
pub const APPLICANT_ACTOR: &str = "applicant";
/// Actor recorded on officer decisions.
pub const OFFICER_ACTOR: &str = "compliance-officer";
/// Actor recorded on cases reconstructed from a legacy export.
pub const BACKFILL_ACTOR: &str = "backfill";

/// How many times a writer re-reads and re-validates after losing a
/// revision race before giving up as stale.
const MAX_TRANSITION_ATTEMPTS: u32 = 8;

#[derive(Debug, thiserror::Error)]
pub enum CaseServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Acknowledgement returned to a screening agent for one finding.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    pub case_id: CaseId,
    pub check_name: String,
    pub risk_level: RiskLevel,
    pub recommendation: Recommendation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_risk: Option<RiskLevel>,
    pub status: CaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_to: Option<CaseStatus>,
}

/// Service facade for the onboarding case pipeline.
///
/// Every mutation follows the same shape: read the record, validate against
/// the current status, build the whole next record, then commit it with a
/// revision check. Losing the revision race means another writer committed
/// first; the mutation is re-validated against the fresh record rather than
/// replayed blindly.
pub struct OnboardingCaseService<S, N> {
    intake: IntakeValidator,
    store: Arc<S>,
    notifier: Arc<N>,
    screening: Arc<ScreeningEngine>,
    sequence: AtomicU64,
    poll_interval: Duration,
}

impl<S, N> OnboardingCaseService<S, N>
where
    S: CaseStore,
    N: CaseNotifier,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, checklists: ChecklistConfig) -> Self {
        Self {
            intake: IntakeValidator::new(),
            store,
            notifier,
            screening: Arc::new(ScreeningEngine::new(checklists)),
            sequence: AtomicU64::new(1),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the poll cadence reported to applicant portals.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn screening(&self) -> &ScreeningEngine {
        &self.screening
    }

    /// Open a case from an intake submission. The case starts in
    /// `PENDING_REVIEW` with its first history entry already written.
    pub fn create_case(&self, submission: CaseSubmission) -> Result<CaseRecord, CaseServiceError> {
        let profile = self.intake.profile_from_submission(submission)?;
        let submitted_at = Utc::now();
        let (case_id, tracking_code) = self.next_identifiers(submitted_at);

        let case = OnboardingCase {
            case_id,
            tracking_code,
            profile,
            status: CaseStatus::PendingReview,
            derived_risk: None,
            submitted_at,
            history: vec![AuditEntry {
                previous_status: None,
                status: CaseStatus::PendingReview,
                actor: APPLICANT_ACTOR.to_string(),
                remarks: Some("Initial application submitted".to_string()),
                recorded_at: submitted_at,
            }],
        };

        let stored = self.store.insert(CaseRecord::new(case))?;
        info!(
            case_id = %stored.case.case_id.0,
            tracking_code = %stored.case.tracking_code,
            "onboarding case opened"
        );
        self.notify(&stored.case, "application_received", None);
        Ok(stored)
    }

    /// Reinstate a case exported from the legacy intake tool. The mapped
    /// status is applied directly and the only history entry records the
    /// restoration itself, not the journey the old system took.
    pub fn restore(&self, seed: CaseSeed) -> Result<CaseRecord, CaseServiceError> {
        let profile = self.intake.profile_from_submission(seed.submission)?;
        let (case_id, generated_code) = self.next_identifiers(seed.submitted_at);
        let tracking_code = seed.tracking_code.unwrap_or(generated_code);

        let case = OnboardingCase {
            case_id,
            tracking_code,
            profile,
            status: seed.status,
            derived_risk: None,
            submitted_at: seed.submitted_at,
            history: vec![AuditEntry {
                previous_status: None,
                status: seed.status,
                actor: BACKFILL_ACTOR.to_string(),
                remarks: Some("Restored from intake export".to_string()),
                recorded_at: Utc::now(),
            }],
        };

        let stored = self.store.insert(CaseRecord::new(case))?;
        info!(
            case_id = %stored.case.case_id.0,
            status = stored.case.status.label(),
            "case restored from export"
        );
        Ok(stored)
    }

    /// Review queue rows, newest submissions first.
    pub fn list_cases(
        &self,
        status: Option<CaseStatus>,
    ) -> Result<Vec<CaseSummary>, CaseServiceError> {
        let mut records = self.store.list(status)?;
        records.sort_by(|a, b| b.case.submitted_at.cmp(&a.case.submitted_at));
        Ok(records.iter().map(CaseRecord::summary).collect())
    }

    pub fn fetch_case(&self, case_id: &CaseId) -> Result<OnboardingCase, CaseServiceError> {
        Ok(self.fetch_required(case_id)?.case)
    }

    pub fn case_detail(&self, case_id: &CaseId) -> Result<CaseDetailView, CaseServiceError> {
        Ok(self.fetch_required(case_id)?.detail_view())
    }

    pub fn agent_logs(&self, case_id: &CaseId) -> Result<StageGroupedLogs, CaseServiceError> {
        Ok(self.fetch_required(case_id)?.stage_logs())
    }

    /// Apply an officer decision.
    ///
    /// The decision is validated against the status the officer is acting
    /// on at commit time. If another writer slips in between read and
    /// commit, the decision is re-validated against the new status: still
    /// valid means it commits on the retry, no longer valid means the
    /// officer was looking at a stale case and gets told so instead of a
    /// misleading refusal.
    pub fn submit_action(
        &self,
        case_id: &CaseId,
        action: OfficerAction,
        remarks: Option<String>,
    ) -> Result<CaseRecord, CaseServiceError> {
        let mut raced = false;

        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let record = self.fetch_required(case_id)?;
            let target = match transitions::action_target(record.case.status, action) {
                Ok(target) => target,
                Err(_) if raced => {
                    return Err(TransitionError::Stale {
                        case_id: case_id.clone(),
                    }
                    .into())
                }
                Err(invalid) => return Err(invalid.into()),
            };

            let expected = record.revision;
            let mut next = record;
            apply_transition(&mut next.case, target, OFFICER_ACTOR, remarks.clone());

            match self.store.replace(next, expected) {
                Ok(stored) => {
                    info!(
                        case_id = %stored.case.case_id.0,
                        action = action.label(),
                        status = stored.case.status.label(),
                        "officer decision applied"
                    );
                    self.notify_outcome(&stored.case, remarks.as_deref());
                    return Ok(stored);
                }
                Err(StoreError::RevisionMismatch) => {
                    raced = true;
                    continue;
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(TransitionError::Stale {
            case_id: case_id.clone(),
        }
        .into())
    }

    /// Record one screening finding and fold it into the case.
    ///
    /// The finding is appended, the aggregate risk recomputed from the full
    /// log set, and, when the finding closes out its stage's checklist, the
    /// case advances in the same commit. Redelivered stage completions find
    /// `stage_target` returning nothing and simply append.
    pub fn ingest_agent_log(
        &self,
        case_id: &CaseId,
        draft: AgentLogDraft,
    ) -> Result<IngestReceipt, CaseServiceError> {
        let log = draft.into_log(Utc::now());

        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let record = self.fetch_required(case_id)?;
            let expected = record.revision;
            let mut next = record;

            next.agent_logs.push(log.clone());
            next.case.derived_risk = self.screening.derived_risk(&next.agent_logs);

            let mut advanced_to = None;
            if self.screening.stage_complete(log.stage, &next.agent_logs) {
                if let Some(target) = transitions::stage_target(next.case.status, log.stage) {
                    let remarks = self.screening.completion_remarks(log.stage, &next.agent_logs);
                    apply_transition(&mut next.case, target, &log.agent_name, Some(remarks));
                    advanced_to = Some(target);
                }
            }

            match self.store.replace(next, expected) {
                Ok(stored) => {
                    if let Some(target) = advanced_to {
                        info!(
                            case_id = %stored.case.case_id.0,
                            stage = log.stage.number(),
                            status = target.label(),
                            "screening stage complete, case advanced"
                        );
                    }
                    return Ok(IngestReceipt {
                        case_id: case_id.clone(),
                        check_name: log.check_name.clone(),
                        risk_level: log.risk_level,
                        recommendation: log.recommendation,
                        derived_risk: stored.case.derived_risk,
                        status: stored.case.status,
                        advanced_to,
                    });
                }
                Err(StoreError::RevisionMismatch) => continue,
                Err(other) => return Err(other.into()),
            }
        }

        Err(TransitionError::Stale {
            case_id: case_id.clone(),
        }
        .into())
    }

    fn fetch_required(&self, case_id: &CaseId) -> Result<CaseRecord, CaseServiceError> {
        self.store
            .fetch(case_id)?
            .ok_or(CaseServiceError::Store(StoreError::NotFound))
    }

    fn next_identifiers(&self, submitted_at: DateTime<Utc>) -> (CaseId, String) {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let case_id = CaseId(format!("case-{seq:06}"));
        let tracking_code = format!("ONB-{}-{seq:05}", submitted_at.format("%Y%m"));
        (case_id, tracking_code)
    }

    /// Publish the applicant notice for a decision outcome, when the target
    /// status has one. Intermediate moves are visible through progress
    /// polling and send nothing.
    fn notify_outcome(&self, case: &OnboardingCase, remarks: Option<&str>) {
        let template = match case.status {
            CaseStatus::Approved => "case_approved",
            CaseStatus::Rejected => "case_rejected",
            CaseStatus::Cancelled => "case_cancelled",
            CaseStatus::ClarificationRequired => "clarification_requested",
            _ => return,
        };
        self.notify(case, template, remarks);
    }

    fn notify(&self, case: &OnboardingCase, template: &str, remarks: Option<&str>) {
        let mut details = BTreeMap::new();
        details.insert("tracking_code".to_string(), case.tracking_code.clone());
        details.insert("status".to_string(), case.status.label().to_string());
        if let Some(remarks) = remarks {
            details.insert("remarks".to_string(), remarks.to_string());
        }

        let notice = CaseNotice {
            template: template.to_string(),
            case_id: case.case_id.clone(),
            details,
        };

        if let Err(error) = self.notifier.publish(notice) {
            warn!(
                case_id = %case.case_id.0,
                template,
                %error,
                "applicant notice dropped"
            );
        }
    }
}

fn apply_transition(
    case: &mut OnboardingCase,
    target: CaseStatus,
    actor: &str,
    remarks: Option<String>,
) {
    let entry = AuditEntry {
        previous_status: Some(case.status),
        status: target,
        actor: actor.to_string(),
        remarks,
        recorded_at: Utc::now(),
    };
    case.status = target;
    case.history.push(entry);
}
