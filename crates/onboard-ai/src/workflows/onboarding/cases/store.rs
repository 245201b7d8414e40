use super::domain::{AuditEntry, CaseId, CaseStatus, CompanyProfile, OnboardingCase};
use super::transitions;
use crate::workflows::onboarding::screening::{compare_fields, AgentLog, FieldComparison, ScreeningStage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Stored unit: the case plus its screening findings, under one revision
/// counter. Writers commit whole records, so readers never observe a status
/// change without its audit entry.
#[derive(Debug, Clone)]
pub struct CaseRecord {
    pub case: OnboardingCase,
    pub agent_logs: Vec<AgentLog>,
    pub revision: u64,
}

impl CaseRecord {
    pub fn new(case: OnboardingCase) -> Self {
        Self {
            case,
            agent_logs: Vec::new(),
            revision: 1,
        }
    }

    pub fn summary(&self) -> CaseSummary {
        CaseSummary {
            case_id: self.case.case_id.clone(),
            tracking_code: self.case.tracking_code.clone(),
            company_name: self.case.profile.company_name.clone(),
            country: self.case.profile.country.clone(),
            entity_type: self.case.profile.entity_type.clone(),
            status: self.case.status.label(),
            derived_risk: self.case.derived_risk.map(|risk| risk.label()),
            submitted_at: self.case.submitted_at,
        }
    }

    pub fn detail_view(&self) -> CaseDetailView {
        CaseDetailView {
            case_id: self.case.case_id.clone(),
            tracking_code: self.case.tracking_code.clone(),
            status: self.case.status.label(),
            derived_risk: self.case.derived_risk.map(|risk| risk.label()),
            submitted_at: self.case.submitted_at,
            profile: self.case.profile.clone(),
            history: self.case.history.clone(),
            available_actions: transitions::available_actions(self.case.status)
                .into_iter()
                .map(|action| action.label())
                .collect(),
            evidence: compare_fields(&self.case.profile.comparable_fields(), &self.agent_logs),
        }
    }

    pub fn stage_logs(&self) -> StageGroupedLogs {
        let (stage_one, stage_two) = self
            .agent_logs
            .iter()
            .cloned()
            .partition(|log| log.stage == ScreeningStage::Kyc);

        StageGroupedLogs {
            case_id: self.case.case_id.clone(),
            stage_one,
            stage_two,
        }
    }
}

/// Row rendered in the review queue listing.
#[derive(Debug, Clone, Serialize)]
pub struct CaseSummary {
    pub case_id: CaseId,
    pub tracking_code: String,
    pub company_name: String,
    pub country: String,
    pub entity_type: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_risk: Option<&'static str>,
    pub submitted_at: DateTime<Utc>,
}

/// Everything the review panel shows for one case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseDetailView {
    pub case_id: CaseId,
    pub tracking_code: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_risk: Option<&'static str>,
    pub submitted_at: DateTime<Utc>,
    pub profile: CompanyProfile,
    pub history: Vec<AuditEntry>,
    pub available_actions: Vec<&'static str>,
    pub evidence: Vec<FieldComparison>,
}

/// Screening findings grouped by stage for the review panel.
#[derive(Debug, Clone, Serialize)]
pub struct StageGroupedLogs {
    pub case_id: CaseId,
    pub stage_one: Vec<AgentLog>,
    pub stage_two: Vec<AgentLog>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("case already exists")]
    Conflict,
    #[error("case not found")]
    NotFound,
    #[error("stored revision moved past the writer's copy")]
    RevisionMismatch,
    #[error("case store unavailable: {0}")]
    Unavailable(String),
}

/// Case persistence seam.
///
/// `replace` is compare-and-swap on the revision: it commits the record only
/// if the stored revision still equals `expected`, otherwise it fails with
/// `RevisionMismatch` and the caller re-reads and retries. Every service
/// mutation goes through this path, which is what serializes concurrent
/// writers on the same case without any cross-case lock.
pub trait CaseStore: Send + Sync {
    fn insert(&self, record: CaseRecord) -> Result<CaseRecord, StoreError>;
    fn replace(&self, record: CaseRecord, expected: u64) -> Result<CaseRecord, StoreError>;
    fn fetch(&self, case_id: &CaseId) -> Result<Option<CaseRecord>, StoreError>;
    fn list(&self, status: Option<CaseStatus>) -> Result<Vec<CaseRecord>, StoreError>;
}

/// Reference store backed by process memory.
///
/// The outer lock guards map topology only and is never held across a record
/// read or write. Each case sits behind its own lock and is replaced
/// wholesale on commit, so a reader sees either the record before a
/// transition or after it, never a half-applied one.
#[derive(Debug, Default)]
pub struct InMemoryCaseStore {
    cases: RwLock<HashMap<CaseId, Arc<RwLock<CaseRecord>>>>,
}

impl InMemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, case_id: &CaseId) -> Option<Arc<RwLock<CaseRecord>>> {
        let cases = self.cases.read().expect("case map lock poisoned");
        cases.get(case_id).cloned()
    }
}

impl CaseStore for InMemoryCaseStore {
    fn insert(&self, record: CaseRecord) -> Result<CaseRecord, StoreError> {
        let mut cases = self.cases.write().expect("case map lock poisoned");
        if cases.contains_key(&record.case.case_id) {
            return Err(StoreError::Conflict);
        }
        cases.insert(
            record.case.case_id.clone(),
            Arc::new(RwLock::new(record.clone())),
        );
        Ok(record)
    }

    fn replace(&self, record: CaseRecord, expected: u64) -> Result<CaseRecord, StoreError> {
        let slot = self.slot(&record.case.case_id).ok_or(StoreError::NotFound)?;
        let mut current = slot.write().expect("case lock poisoned");
        if current.revision != expected {
            return Err(StoreError::RevisionMismatch);
        }

        let mut committed = record;
        committed.revision = expected + 1;
        *current = committed.clone();
        Ok(committed)
    }

    fn fetch(&self, case_id: &CaseId) -> Result<Option<CaseRecord>, StoreError> {
        match self.slot(case_id) {
            Some(slot) => {
                let record = slot.read().expect("case lock poisoned");
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    fn list(&self, status: Option<CaseStatus>) -> Result<Vec<CaseRecord>, StoreError> {
        let slots: Vec<Arc<RwLock<CaseRecord>>> = {
            let cases = self.cases.read().expect("case map lock poisoned");
            cases.values().cloned().collect()
        };

        let mut records = Vec::with_capacity(slots.len());
        for slot in slots {
            let record = slot.read().expect("case lock poisoned");
            if status.map_or(true, |wanted| record.case.status == wanted) {
                records.push(record.clone());
            }
        }
        Ok(records)
    }
}

/// Applicant-facing notice emitted after a case event. Delivery is handled
/// outside this crate; details carry whatever the template needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseNotice {
    pub template: String,
    pub case_id: CaseId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notice transport unavailable: {0}")]
    Transport(String),
}

/// Outbound notification seam. Publishing is best-effort; a failed notice is
/// logged and dropped, never allowed to roll back a committed transition.
pub trait CaseNotifier: Send + Sync {
    fn publish(&self, notice: CaseNotice) -> Result<(), NotifyError>;
}
