use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::workflows::onboarding::cases::domain::{
    AmlDeclarations, CaseId, CaseSubmission, CompanyAddress, DirectorDeclaration,
    SettlementDetails, UboDeclaration,
};
use crate::workflows::onboarding::cases::store::{
    CaseNotice, CaseNotifier, CaseRecord, CaseStore, InMemoryCaseStore, NotifyError, StoreError,
};
use crate::workflows::onboarding::cases::{case_router, CaseStatus, OnboardingCaseService};
use crate::workflows::onboarding::screening::{AgentLogDraft, ChecklistConfig, ScreeningStage};

pub(super) fn submission() -> CaseSubmission {
    CaseSubmission {
        company_name: "Helios Trade Systems GmbH".to_string(),
        registration_number: "HRB 74821".to_string(),
        entity_type: "GmbH".to_string(),
        country: "Germany".to_string(),
        incorporation_date: NaiveDate::from_ymd_opt(2019, 5, 20).expect("valid date"),
        website: Some("https://heliostrade.example".to_string()),
        contact_first_name: "Clara".to_string(),
        contact_last_name: "Novak".to_string(),
        contact_email: "clara.novak@heliostrade.example".to_string(),
        address: CompanyAddress {
            street: "Friedrichstrasse 112".to_string(),
            city: "Berlin".to_string(),
            state: None,
            postal_code: "10117".to_string(),
        },
        directors: vec![
            DirectorDeclaration {
                full_name: "Clara Novak".to_string(),
                role: "Managing Director".to_string(),
                nationality: "Austria".to_string(),
                residency_country: "Germany".to_string(),
            },
            DirectorDeclaration {
                full_name: "Milan Petrov".to_string(),
                role: "Director".to_string(),
                nationality: "Bulgaria".to_string(),
                residency_country: "Bulgaria".to_string(),
            },
        ],
        ubos: vec![
            UboDeclaration {
                full_name: "Clara Novak".to_string(),
                ownership_percent: 62.5,
                nationality: "Austria".to_string(),
                residency_country: "Germany".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1984, 3, 11).expect("valid"),
                tax_id: Some("ATU99999999".to_string()),
                pep: false,
            },
            UboDeclaration {
                full_name: "Milan Petrov".to_string(),
                ownership_percent: 37.5,
                nationality: "Bulgaria".to_string(),
                residency_country: "Bulgaria".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1979, 7, 2).expect("valid"),
                tax_id: None,
                pep: true,
            },
        ],
        declarations: AmlDeclarations {
            sanctions_exposure: false,
            source_of_funds: "Operating revenue from commodity trading".to_string(),
            source_of_wealth: "Retained earnings since 2019".to_string(),
            expected_volume: "EUR 2M monthly".to_string(),
            aml_program_confirmed: true,
        },
        banking: SettlementDetails {
            bank_name: "Commerzbank AG".to_string(),
            routing_number: Some("COBADEFFXXX".to_string()),
            account_number: Some("DE89370400440532013000".to_string()),
        },
    }
}

pub(super) fn checklists() -> ChecklistConfig {
    ChecklistConfig::standard()
}

pub(super) fn build_service() -> (
    OnboardingCaseService<InMemoryCaseStore, MemoryNotifier>,
    Arc<InMemoryCaseStore>,
    Arc<MemoryNotifier>,
) {
    let store = Arc::new(InMemoryCaseStore::new());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = OnboardingCaseService::new(store.clone(), notifier.clone(), checklists());
    (service, store, notifier)
}

/// Open a case and hand back its id.
pub(super) fn open_case(
    service: &OnboardingCaseService<InMemoryCaseStore, MemoryNotifier>,
) -> CaseId {
    let record = service.create_case(submission()).expect("case opens");
    record.case.case_id
}

pub(super) fn draft(stage: ScreeningStage, check: &str, risk: &str) -> AgentLogDraft {
    AgentLogDraft {
        run_id: Some(format!("run-{check}")),
        agent_name: None,
        stage,
        check_name: check.to_string(),
        risk_level: risk.to_string(),
        recommendation: "PASS".to_string(),
        summary: format!("{check} completed"),
        structured_output: json!({}),
        input_context: json!({ "company_name": "Helios Trade Systems GmbH" }),
        flags: Vec::new(),
        model_used: Some("rule-based".to_string()),
        duration_ms: Some(40),
    }
}

/// The standard stage-one findings in reporting order, all low risk except
/// where a test overrides them.
pub(super) fn stage_one_drafts() -> Vec<AgentLogDraft> {
    vec![
        draft(ScreeningStage::Kyc, "identity_verification", "LOW"),
        draft(ScreeningStage::Kyc, "document_consistency", "LOW"),
        draft(ScreeningStage::Kyc, "registry_lookup", "LOW"),
        draft(ScreeningStage::Kyc, "sanctions_screening", "LOW"),
    ]
}

pub(super) fn stage_two_drafts() -> Vec<AgentLogDraft> {
    vec![
        draft(ScreeningStage::AmlRisk, "country_risk", "LOW"),
        draft(ScreeningStage::AmlRisk, "transaction_volume", "MEDIUM"),
        draft(ScreeningStage::AmlRisk, "aml_questionnaire", "LOW"),
    ]
}

/// Drive a pending case through stage one so officer decisions apply.
pub(super) fn complete_stage_one(
    service: &OnboardingCaseService<InMemoryCaseStore, MemoryNotifier>,
    case_id: &CaseId,
) {
    for draft in stage_one_drafts() {
        service
            .ingest_agent_log(case_id, draft)
            .expect("finding ingests");
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<CaseNotice>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<CaseNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }

    pub(super) fn templates(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|notice| notice.template)
            .collect()
    }
}

impl CaseNotifier for MemoryNotifier {
    fn publish(&self, notice: CaseNotice) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl CaseNotifier for FailingNotifier {
    fn publish(&self, _notice: CaseNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay down".to_string()))
    }
}

pub(super) struct UnavailableStore;

impl CaseStore for UnavailableStore {
    fn insert(&self, _record: CaseRecord) -> Result<CaseRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn replace(&self, _record: CaseRecord, _expected: u64) -> Result<CaseRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _case_id: &CaseId) -> Result<Option<CaseRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _status: Option<CaseStatus>) -> Result<Vec<CaseRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct ConflictStore;

impl CaseStore for ConflictStore {
    fn insert(&self, _record: CaseRecord) -> Result<CaseRecord, StoreError> {
        Err(StoreError::Conflict)
    }

    fn replace(&self, _record: CaseRecord, _expected: u64) -> Result<CaseRecord, StoreError> {
        Err(StoreError::Conflict)
    }

    fn fetch(&self, _case_id: &CaseId) -> Result<Option<CaseRecord>, StoreError> {
        Ok(None)
    }

    fn list(&self, _status: Option<CaseStatus>) -> Result<Vec<CaseRecord>, StoreError> {
        Ok(Vec::new())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn case_router_with_service(
    service: OnboardingCaseService<InMemoryCaseStore, MemoryNotifier>,
) -> axum::Router {
    case_router(Arc::new(service))
}
