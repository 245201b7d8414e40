//! Onboarding case lifecycle: intake, the review state machine, storage,
//! the service facade, and the HTTP routes.

pub mod domain;
pub mod intake;
pub mod router;
pub mod service;
pub mod store;
pub mod transitions;

#[cfg(test)]
mod tests;

pub use domain::{
    AmlDeclarations, AuditEntry, CaseId, CaseSeed, CaseStatus, CaseSubmission, CompanyAddress,
    CompanyProfile, DirectorDeclaration, OfficerAction, OnboardingCase, SettlementDetails,
    UboDeclaration,
};
pub use intake::{IntakeValidator, ValidationError};
pub use router::{case_router, CaseProgressView};
pub use service::{
    CaseServiceError, IngestReceipt, OnboardingCaseService, APPLICANT_ACTOR, BACKFILL_ACTOR,
    OFFICER_ACTOR,
};
pub use store::{
    CaseDetailView, CaseNotice, CaseNotifier, CaseRecord, CaseStore, CaseSummary,
    InMemoryCaseStore, NotifyError, StageGroupedLogs, StoreError,
};
pub use transitions::{action_target, available_actions, stage_target, TransitionError};
