use crate::workflows::onboarding::screening::RiskLevel;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to an onboarding case when it is opened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseId(pub String);

/// Review pipeline status of a case. Terminal statuses never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    PendingReview,
    KycComplete,
    AmlInProgress,
    AmlComplete,
    AmlReviewReady,
    ClarificationRequired,
    Approved,
    Rejected,
    Cancelled,
}

impl CaseStatus {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::PendingReview,
            Self::KycComplete,
            Self::AmlInProgress,
            Self::AmlComplete,
            Self::AmlReviewReady,
            Self::ClarificationRequired,
            Self::Approved,
            Self::Rejected,
            Self::Cancelled,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingReview => "PENDING_REVIEW",
            Self::KycComplete => "KYC_COMPLETE",
            Self::AmlInProgress => "AML_IN_PROGRESS",
            Self::AmlComplete => "AML_COMPLETE",
            Self::AmlReviewReady => "AML_REVIEW_READY",
            Self::ClarificationRequired => "CLARIFICATION_REQUIRED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parse a canonical status label. Unknown labels return `None`; callers
    /// decide whether that is an error or a fail-closed default.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|status| status.label() == label.trim())
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Cancelled)
    }
}

/// Decision a compliance officer can take on an open case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfficerAction {
    Approve,
    Reject,
    Clarify,
    Cancel,
}

impl OfficerAction {
    pub const fn ordered() -> [Self; 4] {
        [Self::Approve, Self::Reject, Self::Clarify, Self::Cancel]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Clarify => "clarify",
            Self::Cancel => "cancel",
        }
    }
}

/// One accepted status change. History entries are append-only; the first
/// entry of every case carries no previous status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub previous_status: Option<CaseStatus>,
    pub status: CaseStatus,
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Registered address captured at intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyAddress {
    pub street: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub postal_code: String,
}

/// Director declared on the application form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorDeclaration {
    pub full_name: String,
    pub role: String,
    pub nationality: String,
    pub residency_country: String,
}

/// Ultimate beneficial owner declared on the application form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UboDeclaration {
    pub full_name: String,
    pub ownership_percent: f32,
    pub nationality: String,
    pub residency_country: String,
    pub date_of_birth: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub pep: bool,
}

/// AML questionnaire answers collected uniformly from every applicant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmlDeclarations {
    #[serde(default)]
    pub sanctions_exposure: bool,
    pub source_of_funds: String,
    pub source_of_wealth: String,
    pub expected_volume: String,
    #[serde(default)]
    pub aml_program_confirmed: bool,
}

/// Settlement account details used once a case is approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementDetails {
    pub bank_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
}

/// Raw application payload as received from the intake form, before
/// validation and sanitization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSubmission {
    pub company_name: String,
    pub registration_number: String,
    pub entity_type: String,
    pub country: String,
    pub incorporation_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub contact_email: String,
    pub address: CompanyAddress,
    #[serde(default)]
    pub directors: Vec<DirectorDeclaration>,
    #[serde(default)]
    pub ubos: Vec<UboDeclaration>,
    pub declarations: AmlDeclarations,
    pub banking: SettlementDetails,
}

/// Sanitized company profile stored on the case once intake checks pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company_name: String,
    pub registration_number: String,
    pub entity_type: String,
    pub country: String,
    pub incorporation_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub address: CompanyAddress,
    pub directors: Vec<DirectorDeclaration>,
    pub ubos: Vec<UboDeclaration>,
    pub declarations: AmlDeclarations,
    pub banking: SettlementDetails,
}

impl CompanyProfile {
    /// Field pairs the evidence panel checks against agent-extracted values.
    pub fn comparable_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("company_name", self.company_name.as_str()),
            ("registration_number", self.registration_number.as_str()),
            ("entity_type", self.entity_type.as_str()),
            ("country", self.country.as_str()),
        ]
    }
}

/// One onboarding application tracked through the review pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingCase {
    pub case_id: CaseId,
    pub tracking_code: String,
    pub profile: CompanyProfile,
    pub status: CaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_risk: Option<RiskLevel>,
    pub submitted_at: DateTime<Utc>,
    pub history: Vec<AuditEntry>,
}

/// A case reconstructed from a legacy intake export rather than opened
/// through the form.
#[derive(Debug, Clone)]
pub struct CaseSeed {
    pub submission: CaseSubmission,
    pub status: CaseStatus,
    pub submitted_at: DateTime<Utc>,
    pub tracking_code: Option<String>,
}
