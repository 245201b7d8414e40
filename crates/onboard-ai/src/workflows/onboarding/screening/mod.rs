//! Normalization and aggregation of screening-agent findings.
//!
//! Agents report one finding per check. Findings are never rejected for an
//! unreadable verdict; anything outside the known scale is normalized to
//! `Unknown` and kept, so a flaky agent can stall a stage but never soften
//! its outcome.

mod checklist;
mod evidence;

pub use checklist::{risk_for_score, CheckDefinition, ChecklistConfig, StageChecklist};
pub use evidence::{compare_fields, FieldComparison};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Screening stages of the review pipeline. Stage one runs KYC checks while
/// a case is pending review; stage two runs AML risk checks once an officer
/// has moved the case into AML review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ScreeningStage {
    Kyc,
    AmlRisk,
}

impl ScreeningStage {
    pub const fn ordered() -> [Self; 2] {
        [Self::Kyc, Self::AmlRisk]
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::Kyc => 1,
            Self::AmlRisk => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("screening stage must be 1 or 2, found {0}")]
pub struct UnknownStage(pub u8);

impl TryFrom<u8> for ScreeningStage {
    type Error = UnknownStage;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Kyc),
            2 => Ok(Self::AmlRisk),
            other => Err(UnknownStage(other)),
        }
    }
}

impl From<ScreeningStage> for u8 {
    fn from(value: ScreeningStage) -> Self {
        value.number()
    }
}

/// Severity scale for screening findings, ordered least to most severe.
/// `Unknown` deliberately ranks above `Critical`: a finding the service
/// cannot read must never lower the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl RiskLevel {
    /// Map a raw agent verdict onto the scale. Case and surrounding
    /// whitespace are ignored; anything unrecognized becomes `Unknown`.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOW" => Self::Low,
            "MEDIUM" => Self::Medium,
            "HIGH" => Self::High,
            "CRITICAL" => Self::Critical,
            _ => Self::Unknown,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Numeric weight used by the composite score.
    pub const fn score(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 50,
            Self::High => 75,
            Self::Critical => 100,
            Self::Unknown => 50,
        }
    }
}

/// Disposition an agent recommends for its check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Pass,
    Flag,
    Reject,
    Unknown,
}

impl Recommendation {
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PASS" => Self::Pass,
            "FLAG" => Self::Flag,
            "REJECT" => Self::Reject,
            _ => Self::Unknown,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Flag => "FLAG",
            Self::Reject => "REJECT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// A screening finding as reported by an agent, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLogDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    pub stage: ScreeningStage,
    pub check_name: String,
    pub risk_level: String,
    pub recommendation: String,
    pub summary: String,
    #[serde(default)]
    pub structured_output: serde_json::Value,
    #[serde(default)]
    pub input_context: serde_json::Value,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl AgentLogDraft {
    /// Normalize the draft into a stored log entry.
    pub fn into_log(self, recorded_at: DateTime<Utc>) -> AgentLog {
        let agent_name = self.agent_name.unwrap_or_else(|| {
            match self.stage {
                ScreeningStage::Kyc => "kyc-agent",
                ScreeningStage::AmlRisk => "aml-agent",
            }
            .to_string()
        });

        AgentLog {
            run_id: self.run_id,
            agent_name,
            stage: self.stage,
            check_name: self.check_name.trim().to_string(),
            risk_level: RiskLevel::normalize(&self.risk_level),
            recommendation: Recommendation::normalize(&self.recommendation),
            summary: self.summary,
            structured_output: self.structured_output,
            input_context: self.input_context,
            flags: self.flags,
            model_used: self.model_used,
            duration_ms: self.duration_ms,
            recorded_at,
        }
    }
}

/// Stored screening finding. Logs are append-only and keep the full agent
/// payload for the review panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub agent_name: String,
    pub stage: ScreeningStage,
    pub check_name: String,
    pub risk_level: RiskLevel,
    pub recommendation: Recommendation,
    pub summary: String,
    pub structured_output: serde_json::Value,
    pub input_context: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub recorded_at: DateTime<Utc>,
}

/// Applies the configured checklists to a case's accumulated findings.
#[derive(Debug, Clone)]
pub struct ScreeningEngine {
    checklists: ChecklistConfig,
}

impl ScreeningEngine {
    pub fn new(checklists: ChecklistConfig) -> Self {
        Self { checklists }
    }

    pub fn checklists(&self) -> &ChecklistConfig {
        &self.checklists
    }

    /// Aggregate risk across every finding on the case, regardless of stage.
    /// Recomputed from scratch so a later `Critical` always surfaces.
    pub fn derived_risk(&self, logs: &[AgentLog]) -> Option<RiskLevel> {
        logs.iter().map(|log| log.risk_level).max()
    }

    /// True once every configured check for the stage has reported at least
    /// once. Duplicate reports and unexpected check names do not count
    /// against completion.
    pub fn stage_complete(&self, stage: ScreeningStage, logs: &[AgentLog]) -> bool {
        let reported: HashSet<&str> = logs
            .iter()
            .filter(|log| log.stage == stage)
            .map(|log| log.check_name.as_str())
            .collect();

        self.checklists.stage(stage).is_complete(&reported)
    }

    /// Latest verdict per configured check for the stage. Re-runs of a check
    /// replace its earlier verdict.
    pub fn latest_stage_verdicts(
        &self,
        stage: ScreeningStage,
        logs: &[AgentLog],
    ) -> HashMap<String, RiskLevel> {
        let mut verdicts = HashMap::new();
        for log in logs.iter().filter(|log| log.stage == stage) {
            verdicts.insert(log.check_name.clone(), log.risk_level);
        }
        verdicts
    }

    /// Weighted composite score for the stage, 0 to 100. `None` until at
    /// least one configured check has reported.
    pub fn composite_score(&self, stage: ScreeningStage, logs: &[AgentLog]) -> Option<u8> {
        let verdicts = self.latest_stage_verdicts(stage, logs);
        self.checklists.stage(stage).composite_score(&verdicts)
    }

    /// Audit remarks recorded when a completed stage advances the case.
    pub fn completion_remarks(&self, stage: ScreeningStage, logs: &[AgentLog]) -> String {
        let stage_risk = logs
            .iter()
            .filter(|log| log.stage == stage)
            .map(|log| log.risk_level)
            .max()
            .unwrap_or(RiskLevel::Unknown);

        match self.composite_score(stage, logs) {
            Some(score) => format!(
                "Stage {} screening complete. Aggregate risk: {}. Composite score: {}/100 ({}).",
                stage.number(),
                stage_risk.label(),
                score,
                risk_for_score(score).label(),
            ),
            None => format!(
                "Stage {} screening complete. Aggregate risk: {}.",
                stage.number(),
                stage_risk.label(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn draft(stage: u8, check: &str, risk: &str) -> AgentLogDraft {
        AgentLogDraft {
            run_id: Some(format!("run-{check}")),
            agent_name: None,
            stage: ScreeningStage::try_from(stage).expect("valid stage"),
            check_name: check.to_string(),
            risk_level: risk.to_string(),
            recommendation: "PASS".to_string(),
            summary: format!("{check} finished"),
            structured_output: json!({}),
            input_context: json!({}),
            flags: Vec::new(),
            model_used: Some("rule-based".to_string()),
            duration_ms: Some(12),
        }
    }

    fn log(stage: u8, check: &str, risk: &str) -> AgentLog {
        draft(stage, check, risk).into_log(Utc::now())
    }

    #[test]
    fn normalizes_risk_verdicts_case_insensitively() {
        assert_eq!(RiskLevel::normalize(" high "), RiskLevel::High);
        assert_eq!(RiskLevel::normalize("Critical"), RiskLevel::Critical);
        assert_eq!(RiskLevel::normalize("elevated"), RiskLevel::Unknown);
        assert_eq!(RiskLevel::normalize(""), RiskLevel::Unknown);
    }

    #[test]
    fn unknown_outranks_critical_in_aggregation() {
        let engine = ScreeningEngine::new(ChecklistConfig::standard());
        let logs = vec![
            log(1, "sanctions_screening", "CRITICAL"),
            log(1, "registry_lookup", "???"),
        ];
        assert_eq!(engine.derived_risk(&logs), Some(RiskLevel::Unknown));
    }

    #[test]
    fn derived_risk_is_none_without_findings() {
        let engine = ScreeningEngine::new(ChecklistConfig::standard());
        assert_eq!(engine.derived_risk(&[]), None);
    }

    #[test]
    fn stage_completes_only_with_the_full_checklist() {
        let engine = ScreeningEngine::new(ChecklistConfig::standard());
        let mut logs = vec![
            log(1, "identity_verification", "LOW"),
            log(1, "document_consistency", "LOW"),
            log(1, "registry_lookup", "LOW"),
        ];
        assert!(!engine.stage_complete(ScreeningStage::Kyc, &logs));

        logs.push(log(1, "sanctions_screening", "MEDIUM"));
        assert!(engine.stage_complete(ScreeningStage::Kyc, &logs));
    }

    #[test]
    fn duplicate_and_unexpected_checks_do_not_complete_a_stage() {
        let engine = ScreeningEngine::new(ChecklistConfig::standard());
        let logs = vec![
            log(1, "identity_verification", "LOW"),
            log(1, "identity_verification", "LOW"),
            log(1, "adverse_media", "HIGH"),
        ];
        assert!(!engine.stage_complete(ScreeningStage::Kyc, &logs));
    }

    #[test]
    fn stage_two_findings_do_not_count_toward_stage_one() {
        let engine = ScreeningEngine::new(ChecklistConfig::standard());
        let logs = vec![
            log(2, "identity_verification", "LOW"),
            log(2, "document_consistency", "LOW"),
            log(2, "registry_lookup", "LOW"),
            log(2, "sanctions_screening", "LOW"),
        ];
        assert!(!engine.stage_complete(ScreeningStage::Kyc, &logs));
    }

    #[test]
    fn rerun_replaces_the_earlier_verdict() {
        let engine = ScreeningEngine::new(ChecklistConfig::standard());
        let logs = vec![
            log(1, "sanctions_screening", "HIGH"),
            log(1, "sanctions_screening", "LOW"),
        ];
        let verdicts = engine.latest_stage_verdicts(ScreeningStage::Kyc, &logs);
        assert_eq!(verdicts.get("sanctions_screening"), Some(&RiskLevel::Low));
    }

    #[test]
    fn draft_defaults_agent_name_by_stage() {
        let mut stage_one = draft(1, "registry_lookup", "LOW");
        stage_one.agent_name = None;
        assert_eq!(stage_one.into_log(Utc::now()).agent_name, "kyc-agent");

        let mut stage_two = draft(2, "country_risk", "LOW");
        stage_two.agent_name = None;
        assert_eq!(stage_two.into_log(Utc::now()).agent_name, "aml-agent");
    }

    #[test]
    fn completion_remarks_carry_risk_and_score() {
        let engine = ScreeningEngine::new(ChecklistConfig::standard());
        let logs = vec![
            log(1, "identity_verification", "LOW"),
            log(1, "document_consistency", "LOW"),
            log(1, "registry_lookup", "LOW"),
            log(1, "sanctions_screening", "CRITICAL"),
        ];
        let remarks = engine.completion_remarks(ScreeningStage::Kyc, &logs);
        assert!(remarks.starts_with("Stage 1 screening complete."));
        assert!(remarks.contains("CRITICAL"));
        assert!(remarks.contains("/100"));
    }

    #[test]
    fn stage_serializes_as_a_bare_number() {
        let value = serde_json::to_value(ScreeningStage::AmlRisk).expect("stage serializes");
        assert_eq!(value, json!(2));
        let parsed: ScreeningStage = serde_json::from_value(json!(1)).expect("stage parses");
        assert_eq!(parsed, ScreeningStage::Kyc);
        assert!(serde_json::from_value::<ScreeningStage>(json!(3)).is_err());
    }
}
