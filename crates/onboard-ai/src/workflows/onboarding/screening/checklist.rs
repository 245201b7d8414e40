use super::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One expected check within a screening stage. The weight sets how much the
/// check's verdict moves the stage's composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckDefinition {
    pub name: String,
    pub weight: f32,
}

impl CheckDefinition {
    pub fn new(name: &str, weight: f32) -> Self {
        Self {
            name: name.to_string(),
            weight,
        }
    }
}

/// The full set of checks a stage must see before it counts as complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageChecklist {
    pub checks: Vec<CheckDefinition>,
}

impl StageChecklist {
    pub fn new(checks: Vec<CheckDefinition>) -> Self {
        Self { checks }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|check| check.name.as_str())
    }

    /// Complete means every configured check has reported. Extra names in
    /// `reported` are ignored.
    pub fn is_complete(&self, reported: &HashSet<&str>) -> bool {
        self.names().all(|name| reported.contains(name))
    }

    /// Weighted mean of the reported verdicts, 0 to 100. Checks that have not
    /// reported carry no weight yet; `None` until at least one has.
    pub fn composite_score(&self, verdicts: &HashMap<String, RiskLevel>) -> Option<u8> {
        let mut weighted = 0.0f32;
        let mut total_weight = 0.0f32;

        for check in &self.checks {
            if let Some(risk) = verdicts.get(&check.name) {
                weighted += f32::from(risk.score()) * check.weight;
                total_weight += check.weight;
            }
        }

        if total_weight == 0.0 {
            return None;
        }

        Some((weighted / total_weight).round() as u8)
    }
}

/// Check-name sets for both screening stages. Supplied to the service as
/// configuration so deployments can tune the pipeline without a rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistConfig {
    pub stage_one: StageChecklist,
    pub stage_two: StageChecklist,
}

impl ChecklistConfig {
    /// The standard pipeline: four KYC checks, three AML risk checks.
    pub fn standard() -> Self {
        Self {
            stage_one: StageChecklist::new(vec![
                CheckDefinition::new("identity_verification", 1.5),
                CheckDefinition::new("document_consistency", 1.0),
                CheckDefinition::new("registry_lookup", 1.5),
                CheckDefinition::new("sanctions_screening", 3.0),
            ]),
            stage_two: StageChecklist::new(vec![
                CheckDefinition::new("country_risk", 2.0),
                CheckDefinition::new("transaction_volume", 1.5),
                CheckDefinition::new("aml_questionnaire", 1.0),
            ]),
        }
    }

    pub fn stage(&self, stage: super::ScreeningStage) -> &StageChecklist {
        match stage {
            super::ScreeningStage::Kyc => &self.stage_one,
            super::ScreeningStage::AmlRisk => &self.stage_two,
        }
    }
}

/// Risk band for a composite score, used for reviewer-facing summaries.
pub const fn risk_for_score(score: u8) -> RiskLevel {
    match score {
        76..=u8::MAX => RiskLevel::Critical,
        51..=75 => RiskLevel::High,
        26..=50 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}
