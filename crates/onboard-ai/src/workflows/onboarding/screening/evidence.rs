use super::AgentLog;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Side-by-side view of one submitted field and the value an agent extracted
/// from the uploaded documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldComparison {
    pub field: String,
    pub submitted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted: Option<String>,
    pub matches: bool,
}

/// Build the evidence panel for a case.
///
/// Agents publish extracted values under the `extracted` object of their
/// structured output, keyed by field name. When a check re-runs, the later
/// extraction replaces the earlier one. A field no agent extracted is shown
/// without a value and never counts as a match.
pub fn compare_fields(submitted: &[(&'static str, &str)], logs: &[AgentLog]) -> Vec<FieldComparison> {
    let mut extracted: HashMap<String, String> = HashMap::new();
    for log in logs {
        if let Some(values) = log.structured_output.get("extracted").and_then(Value::as_object) {
            for (field, value) in values {
                if let Some(text) = value.as_str() {
                    extracted.insert(field.clone(), text.to_string());
                }
            }
        }
    }

    submitted
        .iter()
        .map(|(field, value)| {
            let agent_value = extracted.get(*field).cloned();
            let matches = agent_value
                .as_deref()
                .map(|candidate| comparable(candidate) == comparable(value))
                .unwrap_or(false);

            FieldComparison {
                field: (*field).to_string(),
                submitted: (*value).to_string(),
                extracted: agent_value,
                matches,
            }
        })
        .collect()
}

/// Canonical form for comparison: invisible characters stripped, runs of
/// whitespace collapsed, everything lowercased. Formatting differences are
/// not mismatches; real content differences are.
fn comparable(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_ascii_lowercase()
}
