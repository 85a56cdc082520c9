//! Implementation plan reported by a consensus session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: String,
    pub description: String,
    /// Free-form category such as `frontend`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusPlan {
    pub name: String,
    pub steps: Vec<PlanStep>,
}

impl ConsensusPlan {
    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }
}

fn json_value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a plan object leniently.
///
/// Step ids may be numbers or strings and default to their 1-based
/// position. Returns `None` when `steps` is missing or empty.
pub fn parse_plan_json(json: &serde_json::Value) -> Option<ConsensusPlan> {
    let steps = json.get("steps").and_then(|v| v.as_array())?;
    if steps.is_empty() {
        return None;
    }

    let name = json
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("Untitled project")
        .to_string();

    let steps = steps
        .iter()
        .enumerate()
        .map(|(index, step)| PlanStep {
            id: step
                .get("id")
                .and_then(json_value_to_string)
                .unwrap_or_else(|| format!("{}", index + 1)),
            description: step
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("No description")
                .to_string(),
            kind: step
                .get("type")
                .or_else(|| step.get("kind"))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            files: step
                .get("files")
                .and_then(|v| v.as_array())
                .map(|files| files.iter().filter_map(json_value_to_string).collect())
                .unwrap_or_default(),
        })
        .collect();

    Some(ConsensusPlan { name, steps })
}
