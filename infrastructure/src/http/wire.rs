//! JSON bodies exchanged with the agent backend.

use codeagent_domain::{
    ChatRequest, ConsensusPhase, DiscussionEntry, ModelAvailability, ModelInfo, ModelPricing,
    ModelReply, RoutingSpec, SessionSnapshot, SessionState, parse_plan_json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

// ==================== POST /chat ====================

#[derive(Debug, Serialize)]
pub(crate) struct ChatBody<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<WireRole<'a>>>,
    pub api_key: &'a str,
    pub conversation_history: Vec<WireHistory<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<&'a str>,
    pub consensus: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireRole<'a> {
    pub role: &'a str,
    pub model: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireHistory<'a> {
    pub role: &'a str,
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
}

impl<'a> ChatBody<'a> {
    pub fn new(request: &'a ChatRequest, api_key: &'a str) -> Self {
        let (models, roles) = match &request.routing {
            RoutingSpec::FlatModels(models) => {
                (Some(models.iter().map(|m| m.as_str()).collect()), None)
            }
            RoutingSpec::RoleChain(chain) => (
                // Older backends only read `models`; send both
                Some(chain.iter().map(|a| a.model.as_str()).collect()),
                Some(
                    chain
                        .iter()
                        .map(|a| WireRole {
                            role: a.role.as_str(),
                            model: a.model.as_str(),
                        })
                        .collect(),
                ),
            ),
        };

        Self {
            message: &request.message,
            models,
            roles,
            api_key,
            conversation_history: request
                .history
                .iter()
                .map(|h| WireHistory {
                    role: h.role.as_str(),
                    content: &h.content,
                    model: h.model.as_ref().map(|m| m.as_str()),
                })
                .collect(),
            image: request.image.as_ref().map(|i| i.url.as_str()),
            consensus: request.mode.is_consensus(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseBody {
    #[serde(default)]
    pub responses: Option<Vec<ModelReply>>,
    #[serde(default)]
    pub session_id: Option<String>,
}

// ==================== GET /consensus/{token} ====================

#[derive(Debug, Deserialize)]
pub(crate) struct WireEntry {
    #[serde(default)]
    pub agent: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    #[serde(default)]
    pub consensus_messages: Vec<WireEntry>,
    #[serde(default)]
    pub plan: Option<Value>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub files: BTreeMap<String, String>,
    #[serde(default)]
    pub completed_steps: Option<usize>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusBody {
    pub fn into_snapshot(self) -> SessionSnapshot {
        let state = match self.status.as_deref() {
            None => SessionState::Running,
            Some(label) => SessionState::from_label(label).unwrap_or_else(|| {
                debug!("Unknown session status '{}'; treating as running", label);
                SessionState::Running
            }),
        };

        SessionSnapshot {
            discussion: self
                .consensus_messages
                .into_iter()
                .map(|e| DiscussionEntry {
                    agent: e.agent,
                    content: e.content,
                    kind: if e.kind.is_empty() {
                        "discussion".to_string()
                    } else {
                        e.kind
                    },
                    timestamp: e.timestamp,
                })
                .collect(),
            plan: self.plan.as_ref().and_then(parse_plan_json),
            phase: self.phase.as_deref().and_then(ConsensusPhase::from_label),
            files: self.files,
            completed_steps: self.completed_steps,
            state,
            error: self.error.filter(|e| !e.trim().is_empty()),
        }
    }
}

// ==================== GET /models ====================

#[derive(Debug, Deserialize)]
pub(crate) struct ModelsBody {
    #[serde(default)]
    pub data: Vec<WireModel>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireModel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pricing: Option<ModelPricing>,
    #[serde(default)]
    pub context_length: Option<u64>,
}

impl ModelsBody {
    pub fn into_models(self) -> Vec<ModelInfo> {
        self.data
            .into_iter()
            .filter(|m| !m.id.trim().is_empty())
            .map(|m| {
                let mut info = ModelInfo::new(m.id.as_str().into());
                if let Some(name) = m.name.filter(|n| !n.is_empty()) {
                    info.name = name;
                }
                info.pricing = m.pricing;
                info.context_length = m.context_length;
                info
            })
            .collect()
    }
}

// ==================== POST /ping-model ====================

#[derive(Debug, Deserialize)]
pub(crate) struct PingBody {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl PingBody {
    pub fn into_availability(self) -> ModelAvailability {
        if self.status.eq_ignore_ascii_case("working") {
            return ModelAvailability::Working;
        }
        ModelAvailability::Unavailable(
            self.error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or(self.status),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeagent_domain::{
        DispatchMode, HistoryEntry, MessageRole, Model, RoleAssignment, RoleKey,
    };
    use serde_json::json;

    fn request(routing: RoutingSpec) -> ChatRequest {
        ChatRequest {
            message: "make a clock".to_string(),
            routing,
            history: vec![
                HistoryEntry {
                    role: MessageRole::User,
                    content: "hello".to_string(),
                    model: None,
                },
                HistoryEntry {
                    role: MessageRole::Assistant,
                    content: "done".to_string(),
                    model: Some(Model::Gpt4o),
                },
            ],
            image: None,
            mode: DispatchMode::Consensus,
        }
    }

    #[test]
    fn test_role_chain_body() {
        let request = request(RoutingSpec::RoleChain(vec![RoleAssignment {
            role: RoleKey::Coder,
            model: Model::Gpt4o,
        }]));
        let body = serde_json::to_value(ChatBody::new(&request, "sk")).unwrap();

        assert_eq!(body["roles"], json!([{ "role": "coder", "model": "openai/gpt-4o" }]));
        assert_eq!(body["models"], json!(["openai/gpt-4o"]));
        assert_eq!(
            body["conversation_history"],
            json!([
                { "role": "user", "content": "hello" },
                { "role": "assistant", "content": "done", "model": "openai/gpt-4o" }
            ])
        );
        assert_eq!(body["consensus"], json!(true));
        assert!(body.get("image").is_none());
    }

    #[test]
    fn test_flat_body_has_no_roles() {
        let request = request(RoutingSpec::FlatModels(vec![Model::Gpt4o]));
        let body = serde_json::to_value(ChatBody::new(&request, "sk")).unwrap();
        assert!(body.get("roles").is_none());
    }

    #[test]
    fn test_status_body_to_snapshot() {
        let body: StatusBody = serde_json::from_value(json!({
            "status": "in_progress",
            "phase": "coding",
            "completed_steps": 1,
            "plan": { "name": "Clock", "steps": [{ "id": 1 }, { "id": 2 }, { "id": 3 }] },
            "files": { "index.html": "<h1>Clock</h1>" },
            "consensus_messages": [
                { "agent": "Claude", "content": "Plan ready", "type": "plan" },
                { "agent": "GPT", "content": "Agreed" }
            ]
        }))
        .unwrap();
        let snapshot = body.into_snapshot();

        assert_eq!(snapshot.state, SessionState::Running);
        assert_eq!(snapshot.plan.unwrap().total_steps(), 3);
        assert_eq!(snapshot.completed_steps, Some(1));
        assert_eq!(snapshot.discussion[0].kind, "plan");
        assert_eq!(snapshot.discussion[1].kind, "discussion");
        assert_eq!(snapshot.files.len(), 1);
    }

    #[test]
    fn test_failed_status_keeps_error() {
        let body: StatusBody =
            serde_json::from_value(json!({ "status": "error", "error": "rate limited" })).unwrap();
        let snapshot = body.into_snapshot();
        assert_eq!(snapshot.state, SessionState::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("rate limited"));
    }

    #[test]
    fn test_models_body() {
        let body: ModelsBody = serde_json::from_value(json!({
            "data": [
                { "id": "openai/gpt-4o", "name": "GPT-4o", "context_length": 128000,
                  "pricing": { "prompt": "0.000005", "completion": "0.000015" } },
                { "id": "" }
            ]
        }))
        .unwrap();
        let models = body.into_models();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, Model::Gpt4o);
        assert_eq!(models[0].name, "GPT-4o");
        assert!(!models[0].is_free());
    }

    #[test]
    fn test_ping_body() {
        let working: PingBody =
            serde_json::from_value(json!({ "status": "working", "model": "openai/gpt-4o" }))
                .unwrap();
        assert_eq!(working.into_availability(), ModelAvailability::Working);

        let refused: PingBody = serde_json::from_value(json!({
            "status": "unavailable", "model": "openai/gpt-4o", "error": "No endpoints found"
        }))
        .unwrap();
        assert_eq!(
            refused.into_availability(),
            ModelAvailability::Unavailable("No endpoints found".to_string())
        );
    }
}
