//! Model value object representing an external model identifier

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// External model identifiers (Value Object)
///
/// Identifiers follow the `vendor/name` convention of the model router the
/// backend talks to. Well-known models get their own variant so they can be
/// given friendly display names; everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Model {
    // Anthropic
    ClaudeSonnet35,
    ClaudeHaiku3,
    ClaudeHaiku45,
    // OpenAI
    Gpt4o,
    Gpt4oMini,
    // Google
    Gemini15Flash,
    // Meta
    Llama31Instruct70b,
    // Custom
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::ClaudeSonnet35 => "anthropic/claude-3.5-sonnet",
            Model::ClaudeHaiku3 => "anthropic/claude-3-haiku",
            Model::ClaudeHaiku45 => "anthropic/claude-haiku-4.5",
            Model::Gpt4o => "openai/gpt-4o",
            Model::Gpt4oMini => "openai/gpt-4o-mini",
            Model::Gemini15Flash => "google/gemini-flash-1.5",
            Model::Llama31Instruct70b => "meta-llama/llama-3.1-70b-instruct",
            Model::Custom(s) => s,
        }
    }

    /// Models offered when no catalog can be fetched
    pub fn default_models() -> Vec<Model> {
        vec![
            Model::ClaudeSonnet35,
            Model::ClaudeHaiku45,
            Model::Gpt4o,
            Model::Gpt4oMini,
        ]
    }

    /// Short display name used in chat transcripts
    ///
    /// Known models map to a friendly name; anything else shows the last path
    /// segment of the identifier, cut to 20 characters.
    pub fn short_name(&self) -> String {
        match self {
            Model::ClaudeSonnet35 => "Claude Sonnet".to_string(),
            Model::ClaudeHaiku3 | Model::ClaudeHaiku45 => "Claude Haiku".to_string(),
            Model::Gpt4o => "GPT-4o".to_string(),
            Model::Gpt4oMini => "GPT-4o Mini".to_string(),
            Model::Gemini15Flash => "Gemini Flash".to_string(),
            Model::Llama31Instruct70b => "Llama 3.1 70B".to_string(),
            Model::Custom(s) => {
                let name = s.rsplit('/').next().unwrap_or(s);
                name.chars().take(20).collect()
            }
        }
    }

    /// Vendor prefix of the identifier (`anthropic`, `openai`, ...), if any
    pub fn vendor(&self) -> Option<&str> {
        self.as_str().split_once('/').map(|(vendor, _)| vendor)
    }

    /// Check if this is a Claude model
    pub fn is_claude(&self) -> bool {
        self.vendor() == Some("anthropic")
    }

    /// Check if this is a GPT model
    pub fn is_gpt(&self) -> bool {
        self.vendor() == Some("openai")
    }

    /// Whether the identifier is blank (an unassigned slot)
    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl Default for Model {
    /// Returns the default model (Claude 3.5 Sonnet)
    fn default() -> Self {
        Model::ClaudeSonnet35
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim() {
            "anthropic/claude-3.5-sonnet" => Model::ClaudeSonnet35,
            "anthropic/claude-3-haiku" => Model::ClaudeHaiku3,
            "anthropic/claude-haiku-4.5" => Model::ClaudeHaiku45,
            "openai/gpt-4o" => Model::Gpt4o,
            "openai/gpt-4o-mini" => Model::Gpt4oMini,
            "google/gemini-flash-1.5" => Model::Gemini15Flash,
            "meta-llama/llama-3.1-70b-instruct" => Model::Llama31Instruct70b,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(model) => model,
            Err(never) => match never {},
        }
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Model::from(s.as_str()))
    }
}
