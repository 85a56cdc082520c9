//! Models offered for role assignment.

use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// Per-token prices as reported by the router (decimal strings)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub prompt: String,
    pub completion: String,
}

/// One selectable model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: Model,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<ModelPricing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u64>,
}

impl ModelInfo {
    pub fn new(id: Model) -> Self {
        Self {
            name: id.short_name(),
            id,
            pricing: None,
            context_length: None,
        }
    }

    /// Whether both prompt and completion cost nothing
    pub fn is_free(&self) -> bool {
        self.pricing.as_ref().is_some_and(|p| {
            is_zero_price(&p.prompt) && is_zero_price(&p.completion)
        })
    }
}

/// Result of a one-token test call to a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelAvailability {
    Working,
    Unavailable(String),
}

impl ModelAvailability {
    pub fn is_working(&self) -> bool {
        matches!(self, ModelAvailability::Working)
    }
}

fn is_zero_price(price: &str) -> bool {
    price.trim().parse::<f64>().is_ok_and(|v| v == 0.0)
}

/// Static list used when no credential is available or the catalog fails
pub fn fallback_catalog() -> Vec<ModelInfo> {
    Model::default_models().into_iter().map(ModelInfo::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_catalog_is_non_empty() {
        let catalog = fallback_catalog();
        assert!(!catalog.is_empty());
        assert_eq!(catalog[0].name, "Claude Sonnet");
    }

    #[test]
    fn test_free_detection() {
        let mut info = ModelInfo::new(Model::from("meta-llama/llama-3-8b:free"));
        assert!(!info.is_free());
        info.pricing = Some(ModelPricing {
            prompt: "0".to_string(),
            completion: "0.0".to_string(),
        });
        assert!(info.is_free());
    }
}
