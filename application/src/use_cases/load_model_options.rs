//! Models offered for role assignment.

use crate::config::Credential;
use crate::ports::chat_dispatch::ModelCatalog;
use codeagent_domain::{Model, ModelAvailability, ModelInfo, fallback_catalog};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Remote,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct ModelOptions {
    pub models: Vec<ModelInfo>,
    pub source: CatalogSource,
    /// Why the fallback list is shown, when the remote catalog failed
    pub warning: Option<String>,
}

pub struct LoadModelOptions {
    catalog: Arc<dyn ModelCatalog>,
}

impl LoadModelOptions {
    pub fn new(catalog: Arc<dyn ModelCatalog>) -> Self {
        Self { catalog }
    }

    /// Never fails: without a credential, or when the catalog errors or is
    /// empty, the static list is returned instead.
    pub async fn execute(&self, credential: Option<&Credential>) -> ModelOptions {
        let Some(credential) = credential.filter(|c| !c.is_blank()) else {
            debug!("No credential; offering the built-in model list");
            return Self::fallback(None);
        };

        match self.catalog.list_models(credential).await {
            Ok(models) if !models.is_empty() => {
                debug!("Model catalog returned {} models", models.len());
                ModelOptions {
                    models,
                    source: CatalogSource::Remote,
                    warning: None,
                }
            }
            Ok(_) => {
                warn!("Model catalog is empty; using the built-in list");
                Self::fallback(Some("The model catalog is empty".to_string()))
            }
            Err(e) => {
                warn!("Model catalog unavailable: {}", e);
                Self::fallback(Some(format!("Model catalog unavailable: {e}")))
            }
        }
    }

    /// Check one model before assigning it. Transport failures are reported
    /// as unavailable so the caller has a single answer to show.
    pub async fn ping(&self, model: &Model, credential: Option<&Credential>) -> ModelAvailability {
        let Some(credential) = credential.filter(|c| !c.is_blank()) else {
            return ModelAvailability::Unavailable("No API key configured".to_string());
        };

        match self.catalog.ping(model, credential).await {
            Ok(availability) => {
                info!("Model {} availability: {:?}", model, availability);
                availability
            }
            Err(e) => {
                warn!("Pinging {} failed: {}", model, e);
                ModelAvailability::Unavailable(e.to_string())
            }
        }
    }

    fn fallback(warning: Option<String>) -> ModelOptions {
        ModelOptions {
            models: fallback_catalog(),
            source: CatalogSource::Fallback,
            warning,
        }
    }
}
