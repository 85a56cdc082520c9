//! How a request is spread across models.

use crate::core::model::Model;
use crate::roles::registry::RoleRegistry;
use crate::roles::role::RoleKey;
use serde::{Deserialize, Serialize};

/// Whether the backend receives the ordered role chain or a flat model list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    #[default]
    Roles,
    Flat,
}

impl RoutingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingMode::Roles => "roles",
            RoutingMode::Flat => "flat",
        }
    }
}

impl std::str::FromStr for RoutingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "roles" | "role" | "chain" => Ok(RoutingMode::Roles),
            "flat" | "models" => Ok(RoutingMode::Flat),
            other => Err(format!("invalid routing mode '{other}' (expected roles or flat)")),
        }
    }
}

/// One step of a role chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: RoleKey,
    pub model: Model,
}

/// Routing of one request (Value Object)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingSpec {
    /// Every model answers the same prompt independently
    FlatModels(Vec<Model>),
    /// Roles run in declared order, each on its own model
    RoleChain(Vec<RoleAssignment>),
}

impl RoutingSpec {
    /// Routing for the active roles of `registry`
    pub fn from_registry(registry: &RoleRegistry, mode: RoutingMode) -> Self {
        match mode {
            RoutingMode::Flat => RoutingSpec::FlatModels(registry.active_models()),
            RoutingMode::Roles => RoutingSpec::RoleChain(
                registry
                    .active_roles()
                    .into_iter()
                    .filter_map(|entry| {
                        entry.assigned_model().map(|model| RoleAssignment {
                            role: entry.key,
                            model: model.clone(),
                        })
                    })
                    .collect(),
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RoutingSpec::FlatModels(models) => models.is_empty(),
            RoutingSpec::RoleChain(chain) => chain.is_empty(),
        }
    }

    /// Models involved, in routing order (may repeat for role chains)
    pub fn models(&self) -> Vec<&Model> {
        match self {
            RoutingSpec::FlatModels(models) => models.iter().collect(),
            RoutingSpec::RoleChain(chain) => chain.iter().map(|a| &a.model).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::role::RoleUpdate;

    fn two_role_registry() -> RoleRegistry {
        let mut registry = RoleRegistry::unassigned();
        registry.update(RoleKey::Reviewer, RoleUpdate::assign(Model::Gpt4o).with_enabled(true));
        registry.update(RoleKey::Coder, RoleUpdate::assign(Model::Gpt4o).with_enabled(true));
        registry
    }

    #[test]
    fn test_role_chain_follows_declared_order() {
        let spec = RoutingSpec::from_registry(&two_role_registry(), RoutingMode::Roles);
        let RoutingSpec::RoleChain(chain) = spec else {
            panic!("expected role chain");
        };
        let roles: Vec<_> = chain.iter().map(|a| a.role).collect();
        assert_eq!(roles, vec![RoleKey::Coder, RoleKey::Reviewer]);
    }

    #[test]
    fn test_flat_models_are_distinct() {
        let spec = RoutingSpec::from_registry(&two_role_registry(), RoutingMode::Flat);
        assert_eq!(spec, RoutingSpec::FlatModels(vec![Model::Gpt4o]));
    }

    #[test]
    fn test_empty_registry_gives_empty_routing() {
        let spec = RoutingSpec::from_registry(&RoleRegistry::unassigned(), RoutingMode::Roles);
        assert!(spec.is_empty());
    }

    #[test]
    fn test_parse_routing_mode() {
        assert_eq!("Flat".parse::<RoutingMode>(), Ok(RoutingMode::Flat));
        assert_eq!("roles".parse::<RoutingMode>(), Ok(RoutingMode::Roles));
        assert!("round-robin".parse::<RoutingMode>().is_err());
    }
}
