//! Role configuration (`[roles.<key>]` tables)

use codeagent_domain::{
    ConfigIssue, ConfigIssueCode, Model, RoleKey, RoleRegistry, RoleUpdate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One `[roles.<key>]` table
///
/// ```toml
/// [roles.planner]
/// enabled = true
/// model = "openai/gpt-4o"
///
/// [roles.coder]
/// model = "anthropic/claude-3.5-sonnet"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRoleConfig {
    pub enabled: Option<bool>,
    pub model: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

/// Build the role registry: the built-in default (coder on the default
/// model) with every configured table merged over it.
pub fn build_registry(
    tables: &BTreeMap<String, FileRoleConfig>,
) -> (RoleRegistry, Vec<ConfigIssue>) {
    let mut registry = RoleRegistry::default();
    let mut issues = Vec::new();

    for (name, table) in tables {
        let key: RoleKey = match name.parse() {
            Ok(key) => key,
            Err(e) => {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::UnknownRole,
                    format!("roles.{name}: {e}; table ignored"),
                ));
                continue;
            }
        };

        let mut update = RoleUpdate {
            enabled: table.enabled,
            display_name: table.display_name.clone(),
            description: table.description.clone(),
            ..Default::default()
        };
        match table.model.as_deref() {
            None => {}
            Some(model) if model.trim().is_empty() => issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyModelName,
                format!("roles.{name}.model: model name cannot be empty"),
            )),
            Some(model) => update.model = Some(Some(Model::from(model.trim()))),
        }
        registry.update(key, update);
    }

    if !registry.has_active_role() {
        issues.push(ConfigIssue::warning(
            ConfigIssueCode::NoActiveRole,
            "no role is both enabled and assigned a model; requests will be refused",
        ));
    }

    (registry, issues)
}
