//! The full set of role entries.

use super::role::{RoleEntry, RoleKey, RoleUpdate};
use crate::core::model::Model;
use serde::{Deserialize, Deserializer, Serialize};

/// All role entries in declared order (Entity)
///
/// The registry always holds exactly one entry per [`RoleKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoleRegistry {
    entries: Vec<RoleEntry>,
}

impl Default for RoleRegistry {
    /// Only the coder is enabled, on the default model
    fn default() -> Self {
        let mut registry = Self::unassigned();
        registry.update(
            RoleKey::Coder,
            RoleUpdate::assign(Model::default()).with_enabled(true),
        );
        registry
    }
}

impl RoleRegistry {
    /// Every role disabled and without a model
    pub fn unassigned() -> Self {
        Self {
            entries: RoleKey::ALL.into_iter().map(RoleEntry::new).collect(),
        }
    }

    /// Build from arbitrary entries; missing roles get defaults, duplicates
    /// keep the last entry.
    pub fn from_entries(entries: impl IntoIterator<Item = RoleEntry>) -> Self {
        let mut registry = Self::unassigned();
        for entry in entries {
            if let Some(slot) = registry.entries.iter_mut().find(|e| e.key == entry.key) {
                *slot = entry;
            }
        }
        registry
    }

    pub fn get(&self, key: RoleKey) -> &RoleEntry {
        // One entry per key is a construction invariant
        &self.entries[key as usize]
    }

    pub fn entries(&self) -> &[RoleEntry] {
        &self.entries
    }

    /// Merge `update` into the entry for `key`
    pub fn update(&mut self, key: RoleKey, update: RoleUpdate) -> &RoleEntry {
        let entry = &mut self.entries[key as usize];
        update.apply_to(entry);
        entry
    }

    /// Enabled roles with a model, in declared order
    pub fn active_roles(&self) -> Vec<&RoleEntry> {
        self.entries.iter().filter(|e| e.is_active()).collect()
    }

    pub fn has_active_role(&self) -> bool {
        self.entries.iter().any(RoleEntry::is_active)
    }

    /// Distinct models of the active roles, first occurrence first
    pub fn active_models(&self) -> Vec<Model> {
        let mut models: Vec<Model> = Vec::new();
        for entry in self.active_roles() {
            if let Some(model) = entry.assigned_model()
                && !models.contains(model)
            {
                models.push(model.clone());
            }
        }
        models
    }
}

impl<'de> Deserialize<'de> for RoleRegistry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<RoleEntry>::deserialize(deserializer)?;
        Ok(Self::from_entries(entries))
    }
}
