//! Per-session settings passed explicitly into the workspace.

use codeagent_domain::{DispatchMode, RoutingMode};

/// API key for the model router
///
/// `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().trim().to_string())
    }

    /// `None` for blank keys
    pub fn from_optional(key: Option<String>) -> Option<Self> {
        key.map(Self::new).filter(|c| !c.is_blank())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    /// Key with everything but the last four characters masked
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), tail)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSettings {
    pub credential: Option<Credential>,
    pub routing_mode: RoutingMode,
    pub dispatch_mode: DispatchMode,
}

impl SessionSettings {
    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential.filter(|c| !c.is_blank());
        self
    }

    pub fn with_routing_mode(mut self, mode: RoutingMode) -> Self {
        self.routing_mode = mode;
        self
    }

    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }

    /// The credential, if one is set and non-blank
    pub fn usable_credential(&self) -> Option<&Credential> {
        self.credential.as_ref().filter(|c| !c.is_blank())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let credential = Credential::new("sk-or-secret-1234");
        assert_eq!(format!("{credential:?}"), "Credential(<redacted>)");
        assert_eq!(credential.masked(), "*************1234");
    }

    #[test]
    fn test_blank_credential_is_unusable() {
        assert!(Credential::from_optional(Some("   ".to_string())).is_none());
        let settings = SessionSettings::default().with_credential(Some(Credential::new("")));
        assert!(settings.usable_credential().is_none());
    }
}
