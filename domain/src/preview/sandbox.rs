//! Isolation of the preview document.
//!
//! Generated code is untrusted. The preview runs in an iframe whose
//! `sandbox` attribute lets scripts, forms and modal dialogs work while
//! withholding the host origin (storage, cookies) and top-level navigation.
//! Those two capabilities have no [`SandboxToken`] variant, so no policy
//! value can grant them.

use super::compositor::{PREVIEW_ERROR_MESSAGE, PreviewDocument};
use std::collections::BTreeSet;

/// Capability that may be granted to the preview frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SandboxToken {
    AllowScripts,
    AllowForms,
    AllowModals,
    AllowPopups,
    AllowDownloads,
}

impl SandboxToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            SandboxToken::AllowScripts => "allow-scripts",
            SandboxToken::AllowForms => "allow-forms",
            SandboxToken::AllowModals => "allow-modals",
            SandboxToken::AllowPopups => "allow-popups",
            SandboxToken::AllowDownloads => "allow-downloads",
        }
    }
}

/// Set of capabilities granted to the preview frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxPolicy {
    tokens: BTreeSet<SandboxToken>,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self {
            tokens: [
                SandboxToken::AllowScripts,
                SandboxToken::AllowForms,
                SandboxToken::AllowModals,
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl SandboxPolicy {
    /// A policy granting nothing
    pub fn locked() -> Self {
        Self {
            tokens: BTreeSet::new(),
        }
    }

    pub fn with(mut self, token: SandboxToken) -> Self {
        self.tokens.insert(token);
        self
    }

    pub fn allows(&self, token: SandboxToken) -> bool {
        self.tokens.contains(&token)
    }

    /// Value of the iframe `sandbox` attribute
    pub fn attribute(&self) -> String {
        self.tokens
            .iter()
            .map(SandboxToken::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A preview document wrapped for display inside a sandboxed iframe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxedFrame {
    document: PreviewDocument,
    policy: SandboxPolicy,
    title: String,
}

impl SandboxedFrame {
    pub fn new(document: PreviewDocument, policy: SandboxPolicy) -> Self {
        Self {
            document,
            policy,
            title: "Preview".to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn document(&self) -> &PreviewDocument {
        &self.document
    }

    pub fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }

    /// The `<iframe>` element carrying the document as `srcdoc`
    pub fn iframe(&self) -> String {
        format!(
            r#"<iframe title="{}" sandbox="{}" referrerpolicy="no-referrer" srcdoc="{}"></iframe>"#,
            escape_attribute(&self.title),
            self.policy.attribute(),
            escape_attribute(self.document.as_str()),
        )
    }

    /// Host page embedding the frame and echoing reported errors to the console
    pub fn host_page(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>html, body {{ margin: 0; height: 100%; }} iframe {{ border: 0; width: 100%; height: 100%; }}</style>
</head>
<body>
{iframe}
<script>
window.addEventListener("message", function (event) {{
  if (event.data && event.data.type === "{kind}") {{
    console.warn("[preview]", event.data.message, event.data.source + ":" + event.data.line);
  }}
}});
</script>
</body>
</html>
"#,
            title = escape_attribute(&self.title),
            iframe = self.iframe(),
            kind = PREVIEW_ERROR_MESSAGE,
        )
    }
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
