//! Preview Compositor.
//!
//! Builds a single self-contained document from the markup, stylesheet and
//! script artifacts. Composition is a pure function of the store snapshot:
//! the same snapshot always yields byte-identical output.

use crate::artifact::file_kind::{FileKind, SCRIPT_FILE, STYLESHEET_FILE};
use crate::artifact::store::ArtifactStore;
use regex::Regex;
use std::sync::LazyLock;

/// Responsive viewport directive injected when the markup has none
pub const VIEWPORT_META: &str =
    r#"<meta name="viewport" content="width=device-width, initial-scale=1.0">"#;

/// Message type posted to the parent frame for uncaught errors
pub const PREVIEW_ERROR_MESSAGE: &str = "preview-error";

const EMPTY_DOCUMENT: &str = "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n</head>\n<body>\n</body>\n</html>\n";

const ERROR_GUARD: &str = r#"<script>
(function () {
  function report(message, source, line) {
    try {
      window.parent.postMessage({ type: "preview-error", message: String(message), source: source || "", line: line || 0 }, "*");
    } catch (_) {}
  }
  window.addEventListener("error", function (event) {
    report(event.message, event.filename, event.lineno);
    event.preventDefault();
  });
  window.addEventListener("unhandledrejection", function (event) {
    report(event.reason, "", 0);
    event.preventDefault();
  });
})();
</script>
"#;

static LOCAL_STYLESHEET_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<link\b[^>]*\bhref\s*=\s*["']?(?:\./)?style\.css["']?[^>]*>[ \t]*\r?\n?"#)
        .expect("stylesheet link pattern")
});
static LOCAL_SCRIPT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<script\b[^>]*\bsrc\s*=\s*["']?(?:\./)?script\.js["']?[^>]*>\s*</script\s*>[ \t]*\r?\n?"#,
    )
    .expect("script tag pattern")
});
static VIEWPORT_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\b[^>]*\bname\s*=\s*["']?viewport\b"#).expect("viewport pattern")
});
static HEAD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head\b[^>]*>").expect("head pattern"));
static HEAD_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head\s*>").expect("head close pattern"));
static HTML_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html\b[^>]*>").expect("html pattern"));
static DOCTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!doctype\b[^>]*>").expect("doctype pattern"));
static BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body\b").expect("body pattern"));
static BODY_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</body\s*>").expect("body close pattern"));
static CLOSING_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(style)").expect("closing style pattern"));
static CLOSING_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(script)").expect("closing script pattern"));

/// A composed, self-contained HTML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewDocument(String);

impl PreviewDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for PreviewDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document for the live preview frame, including the error guard
pub fn compose(store: &ArtifactStore) -> PreviewDocument {
    compose_document(store, true)
}

/// Document for download; identical to [`compose`] minus the error guard
pub fn export_standalone(store: &ArtifactStore) -> PreviewDocument {
    compose_document(store, false)
}

fn compose_document(store: &ArtifactStore, guard: bool) -> PreviewDocument {
    let markup = store
        .first_of_kind(FileKind::Markup)
        .map(|(_, content)| content)
        .filter(|content| !content.trim().is_empty())
        .unwrap_or(EMPTY_DOCUMENT);

    let mut html = strip_local_references(markup);
    html = ensure_head(html);
    html = ensure_viewport(html);

    let mut head_extras = String::new();
    if let Some(css) = store.get(STYLESHEET_FILE).filter(|c| !c.trim().is_empty()) {
        let css = CLOSING_STYLE.replace_all(css, r"<\/$1");
        head_extras.push_str(&format!("<style>\n{}\n</style>\n", css.trim_end()));
    }
    if guard {
        head_extras.push_str(ERROR_GUARD);
    }
    if !head_extras.is_empty() {
        html = insert_before_head_close(html, &head_extras);
    }

    if let Some(js) = store.get(SCRIPT_FILE).filter(|c| !c.trim().is_empty()) {
        let js = CLOSING_SCRIPT.replace_all(js, r"<\/$1");
        let tag = format!("<script>\n{}\n</script>\n", js.trim_end());
        html = insert_before_body_close(html, &tag);
    }

    PreviewDocument(html)
}

/// Whether the markup already carries a viewport directive
pub fn has_viewport(html: &str) -> bool {
    VIEWPORT_DIRECTIVE.is_match(html)
}

fn strip_local_references(markup: &str) -> String {
    let without_links = LOCAL_STYLESHEET_LINK.replace_all(markup, "");
    LOCAL_SCRIPT_TAG.replace_all(&without_links, "").into_owned()
}

fn ensure_head(html: String) -> String {
    match HEAD_OPEN.find(&html) {
        Some(open) => {
            if HEAD_CLOSE.is_match(&html) {
                return html;
            }
            let at = BODY_OPEN
                .find_at(&html, open.end())
                .map_or(open.end(), |body| body.start());
            splice(&html, at, "</head>\n")
        }
        None => {
            let at = HTML_OPEN
                .find(&html)
                .or_else(|| DOCTYPE.find(&html))
                .map_or(0, |m| m.end());
            let prefix = if at == 0 { "" } else { "\n" };
            splice(&html, at, &format!("{prefix}<head>\n</head>\n"))
        }
    }
}

fn ensure_viewport(html: String) -> String {
    if has_viewport(&html) {
        return html;
    }
    match HEAD_OPEN.find(&html) {
        Some(open) => splice(&html, open.end(), &format!("\n{VIEWPORT_META}")),
        None => format!("{VIEWPORT_META}\n{html}"),
    }
}

fn insert_before_head_close(html: String, fragment: &str) -> String {
    match HEAD_CLOSE.find(&html) {
        Some(close) => splice(&html, close.start(), fragment),
        None => format!("{fragment}{html}"),
    }
}

fn insert_before_body_close(html: String, fragment: &str) -> String {
    match BODY_CLOSE.find_iter(&html).last() {
        Some(close) => splice(&html, close.start(), fragment),
        None => {
            let mut html = html;
            if !html.ends_with('\n') {
                html.push('\n');
            }
            html.push_str(fragment);
            html
        }
    }
}

fn splice(html: &str, at: usize, fragment: &str) -> String {
    let mut out = String::with_capacity(html.len() + fragment.len());
    out.push_str(&html[..at]);
    out.push_str(fragment);
    out.push_str(&html[at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn store_of(entries: &[(&str, &str)]) -> ArtifactStore {
        let files: BTreeMap<String, String> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ArtifactStore::from_files(files, None).unwrap()
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_inlines_style_and_script() {
        let store = store_of(&[
            (
                "index.html",
                "<!DOCTYPE html>\n<html>\n<head>\n<link rel=\"stylesheet\" href=\"style.css\">\n</head>\n<body>\n<h1>Clock</h1>\n<script src=\"script.js\"></script>\n</body>\n</html>",
            ),
            ("style.css", "h1 { color: red; }"),
            ("script.js", "console.log(1);"),
        ]);
        let doc = compose(&store);
        let html = doc.as_str();

        assert!(!html.contains("href=\"style.css\""));
        assert!(!html.contains("src=\"script.js\""));

        let style = html.find("h1 { color: red; }").unwrap();
        let head_close = html.find("</head>").unwrap();
        assert!(style < head_close);

        let script = html.find("console.log(1);").unwrap();
        let body_close = html.rfind("</body>").unwrap();
        assert!(script < body_close);
        assert!(script > html.find("<h1>Clock</h1>").unwrap());
    }

    #[test]
    fn test_composition_is_deterministic() {
        let store = ArtifactStore::scaffold();
        assert_eq!(compose(&store), compose(&store));
        assert_eq!(export_standalone(&store), export_standalone(&store));
    }

    #[test]
    fn test_viewport_injected_at_most_once() {
        let store = ArtifactStore::scaffold();
        let first = compose(&store);
        assert_eq!(count(first.as_str(), "name=\"viewport\""), 1);

        // Composing an already composed document does not add another
        let again = store_of(&[("index.html", first.as_str())]);
        let second = compose(&again);
        assert_eq!(count(second.as_str(), "name=\"viewport\""), 1);
    }

    #[test]
    fn test_existing_viewport_is_kept() {
        let store = store_of(&[(
            "index.html",
            "<html><head><META NAME='viewport' content='width=320'></head><body></body></html>",
        )]);
        let html = compose(&store).into_string();
        assert!(!html.contains(VIEWPORT_META));
        assert!(html.contains("width=320"));
    }

    #[test]
    fn test_missing_head_is_created() {
        let store = store_of(&[("index.html", "<html><body><p>hi</p></body></html>")]);
        let html = compose(&store).into_string();
        let head = html.find("<head>").unwrap();
        assert!(head < html.find("<body>").unwrap());
        assert!(html.contains(VIEWPORT_META));
    }

    #[test]
    fn test_fragment_without_body_gets_script_appended() {
        let store = store_of(&[("index.html", "<p>fragment</p>"), ("script.js", "go();")]);
        let html = compose(&store).into_string();
        assert!(html.starts_with("<head>"));
        assert!(html.trim_end().ends_with("</script>"));
    }

    #[test]
    fn test_empty_project_falls_back_to_minimal_document() {
        let store = store_of(&[("notes.md", "# todo")]);
        let html = compose(&store).into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<body>"));
    }

    #[test]
    fn test_other_markup_file_used_without_index() {
        let store = store_of(&[("about.html", "<body><p>about</p></body>")]);
        assert!(compose(&store).as_str().contains("<p>about</p>"));
    }

    #[test]
    fn test_script_end_tags_are_escaped() {
        let store = store_of(&[
            ("index.html", "<html><head></head><body></body></html>"),
            ("script.js", "var s = '</script><b>x</b>';"),
            ("style.css", "/* </STYLE> */"),
        ]);
        let html = compose(&store).into_string();
        assert!(html.contains(r"<\/script><b>x</b>"));
        assert!(html.contains(r"<\/STYLE>"));
    }

    #[test]
    fn test_export_omits_error_guard() {
        let store = ArtifactStore::scaffold();
        assert!(compose(&store).as_str().contains(PREVIEW_ERROR_MESSAGE));
        assert!(!export_standalone(&store).as_str().contains(PREVIEW_ERROR_MESSAGE));
    }

    #[test]
    fn test_header_element_is_not_a_head() {
        let store = store_of(&[("index.html", "<body><header>top</header></body>")]);
        let html = compose(&store).into_string();
        assert_eq!(count(&html, "<head>"), 1);
        assert!(html.contains("<header>top</header>"));
    }
}
