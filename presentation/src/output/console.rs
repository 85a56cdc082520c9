//! Console output formatting

use colored::Colorize;
use codeagent_application::{CatalogSource, ModelOptions};
use codeagent_domain::{
    ArtifactStore, ConfigIssue, ConsensusProgress, ConsensusSession, DiscussionEntry, Message,
    MessageRole, Model, ModelAvailability, NoticeKind, ProjectSummary, RoleRegistry,
    SessionOutcome, extract_code_blocks, headline,
};

/// Formats workspace state for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// One conversation message. Assistant replies show their prose and a
    /// list of the files their code blocks wrote instead of the raw code.
    pub fn message(message: &Message) -> String {
        match message.role() {
            MessageRole::User => format!("{} {}", "you>".bold(), message.content()),
            MessageRole::Assistant => Self::reply(message),
            MessageRole::System => match message.notice_kind() {
                Some(NoticeKind::Error) => Self::error(message.content()),
                Some(NoticeKind::Consensus) => {
                    format!("{} {}", "[consensus]".magenta().bold(), message.content())
                }
                _ => Self::notice(message.content()),
            },
        }
    }

    fn reply(message: &Message) -> String {
        let speaker = match (message.role_name(), message.model()) {
            (Some(role), Some(model)) => format!("{} ({})", role, model.short_name()),
            (None, Some(model)) => model.short_name(),
            (Some(role), None) => role.to_string(),
            (None, None) => "assistant".to_string(),
        };

        let extraction = extract_code_blocks(message.content());
        let mut output = format!("{}\n", format!("── {speaker} ──").yellow().bold());
        if !extraction.prose.is_empty() {
            output.push_str(&extraction.prose);
            output.push('\n');
        }
        for (filename, content) in extraction.pairs() {
            output.push_str(&format!(
                "  {} {} ({} lines)\n",
                "wrote".green(),
                filename,
                content.lines().count()
            ));
        }
        output.trim_end().to_string()
    }

    pub fn consensus_entry(entry: &DiscussionEntry) -> String {
        let kind = if entry.kind.is_empty() || entry.kind == "discussion" {
            String::new()
        } else {
            format!(" [{}]", entry.kind)
        };
        format!(
            "  {}{} {}",
            entry.agent.cyan().bold(),
            kind.dimmed(),
            headline(&entry.content, 160)
        )
    }

    pub fn notice(text: &str) -> String {
        format!("{} {}", "--".cyan(), text)
    }

    pub fn error(text: &str) -> String {
        format!("{} {}", "error:".red().bold(), text)
    }

    pub fn config_issue(issue: &ConfigIssue) -> String {
        if issue.is_error() {
            format!("{} {}", "config error:".red().bold(), issue.message)
        } else {
            format!("{} {}", "config warning:".yellow().bold(), issue.message)
        }
    }

    pub fn files(store: &ArtifactStore) -> String {
        let mut output = format!("{}\n", "Files:".cyan().bold());
        for (name, content) in store.files() {
            let marker = if name == store.active() { "*" } else { " " };
            output.push_str(&format!(
                " {} {:<24} {:>6} bytes\n",
                marker.green().bold(),
                name,
                content.len()
            ));
        }
        output.trim_end().to_string()
    }

    pub fn file(name: &str, content: &str) -> String {
        format!(
            "{}\n{}",
            format!("── {name} ──").yellow().bold(),
            Self::indent(content, "  ")
        )
    }

    pub fn roles(registry: &RoleRegistry) -> String {
        let mut output = format!("{}\n", "Roles:".cyan().bold());
        for entry in registry.entries() {
            let state = if entry.is_active() {
                "on ".green().bold()
            } else if entry.enabled {
                "on ".yellow()
            } else {
                "off".dimmed()
            };
            let model = entry
                .assigned_model()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "(no model)".to_string());
            output.push_str(&format!(
                "  {} {:<10} {:<40} {}\n",
                state,
                entry.key.as_str(),
                model,
                entry.description.dimmed()
            ));
        }
        output.trim_end().to_string()
    }

    pub fn progress(progress: &ConsensusProgress) -> String {
        let phase = if progress.phase().is_empty() {
            String::new()
        } else {
            format!(" {}", progress.phase())
        };
        format!(
            "{} {}/{} [{}]{}",
            "Progress:".cyan().bold(),
            progress.current(),
            progress.total(),
            progress.status(),
            phase
        )
    }

    /// Progress of a session plus how it ended. A session can fail after
    /// every planned step was counted, so the outcome is shown separately.
    pub fn session(session: &ConsensusSession) -> String {
        let progress = Self::progress(session.progress());
        match session.outcome() {
            None => format!("{progress} ({})", session.phase().as_str()),
            Some(SessionOutcome::Completed) => {
                format!("{progress} {}", "session completed".green())
            }
            Some(SessionOutcome::Failed(reason)) => {
                format!("{progress} {} {}", "session failed:".red().bold(), reason)
            }
        }
    }

    pub fn models(options: &ModelOptions) -> String {
        let source = match options.source {
            CatalogSource::Remote => "from the backend catalog",
            CatalogSource::Fallback => "built-in list",
        };
        let mut output = format!("{} ({})\n", "Models:".cyan().bold(), source.dimmed());
        if let Some(warning) = &options.warning {
            output.push_str(&format!("  {} {}\n", "!".yellow().bold(), warning));
        }
        for info in &options.models {
            let free = if info.is_free() { " free".green().to_string() } else { String::new() };
            output.push_str(&format!("  {:<45} {}{}\n", info.id.as_str(), info.name, free));
        }
        output.trim_end().to_string()
    }

    pub fn availability(model: &Model, availability: &ModelAvailability) -> String {
        match availability {
            ModelAvailability::Working => format!("{} {}", model.as_str().bold(), "working".green()),
            ModelAvailability::Unavailable(reason) => {
                format!("{} {} {}", model.as_str().bold(), "unavailable:".red(), reason)
            }
        }
    }

    pub fn projects(projects: &[ProjectSummary]) -> String {
        if projects.is_empty() {
            return Self::notice("No saved projects.");
        }
        let mut output = format!("{}\n", "Projects:".cyan().bold());
        for p in projects {
            output.push_str(&format!(
                "  {:<24} {} files, {} messages, {}\n",
                p.name,
                p.file_count,
                p.message_count,
                p.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed()
            ));
        }
        output.trim_end().to_string()
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeagent_domain::{ConsensusPlan, PlanStep, SessionSnapshot, SessionToken};
    use std::collections::BTreeMap;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_reply_lists_written_files() {
        plain();
        let mut metadata = BTreeMap::new();
        metadata.insert("role".to_string(), serde_json::json!("coder"));
        let message = Message::assistant(
            Model::Gpt4o,
            "Done.\n```js\na();\nb();\n```",
            metadata,
        );
        let text = ConsoleFormatter::message(&message);
        assert!(text.contains("coder (GPT-4o)"));
        assert!(text.contains("Done."));
        assert!(text.contains("wrote script.js (2 lines)"));
        assert!(!text.contains("a();"));
    }

    #[test]
    fn test_files_marks_active() {
        plain();
        let text = ConsoleFormatter::files(&ArtifactStore::scaffold());
        assert!(text.contains("* index.html"));
        assert!(text.contains("  style.css"));
    }

    #[test]
    fn test_session_shows_failure_after_all_steps() {
        plain();
        let mut session = ConsensusSession::new(SessionToken::new("s"));
        session.apply(
            SessionSnapshot::running()
                .with_plan(ConsensusPlan {
                    name: "Clock".to_string(),
                    steps: vec![PlanStep {
                        id: "1".to_string(),
                        description: "face".to_string(),
                        kind: None,
                        files: vec![],
                    }],
                })
                .with_completed_steps(1),
        );
        session.apply(SessionSnapshot::running().with_error("tests failed"));

        let text = ConsoleFormatter::session(&session);
        assert!(text.contains("1/1 [completed]"));
        assert!(text.contains("session failed: tests failed"));
    }

    #[test]
    fn test_availability_names_the_reason() {
        plain();
        let text = ConsoleFormatter::availability(
            &Model::from("x/y"),
            &ModelAvailability::Unavailable("model not found".to_string()),
        );
        assert_eq!(text, "x/y unavailable: model not found");
        assert_eq!(
            ConsoleFormatter::availability(&Model::Gpt4o, &ModelAvailability::Working),
            "openai/gpt-4o working"
        );
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "> "), "> a\n> b");
    }
}
