//! REPL (Read-Eval-Print Loop) for interactive project building

use crate::ConsoleFormatter;
use codeagent_application::{
    ArtifactEditor, LoadModelOptions, OrchestrationEngine, PollHandle, PreviewRefresher,
    ProjectManager, SubmitOutcome,
};
use codeagent_domain::{DispatchMode, Model, RoleKey, RoleUpdate, RoutingMode};
use colored::Colorize;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::path::PathBuf;
use tracing::{debug, warn};

const HISTORY_CAPACITY: usize = 1000;

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Quit,
    Files,
    Show(Option<String>),
    New(String),
    Remove(String),
    Select(String),
    Roles,
    Role { key: String, action: RoleAction },
    Models,
    Ping(String),
    Mode(Option<String>),
    Consensus(Option<bool>),
    Progress,
    Cancel,
    Refresh,
    Export(Option<PathBuf>),
    Save(String),
    Load(String),
    Projects,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleAction {
    Enable,
    Disable,
    Clear,
    Assign(String),
}

impl ReplCommand {
    /// Parse a line starting with `/`
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();
        let arg = |i: usize| args.get(i).map(|s| s.to_string());
        let required = |i: usize, cmd: ReplCommand| match arg(i) {
            Some(_) => cmd,
            None => ReplCommand::Unknown(format!("{command} needs an argument")),
        };

        match command {
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            "/files" | "/ls" => ReplCommand::Files,
            "/show" | "/cat" => ReplCommand::Show(arg(0)),
            "/new" => required(0, ReplCommand::New(arg(0).unwrap_or_default())),
            "/rm" | "/delete" => required(0, ReplCommand::Remove(arg(0).unwrap_or_default())),
            "/select" => required(0, ReplCommand::Select(arg(0).unwrap_or_default())),
            "/roles" => ReplCommand::Roles,
            "/role" => match (arg(0), arg(1)) {
                (Some(key), Some(action)) => ReplCommand::Role {
                    key,
                    action: match action.as_str() {
                        "on" | "enable" => RoleAction::Enable,
                        "off" | "disable" => RoleAction::Disable,
                        "clear" | "none" => RoleAction::Clear,
                        _ => RoleAction::Assign(action),
                    },
                },
                _ => ReplCommand::Unknown("usage: /role <role> <model|on|off|clear>".to_string()),
            },
            "/models" => ReplCommand::Models,
            "/ping" => required(0, ReplCommand::Ping(arg(0).unwrap_or_default())),
            "/mode" => ReplCommand::Mode(arg(0)),
            "/consensus" => ReplCommand::Consensus(match arg(0).as_deref() {
                Some("on") => Some(true),
                Some("off") => Some(false),
                _ => None,
            }),
            "/progress" | "/status" => ReplCommand::Progress,
            "/cancel" => ReplCommand::Cancel,
            "/refresh" => ReplCommand::Refresh,
            "/export" => ReplCommand::Export(arg(0).map(PathBuf::from)),
            "/save" => required(0, ReplCommand::Save(args.join(" "))),
            "/load" => required(0, ReplCommand::Load(args.join(" "))),
            "/projects" => ReplCommand::Projects,
            other => ReplCommand::Unknown(format!("Unknown command: {other}")),
        }
    }
}

/// Interactive chat REPL
pub struct ChatRepl {
    engine: OrchestrationEngine,
    editor: ArtifactEditor,
    projects: ProjectManager,
    models: LoadModelOptions,
    preview: PreviewRefresher,
    preview_path: Option<PathBuf>,
    export_path: PathBuf,
    poll: Option<PollHandle>,
}

impl ChatRepl {
    pub fn new(
        engine: OrchestrationEngine,
        editor: ArtifactEditor,
        projects: ProjectManager,
        models: LoadModelOptions,
        preview: PreviewRefresher,
    ) -> Self {
        Self {
            engine,
            editor,
            projects,
            models,
            preview,
            preview_path: None,
            export_path: PathBuf::from("index.html"),
            poll: None,
        }
    }

    /// Where the live preview page is written, shown in the welcome banner
    pub fn with_preview_path(mut self, path: PathBuf) -> Self {
        self.preview_path = Some(path);
        self
    }

    /// Default destination of `/export`
    pub fn with_export_path(mut self, path: PathBuf) -> Self {
        self.export_path = path;
        self
    }

    /// Run the interactive REPL
    pub async fn run(mut self) -> std::io::Result<()> {
        let mut line_editor = Reedline::create();

        let history_path = dirs::data_dir().map(|p| p.join("codeagent").join("history.txt"));
        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone()) {
                Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
                Err(e) => warn!("Chat history unavailable: {}", e),
            }
        }

        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("codeagent".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match line_editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        if self.handle_command(ReplCommand::parse(line)).await {
                            break;
                        }
                        continue;
                    }

                    self.process_request(line).await;
                }
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
                #[allow(unreachable_patterns)]
                _ => continue,
            }
        }

        if let Some(handle) = self.poll.take() {
            handle.cancel();
        }
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│              CodeAgent - Chat               │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        let workspace = self.engine.workspace();
        println!("{}", workspace.read(|ws| ConsoleFormatter::roles(ws.roles())));
        if let Some(path) = &self.preview_path {
            println!("Live preview: {}", path.display().to_string().cyan());
        }
        if workspace.read(|ws| ws.settings().usable_credential().is_none()) {
            println!(
                "{}",
                ConsoleFormatter::notice(
                    "No API key configured. Set CODEAGENT_CREDENTIAL__API_KEY or [credential] api_key."
                )
            );
        }
        println!("Type /help for commands.");
        println!();
    }

    fn print_help() {
        println!();
        println!("Commands:");
        println!("  /files                      - List project files");
        println!("  /show [file]                - Print a file (default: the active one)");
        println!("  /new <file>                 - Create an empty file and select it");
        println!("  /rm <file>                  - Delete a file");
        println!("  /select <file>              - Make a file the active one");
        println!("  /roles                      - Show role assignments");
        println!("  /role <role> <model|on|off|clear>");
        println!("                              - Assign a model or toggle a role");
        println!("  /models                     - List models available for roles");
        println!("  /ping <model>               - Check that a model answers");
        println!("  /mode [roles|flat]          - Show or set the routing mode");
        println!("  /consensus [on|off]         - Toggle consensus sessions");
        println!("  /progress                   - Show consensus progress");
        println!("  /cancel                     - Stop polling the running session");
        println!("  /refresh                    - Recompose the preview now");
        println!("  /export [path]              - Write a standalone HTML file");
        println!("  /save <name>, /load <name>  - Save or load a project");
        println!("  /projects                   - List saved projects");
        println!("  /help, /quit");
        println!();
    }

    /// Handle a slash command. Returns true if the REPL should exit.
    async fn handle_command(&mut self, command: ReplCommand) -> bool {
        let workspace = self.engine.workspace().clone();
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => Self::print_help(),
            ReplCommand::Files => {
                println!("{}", workspace.read(|ws| ConsoleFormatter::files(ws.artifacts())));
            }
            ReplCommand::Show(name) => {
                let shown = workspace.read(|ws| {
                    let store = ws.artifacts();
                    let name = name.unwrap_or_else(|| store.active().to_string());
                    store
                        .get(&name)
                        .map(|content| ConsoleFormatter::file(&name, content))
                        .ok_or(name)
                });
                match shown {
                    Ok(text) => println!("{text}"),
                    Err(name) => println!("{}", ConsoleFormatter::error(&format!("No file named '{name}'"))),
                }
            }
            ReplCommand::New(name) => self.report(self.editor.create(&name, None), "Created"),
            ReplCommand::Remove(name) => self.report(self.editor.delete(&name), "Deleted"),
            ReplCommand::Select(name) => self.report(self.editor.select(&name), "Selected"),
            ReplCommand::Roles => {
                println!("{}", workspace.read(|ws| ConsoleFormatter::roles(ws.roles())));
            }
            ReplCommand::Role { key, action } => match key.parse::<RoleKey>() {
                Ok(key) => {
                    let update = match action {
                        RoleAction::Enable => RoleUpdate::enable(),
                        RoleAction::Disable => RoleUpdate::disable(),
                        RoleAction::Clear => RoleUpdate::clear_model(),
                        RoleAction::Assign(model) => {
                            RoleUpdate::assign(Model::from(model.as_str())).with_enabled(true)
                        }
                    };
                    let entry = workspace.update(|ws| ws.update_role(key, update));
                    let model = entry
                        .assigned_model()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "no model".to_string());
                    let state = if entry.enabled { "on" } else { "off" };
                    println!("{} {} ({})", entry.display_name.bold(), state, model);
                }
                Err(e) => println!("{}", ConsoleFormatter::error(&e.to_string())),
            },
            ReplCommand::Models => {
                let credential = workspace.read(|ws| ws.settings().usable_credential().cloned());
                let options = self.models.execute(credential.as_ref()).await;
                println!("{}", ConsoleFormatter::models(&options));
            }
            ReplCommand::Ping(model) => {
                let model = Model::from(model.as_str());
                let credential = workspace.read(|ws| ws.settings().usable_credential().cloned());
                let availability = self.models.ping(&model, credential.as_ref()).await;
                println!("{}", ConsoleFormatter::availability(&model, &availability));
            }
            ReplCommand::Mode(None) => {
                let mode = workspace.read(|ws| ws.settings().routing_mode);
                println!("Routing mode: {}", mode.as_str().bold());
            }
            ReplCommand::Mode(Some(value)) => match value.parse::<RoutingMode>() {
                Ok(mode) => {
                    workspace.update(|ws| ws.settings_mut().routing_mode = mode);
                    println!("Routing mode: {}", mode.as_str().bold());
                }
                Err(e) => println!("{}", ConsoleFormatter::error(&e)),
            },
            ReplCommand::Consensus(value) => {
                let mode = workspace.update(|ws| {
                    let settings = ws.settings_mut();
                    let on = value.unwrap_or(!settings.dispatch_mode.is_consensus());
                    settings.dispatch_mode = if on {
                        DispatchMode::Consensus
                    } else {
                        DispatchMode::Direct
                    };
                    settings.dispatch_mode
                });
                let label = if mode.is_consensus() { "on" } else { "off" };
                println!("Consensus: {}", label.bold());
            }
            ReplCommand::Progress => {
                match workspace.read(|ws| ws.session().map(ConsoleFormatter::session)) {
                    Some(line) => println!("{line}"),
                    None => println!("No consensus session yet."),
                }
            }
            ReplCommand::Cancel => match self.poll.take() {
                Some(handle) if !handle.is_finished() => {
                    handle.cancel();
                    println!("Stopped polling session {}.", handle.token());
                }
                _ => println!("No session is being polled."),
            },
            ReplCommand::Refresh => {
                self.editor.refresh();
                self.preview.render_now().await;
            }
            ReplCommand::Export(path) => {
                let destination = path.unwrap_or_else(|| self.export_path.clone());
                match self.preview.export(&destination).await {
                    Ok(path) => println!("Exported to {}", path.display().to_string().cyan()),
                    Err(e) => println!("{}", ConsoleFormatter::error(&e.to_string())),
                }
            }
            ReplCommand::Save(name) => match self.projects.save(&name).await {
                Ok(summary) => println!(
                    "Saved '{}' ({} files, {} messages)",
                    summary.name, summary.file_count, summary.message_count
                ),
                Err(e) => println!("{}", ConsoleFormatter::error(&e.to_string())),
            },
            ReplCommand::Load(name) => {
                // The load cancels the poll loop; forget the handle too
                self.poll = None;
                if let Err(e) = self.projects.load(&name).await {
                    println!("{}", ConsoleFormatter::error(&e.to_string()));
                }
            }
            ReplCommand::Projects => match self.projects.list().await {
                Ok(projects) => println!("{}", ConsoleFormatter::projects(&projects)),
                Err(e) => println!("{}", ConsoleFormatter::error(&e.to_string())),
            },
            ReplCommand::Unknown(message) => {
                println!("{message}");
                println!("Type /help for available commands");
            }
        }
        false
    }

    async fn process_request(&mut self, request: &str) {
        if self.poll.as_ref().is_some_and(PollHandle::is_finished) {
            self.poll = None;
        }

        println!();
        match self.engine.submit(request, None).await {
            Ok(SubmitOutcome::Replied { files_written, .. }) => {
                debug!("Turn finished; {} file(s) written", files_written.len());
            }
            Ok(SubmitOutcome::SessionStarted(handle)) => {
                println!(
                    "{}",
                    ConsoleFormatter::notice(&format!(
                        "Consensus session {} started; progress appears as it arrives.",
                        handle.token()
                    ))
                );
                self.poll = Some(handle);
            }
            // Dispatch failures were already shown as an error notice
            Err(e) if e.is_precondition() => println!("{}", ConsoleFormatter::error(&e.to_string())),
            Err(e) => debug!("Request failed: {}", e),
        }
        println!();
    }

    fn report<E: std::fmt::Display>(&self, result: Result<(), E>, verb: &str) {
        match result {
            Ok(()) => {
                let active = self.engine.workspace().read(|ws| ws.artifacts().active().to_string());
                println!("{verb}. Active file: {}", active.bold());
            }
            Err(e) => println!("{}", ConsoleFormatter::notice(&e.to_string())),
        }
    }
}
