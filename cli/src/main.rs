//! CLI entrypoint for CodeAgent
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use codeagent_application::{
    ArtifactEditor, ConversationLogger, LoadModelOptions, Observers, OrchestrationEngine,
    PreviewRefresher, ProjectManager, SharedWorkspace, SubmitOutcome, Workspace,
    WorkspaceNotifier,
};
use codeagent_domain::{DispatchMode, Model, RoleKey, RoleUpdate, RoutingMode};
use codeagent_infrastructure::{
    ConfigLoader, FileConfig, HttpBackend, JsonProjectRepository, JsonlConversationLogger,
};
use codeagent_presentation::{
    ChatRepl, Cli, ConsoleFormatter, FilePreviewSurface, ProgressReporter, SimpleProgress,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Initialize logging based on verbosity level; the guard flushes `--log-file`
fn init_tracing(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file, guard) = match &cli.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .context("--log-file must name a file")?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(console)
        .with(file)
        .init();

    Ok(guard)
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
    };
    let config = config.map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    let issues = config.validate();
    for issue in &issues {
        eprintln!("{}", ConsoleFormatter::config_issue(issue));
    }
    if issues.iter().any(|issue| issue.is_error()) {
        bail!("configuration has errors");
    }
    Ok(config)
}

/// Build the workspace from config plus `--role`, `--flat` and `--consensus`
fn build_workspace(cli: &Cli, config: &FileConfig) -> Result<SharedWorkspace> {
    let mut settings = config.session_settings();
    if cli.flat {
        settings = settings.with_routing_mode(RoutingMode::Flat);
    }
    if cli.consensus {
        settings = settings.with_dispatch_mode(DispatchMode::Consensus);
    }

    let mut roles = config.role_registry();
    for (role, model) in cli.role_overrides().map_err(anyhow::Error::msg)? {
        let key: RoleKey = role.parse()?;
        roles.update(key, RoleUpdate::assign(Model::from(model.as_str())).with_enabled(true));
    }

    Ok(SharedWorkspace::new(Workspace::new(settings, roles)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(&cli)?;

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{line}");
        }
        return Ok(());
    }

    info!("Starting CodeAgent");
    let config = load_config(&cli)?;
    let timing = config.timing();
    let workspace = build_workspace(&cli, &config)?;

    // === Dependency Injection ===
    let backend = Arc::new(
        HttpBackend::new(&config.backend.base_url, config.request_timeout())
            .context("creating the backend client")?,
    );

    if cli.list_models {
        let credential = workspace.read(|ws| ws.settings().usable_credential().cloned());
        let options = LoadModelOptions::new(backend.clone())
            .execute(credential.as_ref())
            .await;
        println!("{}", ConsoleFormatter::models(&options));
        return Ok(());
    }

    let surface = Arc::new(FilePreviewSurface::new(config.preview_dir()));
    let preview_path = surface.host_page_path();
    let refresher = PreviewRefresher::new(workspace.clone(), surface)
        .with_debounce(timing.preview_debounce);
    let (trigger, preview_task) = refresher.spawn();

    let notifier: Arc<dyn WorkspaceNotifier> = if cli.quiet {
        Arc::new(SimpleProgress)
    } else {
        Arc::new(ProgressReporter::new().with_echo_user(!cli.chat))
    };
    let mut observers = Observers::default()
        .with_notifier(notifier)
        .with_preview(trigger);
    if let Some(path) = &config.logging.conversation_log {
        match JsonlConversationLogger::open(path) {
            Ok(logger) => {
                info!("Writing conversation transcript to {}", path.display());
                let logger: Arc<dyn ConversationLogger> = Arc::new(logger);
                observers = observers.with_logger(logger);
            }
            Err(e) => warn!("Conversation transcript disabled ({}): {}", path.display(), e),
        }
    }

    let engine = OrchestrationEngine::new(workspace.clone(), backend.clone(), backend.clone())
        .with_observers(observers.clone())
        .with_timing(timing);
    let editor = ArtifactEditor::new(workspace.clone()).with_observers(observers.clone());
    let projects = ProjectManager::new(
        workspace.clone(),
        Arc::new(JsonProjectRepository::new(config.projects_dir())),
    )
    .with_observers(observers);

    if let Some(name) = &cli.load {
        let summary = projects
            .load(name)
            .await
            .with_context(|| format!("loading project '{name}'"))?;
        info!("Loaded '{}' ({} files)", summary.name, summary.file_count);
    }
    refresher.render_now().await;

    if cli.chat {
        let mut repl = ChatRepl::new(
            engine,
            editor,
            projects.clone(),
            LoadModelOptions::new(backend),
            refresher.clone(),
        )
        .with_preview_path(preview_path);
        if let Some(path) = &cli.export {
            repl = repl.with_export_path(path.clone());
        }
        repl.run().await?;
    } else if let Some(prompt) = &cli.prompt {
        match engine.submit(prompt, None).await {
            Ok(SubmitOutcome::Replied { .. }) => {}
            Ok(SubmitOutcome::SessionStarted(handle)) => handle.wait().await,
            Err(e) if e.is_precondition() => bail!("{e}"),
            // Already shown as an error notice
            Err(e) => info!("Request failed: {}", e),
        }
        refresher.render_now().await;
        println!();
        println!("{}", workspace.read(|ws| ConsoleFormatter::files(ws.artifacts())));
        println!("Live preview: {}", preview_path.display());

        if let Some(path) = &cli.export {
            let written = refresher.export(path).await?;
            println!("Exported to {}", written.display());
        }
    } else if cli.load.is_none() {
        bail!("A request is required. Use --chat for interactive mode.");
    } else if let Some(path) = &cli.export {
        let written = refresher.export(path).await?;
        println!("Exported to {}", written.display());
    }

    if let Some(name) = &cli.save {
        let summary = projects.save(name).await?;
        println!("Saved project '{}'", summary.name);
    }

    preview_task.abort();
    Ok(())
}
