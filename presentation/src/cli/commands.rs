//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for codeagent
#[derive(Parser, Debug)]
#[command(name = "codeagent")]
#[command(author, version, about = "Build small web projects by chatting with a team of models")]
#[command(long_about = r#"
CodeAgent sends your request to one or more role-bound models (planner,
designer, coder, reviewer, eyes, debugger), writes the code blocks they
answer with into a project (index.html, style.css, script.js, ...) and keeps
a sandboxed live preview of the result.

Configuration files are loaded from (in priority order):
1. CODEAGENT_* environment variables (CODEAGENT_CREDENTIAL__API_KEY, ...)
2. --config <path>        Explicit config file
3. ./codeagent.toml       Project-level config
4. ~/.config/codeagent/config.toml   Global config

Example:
  codeagent "Build an analog clock"
  codeagent --role planner=openai/gpt-4o --consensus "A todo list with drag and drop"
  codeagent --chat --load clock
"#)]
pub struct Cli {
    /// Request to send (not required in chat mode)
    pub prompt: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Assign a model to a role and enable it (repeatable), e.g. `coder=openai/gpt-4o`
    #[arg(short, long, value_name = "ROLE=MODEL")]
    pub role: Vec<String>,

    /// Send a flat list of models instead of the role chain
    #[arg(long)]
    pub flat: bool,

    /// Run the request as a polled consensus session
    #[arg(long)]
    pub consensus: bool,

    /// List the models available for role assignment and exit
    #[arg(long)]
    pub list_models: bool,

    /// Load a saved project before doing anything else
    #[arg(long, value_name = "NAME")]
    pub load: Option<String>,

    /// Save the project under this name when done
    #[arg(long, value_name = "NAME")]
    pub save: Option<String>,

    /// Write the composed preview as a standalone HTML file when done
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Also write tracing output to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parse `--role` values into `(role, model)` pairs
    pub fn role_overrides(&self) -> Result<Vec<(String, String)>, String> {
        self.role
            .iter()
            .map(|spec| match spec.split_once('=') {
                Some((role, model)) if !role.trim().is_empty() && !model.trim().is_empty() => {
                    Ok((role.trim().to_string(), model.trim().to_string()))
                }
                _ => Err(format!("invalid --role '{spec}' (expected ROLE=MODEL)")),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_one_shot() {
        let cli = Cli::parse_from([
            "codeagent",
            "--role",
            "planner=openai/gpt-4o",
            "--consensus",
            "-vv",
            "Build a clock",
        ]);
        assert_eq!(cli.prompt.as_deref(), Some("Build a clock"));
        assert!(cli.consensus);
        assert_eq!(cli.verbose, 2);
        assert_eq!(
            cli.role_overrides().unwrap(),
            vec![("planner".to_string(), "openai/gpt-4o".to_string())]
        );
    }

    #[test]
    fn test_bad_role_override() {
        let cli = Cli::parse_from(["codeagent", "--role", "coder", "--chat"]);
        assert!(cli.role_overrides().is_err());
    }
}
