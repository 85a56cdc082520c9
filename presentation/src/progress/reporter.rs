//! Console notifiers for workspace changes

use crate::output::console::ConsoleFormatter;
use codeagent_application::WorkspaceNotifier;
use codeagent_domain::{ConsensusProgress, DiscussionEntry, Message, MessageRole, ProgressStatus};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Spinner while generating, progress bar during consensus sessions
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
    steps: Mutex<Option<ProgressBar>>,
    /// Echo user messages (off in the REPL, where the user just typed them)
    echo_user: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
            steps: Mutex::new(None),
            echo_user: false,
        }
    }

    pub fn with_echo_user(mut self, echo: bool) -> Self {
        self.echo_user = echo;
        self
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn steps_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    /// Print above any active bar so output does not tear
    fn println(&self, line: String) {
        if let Some(bar) = lock(&self.steps).as_ref() {
            bar.println(line);
        } else if let Some(spinner) = lock(&self.spinner).as_ref() {
            spinner.println(line);
        } else {
            println!("{line}");
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceNotifier for ProgressReporter {
    fn on_generating(&self, active: bool) {
        let mut spinner = lock(&self.spinner);
        if active {
            if spinner.is_none() {
                let bar = ProgressBar::new_spinner();
                bar.set_style(Self::spinner_style());
                bar.set_message("Agents are working...");
                bar.enable_steady_tick(Duration::from_millis(100));
                *spinner = Some(bar);
            }
        } else if let Some(bar) = spinner.take() {
            bar.finish_and_clear();
        }
    }

    fn on_message(&self, message: &Message) {
        if message.role() == MessageRole::User && !self.echo_user {
            return;
        }
        self.println(ConsoleFormatter::message(message));
    }

    fn on_consensus_entry(&self, entry: &DiscussionEntry) {
        self.println(ConsoleFormatter::consensus_entry(entry));
    }

    fn on_progress(&self, progress: &ConsensusProgress) {
        let mut steps = lock(&self.steps);
        let bar = steps.get_or_insert_with(|| {
            let bar = ProgressBar::new(0);
            bar.set_style(Self::steps_style());
            bar.set_prefix("Consensus");
            bar
        });
        bar.set_length(progress.total() as u64);
        bar.set_position(progress.current() as u64);
        bar.set_message(progress.phase().to_string());

        match progress.status() {
            ProgressStatus::Completed => {
                if let Some(bar) = steps.take() {
                    bar.finish_with_message(format!("{}", "complete".green()));
                }
            }
            ProgressStatus::Failed => {
                if let Some(bar) = steps.take() {
                    bar.abandon_with_message(format!("{}", "failed".red()));
                }
            }
            _ => {}
        }
    }
}

/// Plain line output (no bars), for `--quiet` and non-terminal output
pub struct SimpleProgress;

impl WorkspaceNotifier for SimpleProgress {
    fn on_message(&self, message: &Message) {
        if message.role() != MessageRole::User {
            println!("{}", ConsoleFormatter::message(message));
        }
    }

    fn on_consensus_entry(&self, entry: &DiscussionEntry) {
        println!("{}", ConsoleFormatter::consensus_entry(entry));
    }

    fn on_progress(&self, progress: &ConsensusProgress) {
        if progress.status().is_terminal() {
            println!("{}", ConsoleFormatter::progress(progress));
        }
    }
}
