//! Progress indicators for siteup.

use colored::Colorize;
use converge::{ApplyResult, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for a long-running external step
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn finish_success(pb: &ProgressBar, msg: &str) {
    pb.finish_with_message(format!("{} {}", "✓".green(), msg));
}

pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.finish_with_message(format!("{} {}", "✗".red(), msg));
}

/// Run `f` under a spinner, finishing it with the outcome
pub fn with_spinner<T, E>(msg: &str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    let pb = spinner(msg);
    let result = f();
    match &result {
        Ok(_) => finish_success(&pb, msg),
        Err(_) => finish_error(&pb, msg),
    }
    result
}

/// Prints one status line per post-install resource
#[derive(Default)]
pub struct StatusLines {
    total: usize,
    done: usize,
}

impl ProgressCallback for StatusLines {
    fn on_batch_start(&mut self, label: &str, count: usize) {
        self.total = count;
        self.done = 0;
        crate::ui::section(label);
    }

    fn on_resource_start(&mut self, _id: &str, description: &str) {
        log::debug!("Applying: {description}");
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        self.done += 1;
        let prefix = format!("[{}/{}]", self.done, self.total);
        match result {
            ApplyResult::NoChange => println!("{} {} {}", prefix.dimmed(), id, "(unchanged)".dimmed()),
            ApplyResult::Created | ApplyResult::Modified | ApplyResult::Removed => {
                println!("{} {} {}", prefix.blue().bold(), "✓".green(), id);
            }
            ApplyResult::Skipped { reason } => {
                println!("{} {} {} ({reason})", prefix.dimmed(), "○".yellow(), id);
            }
            ApplyResult::Failed { error } => {
                println!("{} {} {}", prefix.blue().bold(), "✗".red(), id);
                crate::ui::dim(error);
            }
        }
    }

    fn on_batch_complete(&mut self) {}
}
