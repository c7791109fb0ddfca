use colored::Colorize;
use converge::ExecuteSummary;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Run summary
// ============================================================================

/// One-line tally of optional step outcomes
pub fn summary_line(summary: &ExecuteSummary) -> String {
    let mut parts = Vec::new();
    if summary.created > 0 {
        parts.push(format!("{} created", summary.created));
    }
    if summary.modified > 0 {
        parts.push(format!("{} updated", summary.modified));
    }
    if summary.removed > 0 {
        parts.push(format!("{} removed", summary.removed));
    }
    if summary.no_change > 0 {
        parts.push(format!("{} unchanged", summary.no_change));
    }
    if summary.skipped > 0 {
        parts.push(format!("{} skipped", summary.skipped));
    }
    if summary.failed > 0 {
        parts.push(format!("{} failed", summary.failed));
    }

    if parts.is_empty() {
        "nothing to do".to_string()
    } else {
        parts.join(", ")
    }
}

/// Print the tally and every failure
pub fn print_summary(summary: &ExecuteSummary) {
    section("Summary");
    let line = summary_line(summary);
    if summary.is_success() {
        success(&line);
    } else {
        warn(&line);
        for failure in &summary.failures {
            println!("  {} {}", "✗".red(), failure.id.bold());
            dim(&failure.error);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
