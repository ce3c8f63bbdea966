//! Terminal rendering of coordinator messages.

use std::time::Duration;

use colored::Colorize;
use vault_sync::StatusSink;

/// Prints messages to stdout and errors to stderr. Display durations are
/// meaningless on a terminal and are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn message(&self, text: &str, _timeout: Duration) {
        println!("{} {}", "*".green(), text);
    }

    fn error(&self, text: &str, _timeout: Duration) {
        eprintln!("{}: {}", "error".red().bold(), text);
    }
}
