//! Messages for the user.
//!
//! The coordinator never renders anything itself. It hands text and a
//! display duration to a [`StatusSink`] supplied by the host.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// How long informational messages stay visible.
pub const MESSAGE_TIMEOUT: Duration = Duration::from_secs(4);

/// How long error messages stay visible.
pub const ERROR_TIMEOUT: Duration = Duration::from_secs(10);

/// Receives user-facing messages. Implementations must not block.
pub trait StatusSink: Send + Sync {
    fn message(&self, text: &str, timeout: Duration);
    fn error(&self, text: &str, timeout: Duration);
}

/// Severity of a displayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// A message as it reached a [`MessageLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Displayed {
    pub level: Level,
    pub text: String,
    pub timeout: Duration,
}

/// A sink that keeps every message in memory.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Mutex<Vec<Displayed>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Displayed> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Texts of every message, in display order.
    pub fn texts(&self) -> Vec<String> {
        self.entries().into_iter().map(|d| d.text).collect()
    }

    /// Texts of error-level messages only.
    pub fn errors(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|d| d.level == Level::Error)
            .map(|d| d.text)
            .collect()
    }

    fn push(&self, level: Level, text: &str, timeout: Duration) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Displayed {
                level,
                text: text.to_string(),
                timeout,
            });
    }
}

impl StatusSink for MessageLog {
    fn message(&self, text: &str, timeout: Duration) {
        self.push(Level::Info, text, timeout);
    }

    fn error(&self, text: &str, timeout: Duration) {
        self.push(Level::Error, text, timeout);
    }
}

/// Applies display policy in front of a sink.
///
/// Everything is logged. Informational messages are dropped when popups
/// are disabled; errors always go through.
#[derive(Clone)]
pub(crate) struct Notifier {
    sink: Arc<dyn StatusSink>,
    quiet: bool,
}

impl Notifier {
    pub(crate) fn new(sink: Arc<dyn StatusSink>, quiet: bool) -> Self {
        Self { sink, quiet }
    }

    pub(crate) fn message(&self, text: impl AsRef<str>) {
        let text = text.as_ref();
        tracing::info!("{text}");
        if !self.quiet {
            self.sink.message(text, MESSAGE_TIMEOUT);
        }
    }

    pub(crate) fn error(&self, text: impl AsRef<str>) {
        let text = text.as_ref();
        tracing::error!("{text}");
        self.sink.error(text, ERROR_TIMEOUT);
    }
}
