//! Build-output diagnostics
//!
//! Every failure in the pipeline surfaces as a `(severity, text)` message on
//! the host's build output; nothing carries a source position.

use parking_lot::Mutex;
use std::fmt::{self, Display, Formatter};

/// Message severity on the build output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Information => "INFORMATION",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        })
    }
}

/// One build-output message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.text)
    }
}

/// Receiver of build-output messages
pub trait MessageSink {
    /// Add a message with no associated file, line or column
    fn add_message(&self, severity: Severity, text: &str);
}

/// Reports to a sink and mirrors every message into `tracing`
pub struct Reporter<'a, S: ?Sized> {
    sink: &'a S,
}

impl<'a, S: MessageSink + ?Sized> Reporter<'a, S> {
    #[inline]
    #[must_use]
    pub fn new(sink: &'a S) -> Self {
        Self { sink }
    }

    /// INFORMATION message, mirrored to `tracing`
    pub fn info(&self, text: &str) {
        tracing::info!(target: "tqe::build", "{text}");
        self.sink.add_message(Severity::Information, text);
    }

    /// WARNING message, mirrored to `tracing`
    pub fn warn(&self, text: &str) {
        tracing::warn!(target: "tqe::build", "{text}");
        self.sink.add_message(Severity::Warning, text);
    }

    /// ERROR message, mirrored to `tracing`
    pub fn error(&self, text: &str) {
        tracing::error!(target: "tqe::build", "{text}");
        self.sink.add_message(Severity::Error, text);
    }
}

impl<S: ?Sized> fmt::Debug for Reporter<'_, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter").finish_non_exhaustive()
    }
}

/// In-memory message log
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Mutex<Vec<Message>>,
}

impl MessageLog {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every message so far
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    /// Texts of messages with the given severity
    #[must_use]
    pub fn texts(&self, severity: Severity) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.severity == severity)
            .map(|m| m.text.clone())
            .collect()
    }

    /// Check if any message of the severity contains `needle`
    #[must_use]
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.messages
            .lock()
            .iter()
            .any(|m| m.severity == severity && m.text.contains(needle))
    }

    /// Number of messages with the given severity
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.messages.lock().iter().filter(|m| m.severity == severity).count()
    }

    /// Drain all messages
    pub fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.messages.lock())
    }
}

impl MessageSink for MessageLog {
    fn add_message(&self, severity: Severity, text: &str) {
        self.messages.lock().push(Message {
            severity,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporter_routes_by_severity() {
        let log = MessageLog::new();
        let reporter = Reporter::new(&log);
        reporter.info("started");
        reporter.warn("odd");
        reporter.error("broken");

        assert_eq!(log.count(Severity::Information), 1);
        assert_eq!(log.texts(Severity::Warning), vec!["odd".to_string()]);
        assert!(log.contains(Severity::Error, "brok"));
    }

    #[test]
    fn message_display() {
        let msg = Message {
            severity: Severity::Warning,
            text: "careful".to_string(),
        };
        assert_eq!(msg.to_string(), "WARNING: careful");
    }

    #[test]
    fn take_drains() {
        let log = MessageLog::new();
        log.add_message(Severity::Information, "one");
        assert_eq!(log.take().len(), 1);
        assert!(log.messages().is_empty());
    }
}
