//! Public, backend-agnostic session configuration.
//!
//! This type intentionally contains no client-library concepts. The
//! connection layer is responsible for interpreting it into concrete
//! connection settings.

use std::time::Duration;

use crate::ConnectionBuilder;

/// Well-known default broker address.
pub const DEFAULT_URL: &str = "nats://127.0.0.1:4222";

/// Subject in the broker-reserved namespace used to provoke a rejection.
pub const DEFAULT_SUBJECT: &str = "_SYS.hi";

pub const DEFAULT_PAYLOAD: &str = "hi";

/// How long the session waits for asynchronous errors after flushing.
pub const DEFAULT_ERROR_WINDOW: Duration = Duration::from_secs(1);

/// Client name announced to the broker.
pub const DEFAULT_NAME: &str = "errwatch";

/// How the session waits for the asynchronous error path after flushing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorWait {
    /// Return as soon as the first error arrives, or when the window ends.
    #[default]
    FirstError,

    /// Sleep for the whole window, then read whatever was recorded.
    ///
    /// Races with slow brokers: an error arriving after the window is
    /// missed.
    FixedDelay,
}

/// Session configuration and connection parameters.
///
/// # Example
///
/// ```
/// use errwatch::{ErrorWait, SessionConfig};
/// use std::time::Duration;
///
/// let config = SessionConfig::default()
///     .with_url("nats://demo.nats.io:4222")
///     .with_error_window(Duration::from_millis(500))
///     .with_error_wait(ErrorWait::FixedDelay);
///
/// assert_eq!(config.subject, "_SYS.hi");
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    // ---
    /// Broker URL.
    ///
    /// `memory://` selects the in-process reference broker when no explicit
    /// connection type is set; anything else selects NATS.
    pub url: String,

    /// Optional connection type override (`"nats"` or `"memory"`).
    pub connection_type: Option<String>,

    /// Client name announced to the broker.
    pub name: String,

    /// Subject the single message is published to.
    pub subject: String,

    /// Payload of the single message.
    pub payload: String,

    /// Upper bound on the wait for asynchronous errors.
    ///
    /// Default: 1 second
    pub error_window: Duration,

    /// Wait strategy used within `error_window`.
    pub error_wait: ErrorWait,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            connection_type: None,
            name: DEFAULT_NAME.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            payload: DEFAULT_PAYLOAD.to_string(),
            error_window: DEFAULT_ERROR_WINDOW,
            error_wait: ErrorWait::default(),
        }
    }
}

impl SessionConfig {
    /// Default session against the in-process reference broker.
    pub fn memory() -> Self {
        Self::default().with_url("memory://")
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_connection_type(mut self, kind: impl Into<String>) -> Self {
        self.connection_type = Some(kind.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_error_window(mut self, window: Duration) -> Self {
        self.error_window = window;
        self
    }

    pub fn with_error_wait(mut self, wait: ErrorWait) -> Self {
        self.error_wait = wait;
        self
    }

    /// A connection builder pre-filled from this configuration.
    ///
    /// Callers may add an observer or a memory broker before handing it to
    /// [`Session::open`](crate::Session::open).
    pub fn connection_builder(&self) -> ConnectionBuilder {
        // ---
        let builder = ConnectionBuilder::new().url(&self.url).name(&self.name);

        match &self.connection_type {
            Some(kind) => builder.connection_type(kind),
            None => builder,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn defaults_target_the_reserved_subject() {
        // ---
        let config = SessionConfig::default();

        assert_eq!(config.url, "nats://127.0.0.1:4222");
        assert_eq!(config.subject, "_SYS.hi");
        assert_eq!(config.payload, "hi");
        assert_eq!(config.error_window, Duration::from_secs(1));
        assert_eq!(config.error_wait, ErrorWait::FirstError);
        assert!(config.connection_type.is_none());
    }

    #[test]
    fn memory_config_only_changes_url() {
        // ---
        let config = SessionConfig::memory();
        assert_eq!(config.url, "memory://");
        assert_eq!(config.subject, DEFAULT_SUBJECT);
    }
}
