// src/connection/memory/broker.rs

//! In-process reference broker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::lock_ignore_poison;
use crate::Message;

/// Behavior knobs for [`MemoryBroker`].
#[derive(Debug, Clone)]
pub struct MemoryBrokerConfig {
    /// Reject publishes into the reserved `_SYS.` namespace.
    ///
    /// Default: `true`.
    pub enforce_reserved: bool,

    /// Accept connections. When `false`, every connect attempt fails.
    ///
    /// Default: `true`.
    pub reachable: bool,

    /// Delay between a rejected publish and the error reaching the client.
    ///
    /// Default: zero.
    pub error_delay: Duration,
}

impl Default for MemoryBrokerConfig {
    fn default() -> Self {
        Self {
            enforce_reserved: true,
            reachable: true,
            error_delay: Duration::ZERO,
        }
    }
}

impl MemoryBrokerConfig {
    pub fn with_enforce_reserved(mut self, enforce: bool) -> Self {
        self.enforce_reserved = enforce;
        self
    }

    pub fn with_reachable(mut self, reachable: bool) -> Self {
        self.reachable = reachable;
        self
    }

    pub fn with_error_delay(mut self, delay: Duration) -> Self {
        self.error_delay = delay;
        self
    }
}

/// A broker living entirely in the current process.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the connection under test holds another.
///
/// ```
/// use errwatch::{MemoryBroker, MemoryBrokerConfig};
///
/// let broker = MemoryBroker::new(MemoryBrokerConfig::default().with_enforce_reserved(false));
/// assert_eq!(broker.publish_attempts(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MemoryBroker {
    inner: Arc<BrokerInner>,
}

#[derive(Default)]
struct BrokerInner {
    config: MemoryBrokerConfig,
    accepted: Mutex<Vec<Message>>,
    publish_attempts: AtomicU64,
    connections: AtomicU64,
}

impl MemoryBroker {
    // ---
    pub fn new(config: MemoryBrokerConfig) -> Self {
        // ---
        Self {
            inner: Arc::new(BrokerInner {
                config,
                ..BrokerInner::default()
            }),
        }
    }

    pub fn config(&self) -> &MemoryBrokerConfig {
        &self.inner.config
    }

    /// Messages the broker accepted, in arrival order.
    pub fn accepted(&self) -> Vec<Message> {
        lock_ignore_poison(&self.inner.accepted).clone()
    }

    /// Publishes that reached the broker, accepted or not.
    pub fn publish_attempts(&self) -> u64 {
        self.inner.publish_attempts.load(Ordering::SeqCst)
    }

    /// Connections successfully established over the broker's lifetime.
    pub fn connection_count(&self) -> u64 {
        self.inner.connections.load(Ordering::SeqCst)
    }

    /// Admit a new client connection.
    pub(crate) fn accept_connection(&self) -> Result<(), &'static str> {
        // ---
        if !self.inner.config.reachable {
            return Err("connection refused");
        }
        self.inner.connections.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Broker-side handling of one publish.
    ///
    /// Returns the rejection text when the publish violates the reserved
    /// namespace. The caller decides how that text reaches the client.
    pub(crate) fn receive(&self, msg: Message) -> Result<(), String> {
        // ---
        self.inner.publish_attempts.fetch_add(1, Ordering::SeqCst);

        if self.inner.config.enforce_reserved && msg.subject.is_reserved() {
            return Err(format!(
                "permissions violation for publish to {:?}",
                msg.subject.as_str()
            ));
        }

        lock_ignore_poison(&self.inner.accepted).push(msg);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::Subject;

    fn message(subject: &str) -> Message {
        Message::new(Subject::new(subject).unwrap(), "hi")
    }

    #[test]
    fn enforcing_broker_rejects_reserved_subjects() {
        // ---
        let broker = MemoryBroker::default();

        let err = broker.receive(message("_SYS.hi")).unwrap_err();
        assert_eq!(err, "permissions violation for publish to \"_SYS.hi\"");

        broker.receive(message("greet.hi")).unwrap();

        assert_eq!(broker.publish_attempts(), 2);
        let accepted = broker.accepted();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].subject.as_str(), "greet.hi");
    }

    #[test]
    fn permissive_broker_accepts_reserved_subjects() {
        // ---
        let broker = MemoryBroker::new(MemoryBrokerConfig::default().with_enforce_reserved(false));

        broker.receive(message("_SYS.hi")).unwrap();
        assert_eq!(broker.accepted().len(), 1);
    }

    #[test]
    fn unreachable_broker_refuses_connections() {
        // ---
        let broker = MemoryBroker::new(MemoryBrokerConfig::default().with_reachable(false));

        assert!(broker.accept_connection().is_err());
        assert_eq!(broker.connection_count(), 0);
    }
}
