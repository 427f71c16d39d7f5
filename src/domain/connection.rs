// src/domain/connection.rs

//! Connection domain abstractions.
//!
//! This module defines the domain-level connection interface used by the
//! session layer to publish messages and observe asynchronous errors. It
//! intentionally avoids any reference to concrete protocols, brokers, or
//! client libraries.
//!
//! A connection is responsible only for handing messages to a broker and
//! for reporting out-of-band errors through its [`ErrorSink`]. Sequencing,
//! waiting and reporting are handled by the session.
//!
//! Concrete implementations of this interface live under `src/connection/`.
use crate::{ConnectionId, Error, Result};
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use super::ErrorSink;

/// Subject prefix the broker reserves for system-internal traffic.
pub const RESERVED_PREFIX: &str = "_SYS.";

/// A subject on which messages are published.
///
/// Subjects are immutable, cheap to clone, and safe to share across
/// threads. The only syntax enforced here is what every broker rejects
/// anyway: an empty subject or one containing whitespace.
///
/// ```
/// # use errwatch::Subject;
/// let subject = Subject::new("_SYS.hi").unwrap();
/// assert!(subject.is_reserved());
///
/// assert!(Subject::new("bad subject").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subject(Arc<str>);

impl Subject {
    /// Validate and wrap a subject string.
    pub fn new(value: impl Into<Arc<str>>) -> Result<Self> {
        // ---
        let value = value.into();

        if value.is_empty() {
            return Err(Error::InvalidSubject("subject is empty".into()));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(Error::InvalidSubject(format!(
                "subject contains whitespace: {value:?}"
            )));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the subject lies in the broker-reserved `_SYS.` namespace.
    pub fn is_reserved(&self) -> bool {
        self.0.starts_with(RESERVED_PREFIX)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message handed to the broker.
///
/// Messages exist only for the duration of a publish call. The payload is
/// opaque to every layer of this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    // ---
    pub subject: Subject,
    pub payload: Bytes,
}

impl Message {
    pub fn new(subject: Subject, payload: impl Into<Bytes>) -> Self {
        // ---
        Self {
            subject,
            payload: payload.into(),
        }
    }
}

/// Broker-assigned identifier of a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An error detected by the connection layer outside the caller's call
/// sequence.
///
/// Carries the identity of the connection that saw it, the subscription it
/// concerns (if any), and the error text. `Display` prints only the text,
/// which is what observers log and what the session reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsyncError {
    // ---
    pub connection_id: ConnectionId,
    pub subscription: Option<SubscriptionId>,
    pub message: Arc<str>,
}

impl AsyncError {
    pub fn new(
        connection_id: ConnectionId,
        subscription: Option<SubscriptionId>,
        message: impl Into<Arc<str>>,
    ) -> Self {
        // ---
        Self {
            connection_id,
            subscription,
            message: message.into(),
        }
    }
}

impl fmt::Display for AsyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Shared base state for all connection implementations.
///
/// Each concrete connection embeds this as a field named `base`, so that
/// the default `Connection` methods can delegate here:
///
/// ```ignore
/// struct NatsConnection {
///     base: ConnectionBase,
///     // ... client specific fields
/// }
///
/// impl Connection for NatsConnection {
///     fn base(&self) -> &ConnectionBase { &self.base }
/// }
/// ```
pub struct ConnectionBase {
    /// Unique identifier for this connection.
    pub connection_id: ConnectionId,
    /// Broker URL the connection was opened against.
    pub url: String,
    /// Records the last error and forwards errors to the observer.
    pub sink: ErrorSink,
}

impl ConnectionBase {
    pub fn new(connection_id: ConnectionId, url: impl Into<String>, sink: ErrorSink) -> Self {
        // ---
        Self {
            connection_id,
            url: url.into(),
            sink,
        }
    }
}

/// Connection abstraction.
///
/// A `Connection` hands messages to a broker on a best-effort basis and
/// reports out-of-band errors through the error sink installed when it was
/// built.
///
/// Implementations must ensure that:
/// - `publish()` buffers locally and does not wait for broker acceptance.
/// - `flush()` returns only after every earlier publish has been handed to
///   the transport. It says nothing about broker-side acceptance.
/// - `close()` seals the error sink, so no observer call happens after it
///   returns. Closing twice is not an error.
///
/// The in-memory connection is the reference implementation of these
/// semantics.
///
/// # Notes
///
/// This trait uses `async_trait`; the expanded documentation may show
/// explicit lifetimes and a boxed `Future`. Consumers should treat methods
/// as normal `async fn`s.
#[async_trait::async_trait]
pub trait Connection: Send + Sync {
    // ---
    /// Returns a reference to the shared base state.
    ///
    /// Required method - each concrete connection must implement this
    /// by returning `&self.base`.
    fn base(&self) -> &ConnectionBase;

    /// Returns the identity of the connection.
    ///
    /// Default implementation delegates to `base()`.
    fn connection_id(&self) -> &ConnectionId {
        &self.base().connection_id
    }

    /// Returns the broker URL.
    fn url(&self) -> &str {
        &self.base().url
    }

    /// The most recent asynchronous error, if any was observed.
    ///
    /// Read-only for callers; updated by the connection layer.
    fn last_error(&self) -> Option<AsyncError> {
        self.base().sink.last_error()
    }

    /// Buffer a message for delivery. Fire-and-forget.
    async fn publish(&self, msg: Message) -> Result<()>;

    /// Block until all buffered outbound data is handed to the transport.
    async fn flush(&self) -> Result<()>;

    /// Close the connection and release any associated resources.
    async fn close(&self) -> Result<()>;
}

/// Shared connection pointer.
///
/// `.clone()` only increments a reference count; all clones share the same
/// underlying broker session.
pub type ConnectionPtr = Arc<dyn Connection>;

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn subject_rejects_empty_and_whitespace() {
        // ---
        assert!(matches!(Subject::new(""), Err(Error::InvalidSubject(_))));
        assert!(matches!(
            Subject::new("a b"),
            Err(Error::InvalidSubject(_))
        ));
        assert!(matches!(
            Subject::new("tab\there"),
            Err(Error::InvalidSubject(_))
        ));
    }

    #[test]
    fn reserved_namespace_is_prefix_based() {
        // ---
        assert!(Subject::new("_SYS.hi").unwrap().is_reserved());
        assert!(Subject::new("_SYS.a.b.c").unwrap().is_reserved());
        assert!(!Subject::new("_SYS").unwrap().is_reserved());
        assert!(!Subject::new("sys.hi").unwrap().is_reserved());
        assert!(!Subject::new("$SYS.hi").unwrap().is_reserved());
    }

    #[test]
    fn async_error_displays_message_only() {
        // ---
        let err = AsyncError::new(
            ConnectionId::from("c1"),
            Some(SubscriptionId(7)),
            "permissions violation",
        );
        assert_eq!(err.to_string(), "permissions violation");
    }
}
