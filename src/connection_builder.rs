//! Connection builder for creating connection instances.
//!
//! Provides a fluent builder API for constructing connections with clear
//! separation between required and optional configuration.

use std::sync::Arc;

use crate::{
    //
    create_memory_connection,
    create_nats_connection,
    logging_observer,
    AsyncError,
    ConnectionBase,
    ConnectionId,
    ConnectionPtr,
    Error,
    ErrorObserver,
    ErrorSink,
    ErrorStream,
    MemoryBroker,
    Result,
    DEFAULT_NAME,
};

/// Builder for creating connection instances.
///
/// # Examples
///
/// ## NATS with a custom observer
/// ```no_run
/// use errwatch::ConnectionBuilder;
///
/// # async fn example() -> errwatch::Result<()> {
/// let (connection, mut errors) = ConnectionBuilder::new()
///     .url("nats://127.0.0.1:4222")
///     .name("errwatch-demo")
///     .error_observer(|err| eprintln!("Async Error: {err}"))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// ## In-process reference broker
/// ```no_run
/// use errwatch::{ConnectionBuilder, MemoryBroker};
///
/// # async fn example() -> errwatch::Result<()> {
/// let broker = MemoryBroker::default();
/// let (connection, mut errors) = ConnectionBuilder::new()
///     .url("memory://")
///     .memory_broker(broker.clone())
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ConnectionBuilder {
    url: Option<String>,
    connection_type: Option<String>,
    name: Option<String>,
    observer: Option<ErrorObserver>,
    memory_broker: Option<MemoryBroker>,
}

impl ConnectionBuilder {
    /// Create a new connection builder.
    pub fn new() -> Self {
        Self {
            url: None,
            connection_type: None,
            name: None,
            observer: None,
            memory_broker: None,
        }
    }

    /// Set the broker URL (required).
    ///
    /// Examples:
    /// - `"nats://127.0.0.1:4222"`
    /// - `"memory://"`
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set explicit connection type.
    ///
    /// Valid values: `"nats"`, `"memory"`
    ///
    /// If not specified, `memory://` URLs select the memory broker and
    /// every other URL selects NATS.
    pub fn connection_type(mut self, kind: impl Into<String>) -> Self {
        self.connection_type = Some(kind.into());
        self
    }

    /// Set the client name announced to the broker.
    ///
    /// Default: `"errwatch"`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Install the asynchronous error observer.
    ///
    /// The observer runs on a library-managed task. It must return
    /// promptly and must not block or await anything: `close()` waits for
    /// an observer call in progress before it returns.
    ///
    /// Default: log `Async Error: <message>` at error level.
    pub fn error_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&AsyncError) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Use `broker` for memory connections.
    ///
    /// If not specified, a memory connection gets a fresh broker with
    /// default settings.
    pub fn memory_broker(mut self, broker: MemoryBroker) -> Self {
        self.memory_broker = Some(broker);
        self
    }

    /// Build the connection (consumes self).
    ///
    /// Returns the connection together with the stream of asynchronous
    /// errors it reports. The observer is armed only after the connection
    /// is established.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `url` is missing
    /// - the connection type is unknown or not compiled in
    /// - the broker cannot be reached
    pub async fn build(self) -> Result<(ConnectionPtr, ErrorStream)> {
        // ---
        let url = self
            .url
            .ok_or_else(|| Error::MissingConfig("url".into()))?;

        let kind = match self.connection_type.as_deref() {
            Some(kind) => kind.to_string(),
            None if url.starts_with("memory://") => "memory".to_string(),
            None => "nats".to_string(),
        };

        let name = self.name.unwrap_or_else(|| DEFAULT_NAME.to_string());
        let observer = self.observer.unwrap_or_else(logging_observer);

        let connection_id = ConnectionId::generate();
        let (sink, errors) = ErrorSink::new(connection_id.clone(), observer);
        let base = ConnectionBase::new(connection_id, url, sink.clone());

        let connection = match kind.as_str() {
            "memory" => {
                let broker = self.memory_broker.unwrap_or_default();
                create_memory_connection(base, broker).await?
            }
            "nats" => create_nats_connection(base, &name).await?,
            other => {
                return Err(Error::Transport(format!(
                    "unrecognized connection_type: {other}, valid values: memory, nats"
                )))
            }
        };

        sink.open();

        Ok((connection, errors))
    }
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[tokio::test]
    async fn missing_url_is_rejected() {
        // ---
        let err = ConnectionBuilder::new().build().await.err().unwrap();
        assert!(matches!(err, Error::MissingConfig(field) if field == "url"));
    }

    #[tokio::test]
    async fn unknown_type_is_rejected() {
        // ---
        let err = ConnectionBuilder::new()
            .url("memory://")
            .connection_type("carrier-pigeon")
            .build()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn memory_scheme_selects_memory_broker() {
        // ---
        let broker = MemoryBroker::default();

        let (connection, _errors) = ConnectionBuilder::new()
            .url("memory://")
            .memory_broker(broker.clone())
            .build()
            .await
            .unwrap();

        assert_eq!(broker.connection_count(), 1);
        assert_eq!(connection.url(), "memory://");
        assert!(connection.last_error().is_none());

        connection.close().await.unwrap();
    }
}
