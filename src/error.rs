use thiserror::Error;

/// Errors returned by session and connection operations.
///
/// Asynchronous broker errors are not represented here. They are delivered
/// through the error observer and recorded as the connection's last error.
#[derive(Error, Debug)]
pub enum Error {
    /// The initial connection to the broker could not be established
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// The client library refused to buffer a publish
    #[error("publish failed: {0}")]
    Publish(String),

    /// Outbound data could not be handed to the transport
    #[error("flush failed: {0}")]
    Flush(String),

    /// The connection has already been closed
    #[error("connection closed")]
    Closed,

    /// Subject is empty or contains whitespace
    #[error("invalid subject: {0}")]
    InvalidSubject(String),

    /// A required builder field was not set
    #[error("missing required configuration: {0}")]
    MissingConfig(String),

    /// Connection backend is unknown or not compiled in
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type alias for session and connection operations
pub type Result<T> = std::result::Result<T, Error>;
