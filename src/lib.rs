//! Observe a broker's asynchronous error path from a minimal client session
//!
//! This library connects to a messaging broker with an error observer
//! installed, publishes one message into the broker-reserved `_SYS.`
//! namespace, flushes, and reports the error the broker sends back
//! out-of-band. NATS is supported through `async-nats`; an in-process
//! reference broker makes the same exchange testable without a server.
//!
//! ```no_run
//! # async fn example() -> errwatch::Result<()> {
//! let report = errwatch::run(&errwatch::SessionConfig::default()).await?;
//! println!("{}", report.last_error_line());
//! # Ok(())
//! # }
//! ```

// Import all sub modules once...
mod macros;

mod connection;
mod domain;
mod session;

mod connection_builder;
mod session_config;

mod connection_id;
mod error;

// Re-export main types
pub use session::{run, run_with, Session, SessionReport};

pub use connection_builder::ConnectionBuilder;
pub use session_config::{
    //
    ErrorWait,
    SessionConfig,
    DEFAULT_ERROR_WINDOW,
    DEFAULT_NAME,
    DEFAULT_PAYLOAD,
    DEFAULT_SUBJECT,
    DEFAULT_URL,
};

pub use connection_id::ConnectionId;
pub use error::{Error, Result};

pub use connection::{
    //
    create_memory_connection,
    create_nats_connection,
    MemoryBroker,
    MemoryBrokerConfig,
};

// --- public re-exports
pub use domain::{
    //
    logging_observer,
    AsyncError,
    Connection,
    ConnectionBase,
    ConnectionPtr,
    ErrorObserver,
    ErrorSink,
    ErrorStream,
    Message,
    Subject,
    SubscriptionId,
    RESERVED_PREFIX,
};
