//! Session bootstrapper.
//!
//! Drives one linear exchange against a broker: connect with an error
//! observer installed, publish a single message, flush, wait for the
//! asynchronous error path, report the last error, close.
//!
//! The wait is bounded by [`SessionConfig::error_window`]. With the default
//! [`ErrorWait::FirstError`] the session returns as soon as the first error
//! arrives on the connection's error stream; a broker that answers later
//! than the window is still missed, and the report says so by carrying no
//! last error.

use std::fmt;

use bytes::Bytes;

use crate::macros::{log_debug, log_info};
use crate::{
    //
    AsyncError,
    ConnectionBuilder,
    ConnectionPtr,
    ErrorStream,
    ErrorWait,
    Message,
    Result,
    SessionConfig,
    Subject,
};

/// What a session observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Errors delivered to the session within the wait window, in order.
    pub observed: Vec<AsyncError>,

    /// The connection's last error, read after the wait.
    pub last_error: Option<AsyncError>,
}

impl SessionReport {
    /// The last error text, or an empty string if none was recorded.
    pub fn last_error_text(&self) -> &str {
        self.last_error
            .as_ref()
            .map(|err| err.message.as_ref())
            .unwrap_or("")
    }

    /// The final report line: `nc.LastError:  <value-or-empty>`.
    pub fn last_error_line(&self) -> String {
        format!("nc.LastError:  {}", self.last_error_text())
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.last_error_line())
    }
}

/// An open session: one connection plus the stream of its errors.
///
/// The session owns its connection exclusively. Call [`Session::close`]
/// when done; [`run`] does this on every path once connected.
pub struct Session {
    config: SessionConfig,
    connection: ConnectionPtr,
    errors: ErrorStream,
}

impl Session {
    // ---
    /// Connect using `builder`, which carries the URL, observer and any
    /// backend-specific settings.
    ///
    /// No retry: a failed connect is returned as is.
    pub async fn open(config: SessionConfig, builder: ConnectionBuilder) -> Result<Self> {
        // ---
        let (connection, errors) = builder.build().await?;

        log_info!(
            "{}: session connected to {}",
            connection.connection_id(),
            connection.url()
        );

        Ok(Self {
            config,
            connection,
            errors,
        })
    }

    pub fn connection(&self) -> &ConnectionPtr {
        &self.connection
    }

    /// Publish, flush, wait for asynchronous errors, read the last error.
    pub async fn exchange(&mut self) -> Result<SessionReport> {
        // ---
        let subject = Subject::new(self.config.subject.as_str())?;
        let payload = Bytes::from(self.config.payload.clone().into_bytes());

        self.connection
            .publish(Message::new(subject, payload))
            .await?;

        self.connection.flush().await?;
        log_debug!("{}: flushed", self.connection.connection_id());

        let window = self.config.error_window;
        let mut observed = Vec::new();

        match self.config.error_wait {
            ErrorWait::FirstError => {
                if let Some(err) = self.errors.next_within(window).await {
                    observed.push(err);
                }
            }
            ErrorWait::FixedDelay => tokio::time::sleep(window).await,
        }
        observed.extend(self.errors.drain());

        Ok(SessionReport {
            observed,
            last_error: self.connection.last_error(),
        })
    }

    /// Close the connection. No observer call happens after this returns.
    pub async fn close(self) -> Result<()> {
        // ---
        log_debug!("{}: closing session", self.connection.connection_id());
        self.connection.close().await
    }
}

/// Run one session with the default builder for `config`.
///
/// # Errors
///
/// Returns [`Error::Connect`](crate::Error::Connect) if the broker cannot
/// be reached; nothing is published in that case.
pub async fn run(config: &SessionConfig) -> Result<SessionReport> {
    run_with(config, config.connection_builder()).await
}

/// Run one session using a caller-supplied connection builder.
///
/// The connection is closed whether or not the exchange succeeded. An
/// exchange error takes precedence over a close error.
pub async fn run_with(config: &SessionConfig, builder: ConnectionBuilder) -> Result<SessionReport> {
    // ---
    let mut session = Session::open(config.clone(), builder).await?;

    let outcome = session.exchange().await;
    let closed = session.close().await;

    let report = outcome?;
    closed?;

    Ok(report)
}
