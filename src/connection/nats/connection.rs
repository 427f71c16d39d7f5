//! NATS connection implementation using `async-nats`.
//!
//! ## Concurrency model
//!
//! async-nats runs its own connection task that owns the socket. The
//! `Client` handle held here is a cheap, clonable sender into that task.
//! Out-of-band events (server `-ERR` lines, client-side faults, slow
//! consumers) are delivered by the library to the event callback installed
//! at connect time; the callback forwards them to the connection's
//! [`ErrorSink`] and returns immediately.
//!
//! ## Connection behavior
//!
//! Connecting is **eager**: `create_connection` returns only once the
//! server handshake succeeded. Retry on initial connect is left disabled,
//! so an unreachable broker fails at once.
//!
//! ## Close
//!
//! Closing flushes, seals the sink and drops the client handle. async-nats
//! shuts its connection task down once the last handle is gone.

use std::sync::{Arc, Mutex};

use async_nats::{Client, ConnectOptions, Event};

use crate::domain::lock_ignore_poison;
use crate::macros::{log_debug, log_info, log_warn};
use crate::{
    //
    Connection,
    ConnectionBase,
    ConnectionPtr,
    Error,
    ErrorSink,
    Message,
    Result,
    SubscriptionId,
};

/// NATS-based implementation of the `Connection` trait.
struct NatsConnection {
    // ---
    base: ConnectionBase,
    client: Mutex<Option<Client>>,
}

impl NatsConnection {
    // ---

    /// Clone the live client handle, or fail if the connection was closed.
    fn client(&self) -> Result<Client> {
        lock_ignore_poison(&self.client)
            .clone()
            .ok_or(Error::Closed)
    }
}

/// Routes one client event into the error sink.
///
/// Only faults are reported. Lifecycle events (connected, disconnected,
/// lame duck and so on) are logged and otherwise ignored.
fn handle_event(sink: &ErrorSink, event: Event) {
    // ---
    match event {
        Event::ServerError(err) => sink.report(None, err.to_string()),
        Event::ClientError(err) => sink.report(None, err.to_string()),
        Event::SlowConsumer(sid) => sink.report(
            Some(SubscriptionId(sid)),
            format!("slow consumer on subscription {sid}"),
        ),
        other => {
            log_info!("{}: nats event: {other}", sink.connection_id());
        }
    }
}

#[async_trait::async_trait]
impl Connection for NatsConnection {
    // ---
    fn base(&self) -> &ConnectionBase {
        &self.base
    }

    async fn publish(&self, msg: Message) -> Result<()> {
        // ---
        let client = self.client()?;

        client
            .publish(msg.subject.as_str().to_string(), msg.payload)
            .await
            .map_err(|err| Error::Publish(err.to_string()))
    }

    async fn flush(&self) -> Result<()> {
        // ---
        let client = self.client()?;

        client
            .flush()
            .await
            .map_err(|err| Error::Flush(err.to_string()))
    }

    async fn close(&self) -> Result<()> {
        // ---
        let client = lock_ignore_poison(&self.client).take();

        let Some(client) = client else {
            return Ok(());
        };

        if let Err(_err) = client.flush().await {
            log_warn!("{}: flush on close failed: {_err}", self.base.connection_id);
        }

        self.base.sink.seal_async().await;
        drop(client);

        log_debug!("{}: nats connection closed", self.base.connection_id);
        Ok(())
    }
}

/// Connect to the NATS server at `base.url`.
///
/// The error sink in `base` is wired into the client's event callback
/// before the handshake starts. It stays pending until the builder opens
/// it, so faults raised during the handshake surface only as the connect
/// error.
///
/// # Errors
///
/// Returns [`Error::Connect`] if the URL is invalid or the server cannot
/// be reached.
pub async fn create_connection(base: ConnectionBase, name: &str) -> Result<ConnectionPtr> {
    // ---
    let sink = base.sink.clone();

    let options = ConnectOptions::new()
        .name(name)
        .event_callback(move |event| {
            let sink = sink.clone();
            async move { handle_event(&sink, event) }
        });

    let client = options
        .connect(base.url.clone())
        .await
        .map_err(|err| Error::Connect {
            url: base.url.clone(),
            reason: err.to_string(),
        })?;

    log_info!("{}: connected to {}", base.connection_id, base.url);

    Ok(Arc::new(NatsConnection {
        base,
        client: Mutex::new(Some(client)),
    }))
}
