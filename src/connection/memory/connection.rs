// src/connection/memory/connection.rs

//! Connection to the in-process reference broker.
//!
//! Follows the same actor model as the broker-backed connections:
//!
//! - A single background **actor task** owns the link to the broker.
//! - `publish()` enqueues a command and returns; the actor hands the
//!   message to the broker later. That queue is the connection's local
//!   outbound buffer.
//! - `flush()` enqueues a marker and waits for the actor to reach it.
//!   Commands are processed in order, so every earlier publish has been
//!   handed over by then.
//! - Broker rejections are delivered on a separate spawned task after the
//!   broker's configured delay, which is what makes them asynchronous with
//!   respect to the caller.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::macros::{log_debug, log_info};
use crate::{
    //
    Connection,
    ConnectionBase,
    ConnectionPtr,
    Error,
    ErrorSink,
    Message,
    Result,
};

use super::MemoryBroker;

/// Outbound buffer size, in commands.
const OUTBOUND_CAPACITY: usize = 64;

//
// Actor commands
//

enum Cmd {
    //
    Publish(Message),
    Flush { resp: oneshot::Sender<()> },
    Close { resp: oneshot::Sender<()> },
}

enum ActorStep {
    //
    Continue,
    Stop,
}

impl Cmd {
    // ---

    /// Dispatches an actor command to the correct handler on the actor
    fn handle(self, actor: &mut MemoryActor) -> ActorStep {
        // ---

        match self {
            Cmd::Publish(msg) => {
                actor.handle_publish(msg);
                ActorStep::Continue
            }
            Cmd::Flush { resp } => {
                let _ = resp.send(());
                ActorStep::Continue
            }
            Cmd::Close { resp } => {
                log_debug!("{}: memory connection closing", actor.sink.connection_id());
                let _ = resp.send(());
                ActorStep::Stop
            }
        }
    }
}

struct MemoryActor {
    // ---
    broker: MemoryBroker,
    sink: ErrorSink,
    cmd_rx: mpsc::Receiver<Cmd>,
}

impl MemoryActor {
    // ---

    async fn run(mut self) {
        // ---
        while let Some(cmd) = self.cmd_rx.recv().await {
            if matches!(cmd.handle(&mut self), ActorStep::Stop) {
                break;
            }
        }
        log_debug!("{}: memory actor stopped", self.sink.connection_id());
    }

    /// Hands one message to the broker and schedules any rejection.
    fn handle_publish(&mut self, msg: Message) {
        // ---
        let Err(reason) = self.broker.receive(msg) else {
            return;
        };

        let sink = self.sink.clone();
        let delay = self.broker.config().error_delay;

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            sink.report(None, reason);
        });
    }
}

/// In-memory implementation of the `Connection` trait.
struct MemoryConnection {
    // ---
    base: ConnectionBase,
    cmd_tx: mpsc::Sender<Cmd>,
    task: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait::async_trait]
impl Connection for MemoryConnection {
    // ---
    fn base(&self) -> &ConnectionBase {
        &self.base
    }

    async fn publish(&self, msg: Message) -> Result<()> {
        // ---
        self.cmd_tx
            .send(Cmd::Publish(msg))
            .await
            .map_err(|_| Error::Closed)
    }

    async fn flush(&self) -> Result<()> {
        // ---
        let (tx, rx) = oneshot::channel();

        self.cmd_tx
            .send(Cmd::Flush { resp: tx })
            .await
            .map_err(|_| Error::Closed)?;

        rx.await.map_err(|_| Error::Closed)
    }

    /// Close the connection.
    ///
    /// Seals the error sink first so that rejections still in flight are
    /// dropped, then stops the actor and waits for it.
    async fn close(&self) -> Result<()> {
        // ---
        self.base.sink.seal_async().await;

        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(Cmd::Close { resp: tx }).await.is_ok() {
            let _ = rx.await;
        }

        if let Some(handle) = self.task.lock().await.take() {
            let _ = handle.await;
        }

        Ok(())
    }
}

/// Create a connection to `broker`.
///
/// # Errors
///
/// Returns [`Error::Connect`] if the broker is configured unreachable.
pub async fn create_connection(base: ConnectionBase, broker: MemoryBroker) -> Result<ConnectionPtr> {
    // ---
    if let Err(reason) = broker.accept_connection() {
        return Err(Error::Connect {
            url: base.url.clone(),
            reason: reason.into(),
        });
    }

    let (cmd_tx, cmd_rx) = mpsc::channel(OUTBOUND_CAPACITY);

    let actor = MemoryActor {
        broker,
        sink: base.sink.clone(),
        cmd_rx,
    };
    let handle = tokio::spawn(actor.run());

    log_info!("{}: connected to {}", base.connection_id, base.url);

    Ok(Arc::new(MemoryConnection {
        base,
        cmd_tx,
        task: Mutex::new(Some(handle)),
    }))
}
