// src/domain/observer.rs

//! Asynchronous error observation.
//!
//! Broker client libraries report out-of-band faults (permission
//! violations, slow consumers, protocol errors) on their own tasks, not on
//! the caller's call sequence. Every connection owns an [`ErrorSink`] that
//! those tasks report into. For each error the sink:
//!
//! - records it as the connection's last error,
//! - invokes the user-supplied [`ErrorObserver`],
//! - forwards it to the session over an unbounded channel ([`ErrorStream`]).
//!
//! The channel is the completion signal the session waits on, so nothing
//! has to poll the last-error slot or sleep for a fixed interval.
//!
//! A sink moves through three states: pending, open, sealed. It is opened
//! once the connection is established and sealed when the connection is
//! closed. Errors reported in any state other than open are dropped, so an
//! observer never runs before the connection exists or after it is gone.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::macros::{log_debug, log_error, log_warn};
use crate::ConnectionId;

use super::{AsyncError, SubscriptionId};

/// Callback invoked for every asynchronous error a connection observes.
///
/// Runs on a library-managed task. It must return promptly and must not
/// block: closing the connection waits for an observer call in progress.
/// A panic is caught and logged, never propagated.
pub type ErrorObserver = Arc<dyn Fn(&AsyncError) + Send + Sync>;

/// The default observer: one `Async Error: <message>` log line per error.
pub fn logging_observer() -> ErrorObserver {
    // ---
    Arc::new(|err: &AsyncError| {
        log_error!("Async Error: {err}");
    })
}

/// Acquire mutex guard, ignoring poisoning
pub(crate) fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn read_ignore_poison<T>(l: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    l.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_ignore_poison<T>(l: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    l.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Connection-owned collector for asynchronous errors.
///
/// Cheap to clone; all clones feed the same last-error slot and stream.
#[derive(Clone)]
pub struct ErrorSink {
    inner: Arc<SinkInner>,
}

struct SinkInner {
    connection_id: ConnectionId,
    observer: ErrorObserver,
    last_error: Mutex<Option<AsyncError>>,
    events: mpsc::UnboundedSender<AsyncError>,
    /// Held for reading across a whole report, so `seal()` waits for any
    /// observer call already in progress.
    state: RwLock<SinkState>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SinkState {
    Pending,
    Open,
    Sealed,
}

impl ErrorSink {
    // ---
    /// Create a sink for one connection, plus the stream the session reads.
    pub fn new(connection_id: ConnectionId, observer: ErrorObserver) -> (Self, ErrorStream) {
        // ---
        let (events, rx) = mpsc::unbounded_channel();

        let sink = Self {
            inner: Arc::new(SinkInner {
                connection_id,
                observer,
                last_error: Mutex::new(None),
                events,
                state: RwLock::new(SinkState::Pending),
            }),
        };

        (sink, ErrorStream { rx })
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.inner.connection_id
    }

    /// Report an asynchronous error.
    ///
    /// Never blocks and never fails. Dropped unless the sink is open.
    pub fn report(&self, subscription: Option<SubscriptionId>, message: impl Into<Arc<str>>) {
        // ---
        let inner = &self.inner;

        let state = read_ignore_poison(&inner.state);
        if *state != SinkState::Open {
            log_debug!(
                "{}: dropping async error reported outside the connection lifetime",
                inner.connection_id
            );
            return;
        }

        let err = AsyncError::new(inner.connection_id.clone(), subscription, message);

        *lock_ignore_poison(&inner.last_error) = Some(err.clone());

        let observer = &inner.observer;
        if panic::catch_unwind(AssertUnwindSafe(|| observer(&err))).is_err() {
            log_warn!("{}: error observer panicked", inner.connection_id);
        }

        // A closed receiver means the session is gone; the slot above still
        // holds the error.
        let _ = inner.events.send(err);
        drop(state);
    }

    /// The most recently reported error.
    pub fn last_error(&self) -> Option<AsyncError> {
        lock_ignore_poison(&self.inner.last_error).clone()
    }

    /// Start accepting errors. Has no effect on a sealed sink.
    pub fn open(&self) {
        // ---
        let mut state = write_ignore_poison(&self.inner.state);
        if *state == SinkState::Pending {
            *state = SinkState::Open;
        }
    }

    /// Stop accepting errors. Idempotent.
    ///
    /// Returns after any report already in progress has finished.
    pub fn seal(&self) {
        *write_ignore_poison(&self.inner.state) = SinkState::Sealed;
    }

    /// [`seal`](Self::seal) for async callers.
    ///
    /// The wait for an in-progress observer call happens on the blocking
    /// pool, so a slow observer does not stall a runtime worker.
    pub async fn seal_async(&self) {
        // ---
        let sink = self.clone();
        if tokio::task::spawn_blocking(move || sink.seal()).await.is_err() {
            self.seal();
        }
    }

    pub fn is_open(&self) -> bool {
        *read_ignore_poison(&self.inner.state) == SinkState::Open
    }

    pub fn is_sealed(&self) -> bool {
        *read_ignore_poison(&self.inner.state) == SinkState::Sealed
    }
}

/// Receiving side of an [`ErrorSink`], owned by the session.
pub struct ErrorStream {
    rx: mpsc::UnboundedReceiver<AsyncError>,
}

impl ErrorStream {
    // ---
    /// Wait for the next error.
    pub async fn next(&mut self) -> Option<AsyncError> {
        self.rx.recv().await
    }

    /// Wait for the next error, giving up after `window`.
    pub async fn next_within(&mut self, window: Duration) -> Option<AsyncError> {
        // ---
        tokio::time::timeout(window, self.rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Take every error already delivered, without waiting.
    pub fn drain(&mut self) -> Vec<AsyncError> {
        // ---
        let mut out = Vec::new();
        while let Ok(err) = self.rx.try_recv() {
            out.push(err);
        }
        out
    }
}
