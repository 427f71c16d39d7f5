// tests/observer_output.rs
//
// Console output of the default error observer.

#![cfg(feature = "logging")]

use std::io;
use std::sync::{Arc, Mutex};

use errwatch::{run_with, MemoryBroker, SessionConfig};

/// Shared in-memory sink for formatted log output.
#[derive(Clone, Default)]
struct Captured {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// Current-thread runtime: the broker's delivery task runs on this thread,
// so the scoped subscriber below sees the observer's event.
#[tokio::test]
async fn default_observer_logs_async_error_line() {
    // ---
    // Arrange
    // ---
    let captured = Captured::default();
    let writer = captured.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let config = SessionConfig::memory();
    let builder = config
        .connection_builder()
        .memory_broker(MemoryBroker::default());

    // ---
    // Act
    // ---
    let report = run_with(&config, builder).await.expect("session failed");

    // ---
    // Assert
    // ---
    let expected = "Async Error: permissions violation for publish to \"_SYS.hi\"";
    let output = captured.text();
    let lines: Vec<&str> = output.lines().filter(|l| l.contains(expected)).collect();

    assert_eq!(lines.len(), 1, "captured output:\n{output}");
    assert_eq!(
        report.last_error_line(),
        "nc.LastError:  permissions violation for publish to \"_SYS.hi\""
    );
}
