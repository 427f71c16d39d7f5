// tests/nats_live.rs
//
// Requires a nats-server on 127.0.0.1:4222 that rejects publishes into the
// reserved `_SYS.` namespace. Not every server configuration does, so these
// tests are ignored by default.
//
// Run with: cargo test --test nats_live -- --ignored

#![cfg(feature = "transport_nats")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use errwatch::{run_with, SessionConfig};

#[tokio::test]
#[ignore = "needs a live nats-server enforcing the _SYS namespace"]
async fn live_server_rejects_reserved_subject() {
    // ---
    let config = SessionConfig::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);

    let builder = config.connection_builder().error_observer(move |err| {
        println!("Async Error: {err}");
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let report = run_with(&config, builder).await.expect("session failed");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!report.last_error_text().is_empty());
    assert_eq!(report.observed.len(), 1);
    assert_eq!(report.observed[0].message, report.last_error.unwrap().message);
}
