//! Publish to the broker-reserved `_SYS.hi` subject and print the
//! connection's last error.
//!
//! Run with: cargo run
//!
//! Requires: nats-server running on 127.0.0.1:4222

use anyhow::Result;
use tracing_subscriber::{fmt as tracing_format, EnvFilter};

use errwatch::SessionConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    tracing_format()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    // A refused connection ends the process here with a non-zero status,
    // before anything is published. Library-level coverage:
    // tests/session_memory.rs `unreachable_nats_broker_fails_connect` and
    // `unreachable_broker_fails_before_publish`.
    let report = errwatch::run(&SessionConfig::default()).await?;

    println!("{}", report.last_error_line());
    Ok(())
}
