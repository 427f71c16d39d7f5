//! NATS connection implementation based on async-nats.
//!
//! This module adapts the async-nats client to the domain-level
//! `Connection` trait without leaking NATS types upward.
//!
//! # Features
//!
//! - Client events are routed into the connection's error sink
//! - Connect happens eagerly; a refused connection fails immediately
//! - No reconnect on initial connect failure
//!
//! # Usage
//!
//! Enabled by default through the `transport_nats` feature:
//!
//! ```toml
//! [dependencies]
//! errwatch = { version = "0.1", features = ["transport_nats"] }
//! ```

mod connection;
pub use connection::create_connection;
