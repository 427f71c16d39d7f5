// src/connection/memory/mod.rs

//! In-memory connection implementation.
//!
//! This module provides a pure in-process broker and a connection to it.
//! It is intended primarily for testing, local execution, and as a
//! reference for connection semantics.
//!
//! ## Reference Semantics
//!
//! The in-memory connection defines the **reference behavior** for the
//! connection layer. Broker-backed connections are expected to approximate
//! this behavior as closely as their underlying client allows.
//!
//! In particular, it establishes the following expectations:
//!
//! - `publish()` only buffers; the broker sees the message once the
//!   connection's background task hands it over.
//! - `flush()` returns after every earlier publish has reached the broker.
//! - A publish into the reserved `_SYS.` namespace is rejected
//!   asynchronously, through the error sink, never as an `Err` from
//!   `publish()`.
//! - No error sink call happens after `close()` returns.
//!
//! ## Non-Goals
//!
//! This broker does not route messages to subscribers, persist anything,
//! or emulate a wire protocol. It models only what a client observes when
//! publishing: acceptance, or an out-of-band rejection.

mod broker;
mod connection;

pub use broker::{MemoryBroker, MemoryBrokerConfig};
pub use connection::create_connection;
