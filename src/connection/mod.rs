//! Connection implementations.
//!
//! This module provides concrete implementations of the domain-level
//! `Connection` trait. Broker-backed connections are hidden behind feature
//! flags and exposed only through constructor functions.
//!
//! Domain code must not depend on client-library types.

mod memory;

#[cfg(feature = "transport_nats")]
mod nats;

pub use memory::{
    //
    create_connection as create_memory_connection,
    MemoryBroker,
    MemoryBrokerConfig,
};

#[cfg(feature = "transport_nats")]
pub use nats::create_connection as create_nats_connection;

/// Stand-in used when the `transport_nats` feature is disabled.
#[cfg(not(feature = "transport_nats"))]
pub async fn create_nats_connection(
    _base: crate::ConnectionBase,
    _name: &str,
) -> crate::Result<crate::ConnectionPtr> {
    // ---
    Err(crate::Error::Transport(
        "nats connections require the transport_nats feature".into(),
    ))
}
