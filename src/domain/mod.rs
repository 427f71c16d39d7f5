//! Domain layer public interface.
//!
//! This module defines domain-level abstractions that are independent of
//! broker client libraries or infrastructure concerns.
//!
//! All domain consumers must import symbols via this module, not by
//! referencing individual files directly.

mod connection;
mod observer;

// --- Connection domain re-exports ---

pub use connection::{
    //
    AsyncError,
    Connection,
    ConnectionBase,
    ConnectionPtr,
    Message,
    Subject,
    SubscriptionId,
    RESERVED_PREFIX,
};

// --- Error observation re-exports ---

pub use observer::{
    //
    logging_observer,
    ErrorObserver,
    ErrorSink,
    ErrorStream,
};

pub(crate) use observer::lock_ignore_poison;
