use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identity of a single broker connection.
///
/// Every connection gets a fresh id when it is built. The id travels with
/// each asynchronous error so observers can tell connections apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(Arc<str>);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    /// Borrow the connection ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ConnectionId {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
