#![deny(clippy::all)]

use serde_json::Value;
use shared::Result;

// Ports are the pluggable seams between the adapter, the remote store client and callers

/// Reply to a single command sent to the remote store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// A string payload. Status and integer replies are rendered as text.
    Text(String),
    /// The key holds no value
    Nil,
}

impl Reply {
    pub fn into_text(self) -> Option<String> {
        match self {
            Reply::Text(text) => Some(text),
            Reply::Nil => None,
        }
    }
}

/// Port for issuing commands on one connection to the remote store
///
/// Calls are synchronous and blocking. Implementations only need to handle one
/// command at a time; `&mut self` makes the caller responsible for exclusion.
/// At minimum `GET [key]`, `SET [key, value]` and `DEL [key]` must be supported.
/// Network, protocol and store-reported failures are returned as
/// [`shared::Error::Connection`].
pub trait CommandExecutor: Send {
    fn execute(&mut self, command: &str, params: &[&str]) -> Result<Reply>;
}

/// Application-level cache protocol over structured values
pub trait Cache: Send + Sync {
    /// Value stored under `key`, or `None` if there is none
    fn get(&self, key: &str) -> Result<Option<Value>>;

    fn set(&self, key: &str, value: &Value) -> Result<()>;

    /// Remove `key`. Removing a missing key succeeds.
    fn delete(&self, key: &str) -> Result<()>;
}
