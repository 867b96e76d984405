//! Cache adapter backed by a Redis-compatible key-value store.
//!
//! [`RedisCache`] maps `get`/`set`/`delete` on structured values onto the
//! store's `GET`/`SET`/`DEL` commands. Values that are not plain strings are
//! stored as JSON text; on read, anything that parses as JSON comes back
//! structured and anything else comes back as a string. All commands issued by
//! one adapter share a single connection and run one at a time.

pub mod adapter;
pub mod domain;
pub mod ports;

#[cfg(feature = "redis")]
pub mod connection;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use adapter::RedisCache;
#[cfg(feature = "redis")]
pub use connection::RedisConnection;
pub use ports::{Cache, CommandExecutor, Reply};
pub use serde_json::Value;
pub use shared::{Error, Result};
