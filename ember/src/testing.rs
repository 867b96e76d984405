//! In-memory stand-in for a remote store connection.
//!
//! [`MemoryStore`] speaks the same `GET`/`SET`/`DEL` contract as a live
//! connection. Clones share state, so a test can hand one clone to a
//! [`RedisCache`](crate::RedisCache) and inspect the store through another.

use crate::ports::{CommandExecutor, Reply};
use parking_lot::Mutex;
use shared::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
    latency: Option<Duration>,
}

#[derive(Debug, Default)]
struct Inner {
    data: Mutex<HashMap<String, String>>,
    log: Mutex<Vec<Vec<String>>>,
    failures: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every command for `latency` so overlapping callers would be caught
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Make the next command fail with a connection error carrying `msg`
    pub fn fail_next(&self, msg: impl Into<String>) {
        self.inner.failures.lock().push(msg.into());
    }

    /// Text stored under `key`, bypassing any decoding
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.data.lock().get(key).cloned()
    }

    /// Store `value` directly, as another client writing plain strings would
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.data.lock().insert(key.into(), value.into());
    }

    /// Every command received so far, name first, in arrival order
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.inner.log.lock().clone()
    }

    /// Highest number of commands that were ever executing at once
    pub fn peak_in_flight(&self) -> usize {
        self.inner.peak_in_flight.load(Ordering::SeqCst)
    }

    fn apply(&self, command: &str, params: &[&str]) -> Result<Reply> {
        let mut data = self.inner.data.lock();
        match (command.to_ascii_uppercase().as_str(), params) {
            ("GET", [key]) => Ok(data.get(*key).cloned().map_or(Reply::Nil, Reply::Text)),
            ("SET", [key, value]) => {
                data.insert(key.to_string(), value.to_string());
                Ok(Reply::Text("OK".to_string()))
            }
            ("DEL", [key]) => {
                let removed = usize::from(data.remove(*key).is_some());
                Ok(Reply::Text(removed.to_string()))
            }
            ("GET" | "SET" | "DEL", _) => Err(Error::Connection(format!(
                "ERR wrong number of arguments for '{}' command",
                command.to_ascii_lowercase()
            ))),
            _ => Err(Error::Connection(format!("ERR unknown command '{}'", command))),
        }
    }
}

impl CommandExecutor for MemoryStore {
    fn execute(&mut self, command: &str, params: &[&str]) -> Result<Reply> {
        let running = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        self.inner.log.lock().push(
            std::iter::once(command)
                .chain(params.iter().copied())
                .map(str::to_string)
                .collect(),
        );

        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }

        let failure = self.inner.failures.lock().pop();
        let result = match failure {
            Some(msg) => Err(Error::Connection(msg)),
            None => self.apply(command, params),
        };

        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
