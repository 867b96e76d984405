use crate::domain::{decode, encode};
use crate::ports::{Cache, CommandExecutor, Reply};
use parking_lot::Mutex;
use serde_json::Value;
use shared::Result;
use tracing::{debug, warn};

const CMD_GET: &str = "GET";
const CMD_SET: &str = "SET";
const CMD_DEL: &str = "DEL";

/// Cache over a single remote store connection
///
/// The connection is owned by the adapter and only reachable through its
/// mutex, so at most one command is in flight at any time no matter how many
/// threads share the adapter. The lock covers the command only; encoding and
/// decoding run outside it.
pub struct RedisCache<E> {
    conn: Mutex<E>,
}

impl<E: CommandExecutor> RedisCache<E> {
    /// Wrap an already-open connection
    pub fn new(conn: E) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Consume the adapter and hand back its connection
    pub fn into_inner(self) -> E {
        self.conn.into_inner()
    }

    // The guard is dropped when this returns, on success and on error alike
    fn execute(&self, command: &str, params: &[&str]) -> Result<Reply> {
        debug!("Executing {} '{}'", command, params.first().copied().unwrap_or_default());

        let result = self.conn.lock().execute(command, params);

        if let Err(ref e) = result {
            warn!("{} failed: {}", command, e);
        }
        result
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let reply = self.execute(CMD_GET, &[key])?;
        Ok(reply.into_text().map(decode))
    }

    pub fn set(&self, key: &str, value: &Value) -> Result<()> {
        let encoded = encode(value)?;
        self.execute(CMD_SET, &[key, &*encoded])?;
        Ok(())
    }

    /// Delete `key`; deleting a key that does not exist is not an error
    pub fn delete(&self, key: &str) -> Result<()> {
        self.execute(CMD_DEL, &[key])?;
        Ok(())
    }
}

impl<E: CommandExecutor> Cache for RedisCache<E> {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        RedisCache::get(self, key)
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        RedisCache::set(self, key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        RedisCache::delete(self, key)
    }
}

impl<E> std::fmt::Debug for RedisCache<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("busy", &self.conn.is_locked())
            .finish()
    }
}
