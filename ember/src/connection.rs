use crate::adapter::RedisCache;
use crate::ports::{CommandExecutor, Reply};
use redis::{ConnectionAddr, ConnectionInfo, FromRedisValue, RedisConnectionInfo, RedisError};
use shared::config::Config;
use shared::{Error, Result};
use tracing::{debug, info, warn};

/// Synchronous connection to a Redis-compatible server
pub struct RedisConnection {
    conn: redis::Connection,
}

impl RedisConnection {
    /// Connect to `address:port`, sending `AUTH` when a password is given
    pub fn open(address: &str, port: u16, password: Option<&str>) -> Result<Self> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(address.to_string(), port),
            redis: RedisConnectionInfo {
                password: password.map(str::to_string),
                ..Default::default()
            },
        };

        let conn = redis::Client::open(info)
            .and_then(|client| client.get_connection())
            .map_err(|e| {
                warn!("Failed to connect to {}:{}: {}", address, port, e);
                connection_error(e)
            })?;

        info!("Connected to remote store at {}:{}", address, port);
        Ok(Self { conn })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(&config.host, config.port, config.password.as_deref())
    }
}

impl CommandExecutor for RedisConnection {
    fn execute(&mut self, command: &str, params: &[&str]) -> Result<Reply> {
        let value: redis::Value = redis::cmd(command)
            .arg(params)
            .query(&mut self.conn)
            .map_err(connection_error)?;

        reply_from(value)
    }
}

/// Map a server reply onto [`Reply`]
///
/// Nil is [`Reply::Nil`]; bulk, status and integer replies are text. A bulk
/// string that is not UTF-8 was written by some other client and is kept as
/// text with invalid sequences replaced, rather than failing the read.
fn reply_from(value: redis::Value) -> Result<Reply> {
    match value {
        redis::Value::BulkString(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Ok(Reply::Text(text)),
            Err(e) => {
                debug!("Reply is not valid UTF-8, replacing invalid bytes");
                Ok(Reply::Text(String::from_utf8_lossy(e.as_bytes()).into_owned()))
            }
        },
        other => Option::<String>::from_owned_redis_value(other)
            .map(|reply| reply.map_or(Reply::Nil, Reply::Text))
            .map_err(connection_error),
    }
}

impl std::fmt::Debug for RedisConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConnection").finish_non_exhaustive()
    }
}

impl RedisCache<RedisConnection> {
    /// Open a new connection to `address:port` and wrap it
    ///
    /// Fails with [`Error::Connection`] if the server cannot be reached or
    /// rejects the password.
    pub fn connect(address: &str, port: u16, password: Option<&str>) -> Result<Self> {
        RedisConnection::open(address, port, password).map(Self::new)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        RedisConnection::from_config(config).map(Self::new)
    }
}

fn connection_error(err: RedisError) -> Error {
    Error::Connection(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_mapping() {
        assert_eq!(reply_from(redis::Value::Nil).unwrap(), Reply::Nil);
        assert_eq!(
            reply_from(redis::Value::Okay).unwrap(),
            Reply::Text("OK".to_string())
        );
        assert_eq!(
            reply_from(redis::Value::Int(1)).unwrap(),
            Reply::Text("1".to_string())
        );
        assert_eq!(
            reply_from(redis::Value::SimpleString("PONG".to_string())).unwrap(),
            Reply::Text("PONG".to_string())
        );
        assert_eq!(
            reply_from(redis::Value::BulkString(br#"{"x":1}"#.to_vec())).unwrap(),
            Reply::Text(r#"{"x":1}"#.to_string())
        );
    }

    #[test]
    fn test_non_utf8_bulk_string_is_lossy_text() {
        let reply = reply_from(redis::Value::BulkString(vec![b'a', 0xff, b'b'])).unwrap();
        assert_eq!(reply, Reply::Text("a\u{fffd}b".to_string()));
    }

    #[test]
    fn test_non_string_reply_is_connection_error() {
        let result = reply_from(redis::Value::Array(vec![
            redis::Value::Int(1),
            redis::Value::Int(2),
        ]));
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[test]
    fn test_unreachable_server_is_connection_error() {
        // Nothing listens on the discard port
        let result = RedisCache::connect("127.0.0.1", 9, None);
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    // Needs a server reachable through EMBER_REDIS_HOST / EMBER_REDIS_PORT / EMBER_REDIS_PASSWORD
    #[test]
    #[ignore]
    fn test_live_round_trip() {
        let cache = RedisCache::from_config(&Config::from_env()).unwrap();
        let key = "ember:test:live_round_trip";

        cache.set(key, &json!({"n": 1, "s": "two"})).unwrap();
        assert_eq!(cache.get(key).unwrap(), Some(json!({"n": 1, "s": "two"})));

        cache.set(key, &json!("plain")).unwrap();
        assert_eq!(cache.get(key).unwrap(), Some(json!("plain")));

        cache.delete(key).unwrap();
        cache.delete(key).unwrap();
        assert_eq!(cache.get(key).unwrap(), None);
    }
}
