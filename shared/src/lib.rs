// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("connection: {0}")]
    Connection(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for failures reported by the remote store or its connection
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection(_))
    }
}

pub mod config;
