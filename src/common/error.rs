//! Error types for configsync

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === Topology load ===
    #[error("Cannot read {path}: {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Store connections ===
    #[error("Connection to {addr} failed: {detail}")]
    Connect { addr: String, detail: String },

    #[error("Node {addr} reports role '{role}', refusing to read configuration from it")]
    RoleSafety { addr: String, role: String },

    #[error("Timed out waiting for {what} on {addr}")]
    Timeout { addr: String, what: &'static str },

    // === Wire protocol ===
    #[error("Server error: {0}")]
    Server(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for connection-phase failures.
    pub fn connect(addr: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Connect {
            addr: addr.into(),
            detail: detail.into(),
        }
    }
}
