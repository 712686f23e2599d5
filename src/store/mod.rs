//! Connection capability for talking to store nodes
//!
//! The synchronizer needs exactly three things from a node: its replication
//! status, the value of one directive, and setting one directive. They are
//! expressed as traits so tests can script a whole topology without opening
//! a socket; [`resp`] is the production implementation.

pub mod resp;

pub use resp::RespConnector;

use std::fmt;
use std::future::Future;

use crate::common::Result;

/// Node role as the node itself reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Primary,
    Replica,
    /// Anything else, e.g. a node mid-failover or a sentinel answering on
    /// the wrong port.
    Other(String),
}

impl Role {
    /// Map a wire-level role name onto the model.
    pub fn from_wire(raw: &str) -> Role {
        match raw {
            "master" => Role::Primary,
            "slave" | "replica" => Role::Replica,
            other => Role::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => write!(f, "master"),
            Role::Replica => write!(f, "slave"),
            Role::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// Address of a replica as reported by its primary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaAddr {
    pub ip: String,
    pub port: u16,
}

impl fmt::Display for ReplicaAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Replication status of one node.
#[derive(Debug, Clone)]
pub struct ReplicationInfo {
    pub role: Role,
    pub replicas: Vec<ReplicaAddr>,
}

/// Dials authenticated connections to store nodes.
pub trait Connector {
    type Link: StoreLink;

    /// Open a connection to `addr`, authenticating when a token is given.
    fn connect(&self, addr: &str, auth: Option<&str>) -> impl Future<Output = Result<Self::Link>>;
}

/// One live connection to a store node.
pub trait StoreLink {
    fn replication_info(&mut self) -> impl Future<Output = Result<ReplicationInfo>>;

    /// Current value of a directive; `None` when the node does not know it.
    fn config_get(&mut self, directive: &str) -> impl Future<Output = Result<Option<String>>>;

    fn config_set(&mut self, directive: &str, value: &str) -> impl Future<Output = Result<()>>;
}
