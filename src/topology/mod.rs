//! Topology model parsed from the sentinel's configuration file
//!
//! The sentinel supervises one or more replication groups ("pods") and keeps
//! its view of them in its own on-disk configuration, which it rewrites as
//! the cluster changes. That file is the source of truth for which pods
//! exist and how to authenticate to them; nothing in this module touches the
//! network.

mod loader;

pub use loader::load_topology;

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// One monitored replication group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodConfig {
    pub name: String,

    /// Primary address as last written by the sentinel. Not necessarily
    /// current truth; the synchronizer verifies the role before trusting it.
    pub host: String,
    pub port: u16,

    /// Sentinels that must agree before a failover. Carried for
    /// completeness; synchronization never consults it.
    pub quorum: u32,

    /// Shared secret for the primary and every replica of this pod.
    pub auth_token: Option<String>,
}

impl PodConfig {
    /// `host:port` of the pod's configured primary.
    pub fn primary_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The sentinel's view of itself plus every pod it monitors.
///
/// Built in one pass over the configuration file, read-only afterwards.
/// Rebuilt from scratch on every invocation; nothing is persisted.
#[derive(Debug, Default)]
pub struct Topology {
    /// Sentinel's own bind host, port and working directory, parsed for
    /// completeness.
    pub host: String,
    pub port: u16,
    pub dir: PathBuf,

    /// Pod name → pod. Insertion order is irrelevant.
    pub pods: HashMap<String, PodConfig>,
}

impl Topology {
    /// Load the topology from a sentinel configuration file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        load_topology(BufReader::new(file)).map_err(|e| match e {
            Error::Io(source) => Error::ConfigRead {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }
}
