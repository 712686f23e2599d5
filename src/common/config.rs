//! Launch configuration for configsync
//!
//! Everything here comes from the command line or the process environment
//! (`CONFIGSYNC_*` variables); the sentinel's own file is the business of
//! [`crate::topology`].

use clap::Parser;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::error::{Error, Result};
use super::utils::parse_duration;

/// Where distros usually put the sentinel's configuration.
pub const DEFAULT_SENTINEL_CONFIG: &str = "/etc/redis/sentinel.conf";

/// Storage-engine tuning and durability directives that are safe to copy
/// verbatim from a primary to its replicas.
const DEFAULT_DIRECTIVES: &[&str] = &[
    "hash-max-ziplist-entries",
    "hash-max-ziplist-value",
    "list-max-ziplist-entries",
    "list-max-ziplist-value",
    "zset-max-ziplist-entries",
    "zset-max-ziplist-value",
    "save",
    "appendfsync",
    "appendonly",
    "no-appendfsync-on-rewrite",
    "auto-aof-rewrite-percentage",
    "auto-aof-rewrite-min-size",
    "aof-rewrite-incremental-fsync",
];

#[derive(Debug, Parser)]
#[command(name = "configsync")]
#[command(about = "Push runtime config directives from pod primaries to their replicas")]
#[command(version)]
pub struct LaunchConfig {
    /// Sentinel configuration file describing the monitored pods
    #[arg(long, env = "CONFIGSYNC_CONFIG_FILE", default_value = DEFAULT_SENTINEL_CONFIG)]
    pub config_file: PathBuf,

    /// Comma-separated replacement for the default directive allow-list
    #[arg(long, env = "CONFIGSYNC_DIRECTIVES")]
    pub directives: Option<String>,

    /// Log intended changes without applying anything
    #[arg(long, env = "CONFIGSYNC_PRETEND")]
    pub pretend: bool,

    /// TCP connect deadline per node (e.g. "500ms", "2s")
    #[arg(long, env = "CONFIGSYNC_CONNECT_TIMEOUT", default_value = "2s", value_parser = parse_duration)]
    pub connect_timeout: Duration,

    /// Deadline for a single command round-trip
    #[arg(long, env = "CONFIGSYNC_OP_TIMEOUT", default_value = "5s", value_parser = parse_duration)]
    pub op_timeout: Duration,

    /// Print the run report as JSON on stdout
    #[arg(long, env = "CONFIGSYNC_SUMMARY_JSON")]
    pub summary_json: bool,
}

impl LaunchConfig {
    /// The effective allow-list: the override when one was given, the
    /// built-in list otherwise.
    pub fn directive_set(&self) -> Result<DirectiveSet> {
        match &self.directives {
            None => Ok(DirectiveSet::default()),
            Some(list) => {
                let set = DirectiveSet::from_list(list);
                if set.is_empty() {
                    return Err(Error::InvalidConfig(format!(
                        "directive override '{list}' contains no directives"
                    )));
                }
                Ok(set)
            }
        }
    }
}

/// The ordered allow-list of directives to keep in sync.
///
/// Order is cosmetic (it fixes the push order) and never affects
/// correctness; every directive in the set is synced on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveSet(Vec<String>);

impl DirectiveSet {
    /// Build a set from a comma-separated list, replacing the default list
    /// wholesale. Blank items from stray commas are dropped.
    pub fn from_list(list: &str) -> Self {
        DirectiveSet(
            list.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for DirectiveSet {
    fn default() -> Self {
        DirectiveSet(DEFAULT_DIRECTIVES.iter().map(|d| d.to_string()).collect())
    }
}

impl fmt::Display for DirectiveSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}
