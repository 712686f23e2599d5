//! # configsync
//!
//! Keeps runtime configuration directives consistent across the replication
//! pods a sentinel supervises. The store's replication stream does not carry
//! `CONFIG SET` changes from a primary to its replicas, and the sentinel does
//! not either; a primary tuned at runtime therefore drifts from its replicas
//! until the next restart or failover. This tool closes the gap: it reads the
//! sentinel's own configuration file to learn the topology, asks each pod's
//! primary for its current directive values, and pushes the allow-listed ones
//! to every replica.
//!
//! ## Architecture
//!
//! ```text
//! sentinel.conf ──► topology::load ──► Topology { pod name → PodConfig }
//!                                          │
//!                                          ▼  per pod, sequentially
//!                              ┌───────────────────────────┐
//!                              │      sync::synchronize_pod │
//!                              │  1. connect to primary     │
//!                              │  2. verify role == primary │
//!                              │  3. snapshot directives    │
//!                              │  4. push to each replica   │
//!                              └───────────┬───────────────┘
//!                                          │ store::Connector
//!                                          ▼
//!                              primary + replicas (RESP)
//! ```
//!
//! Failures are isolated at the smallest useful granularity: a bad directive
//! never sinks its replica, a dead replica never sinks its pod, a broken pod
//! never sinks the run.
//!
//! ## Usage
//!
//! ```bash
//! # Dry run against the default /etc/redis/sentinel.conf
//! configsync --pretend
//!
//! # Periodic invocation with an explicit file and allow-list
//! CONFIGSYNC_CONFIG_FILE=/etc/redis/sentinel.conf \
//! CONFIGSYNC_DIRECTIVES=save,appendonly,appendfsync \
//! configsync --summary-json
//! ```

pub mod common;
pub mod store;
pub mod sync;
pub mod topology;

// Re-export commonly used types
pub use common::{DirectiveSet, Error, LaunchConfig, Result};
pub use topology::Topology;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
