//! Common configuration, errors and helpers shared across configsync

pub mod config;
pub mod error;
pub mod utils;

pub use config::{DirectiveSet, LaunchConfig, DEFAULT_SENTINEL_CONFIG};
pub use error::{Error, Result};
pub use utils::parse_duration;
