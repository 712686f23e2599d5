//! Topology loading against on-disk sentinel files

use std::io::Write;

use configsync::common::Error;
use configsync::Topology;
use tempfile::NamedTempFile;

/// A sentinel.conf the way the sentinel itself rewrites it, bookkeeping
/// lines and all.
const REWRITTEN_CONF: &str = "\
port 26379
dir /tmp
sentinel monitor cache01 10.0.0.1 6379 2
sentinel down-after-milliseconds cache01 30000
sentinel auth-pass cache01 secret123
sentinel config-epoch cache01 4
sentinel leader-epoch cache01 4
# Generated by CONFIG REWRITE
sentinel known-slave cache01 10.0.0.2 6379
sentinel known-slave cache01 10.0.0.3 6379
sentinel known-sentinel cache01 10.0.0.7 26379 3f0a1b2c
sentinel monitor sessions 10.0.1.1 6380 3
sentinel current-epoch 4
";

fn write_conf(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_rewritten_conf() {
    let file = write_conf(REWRITTEN_CONF);
    let topo = Topology::load(file.path()).unwrap();

    assert_eq!(topo.port, 26379);
    assert_eq!(topo.dir.to_str(), Some("/tmp"));
    assert_eq!(topo.pods.len(), 2);

    let cache = &topo.pods["cache01"];
    assert_eq!(cache.primary_addr(), "10.0.0.1:6379");
    assert_eq!(cache.quorum, 2);
    assert_eq!(cache.auth_token.as_deref(), Some("secret123"));

    let sessions = &topo.pods["sessions"];
    assert_eq!(sessions.primary_addr(), "10.0.1.1:6380");
    assert_eq!(sessions.quorum, 3);
    assert_eq!(sessions.auth_token, None);
}

#[test]
fn test_missing_file_is_config_read_error() {
    let err = Topology::load("/nonexistent/sentinel.conf").unwrap_err();
    assert!(matches!(err, Error::ConfigRead { .. }), "got {err:?}");
}

#[test]
fn test_comments_and_junk_never_abort() {
    let file = write_conf(
        "# full comment line\n\
         sentinel monitor noted 10.0.0.1 6379 2 # inline marker kills the line\n\
         sentinel monitor kept 10.0.0.2 6379 2\n\
         some-future-keyword with args\n\
         sentinel some-future-subdirective kept xyz\n",
    );
    let topo = Topology::load(file.path()).unwrap();
    assert_eq!(topo.pods.len(), 1);
    assert!(topo.pods.contains_key("kept"));
}

#[test]
fn test_empty_file_yields_empty_topology() {
    let file = write_conf("");
    let topo = Topology::load(file.path()).unwrap();
    assert!(topo.pods.is_empty());
    assert_eq!(topo.port, 0);
}
