//! Line-oriented parser for the sentinel configuration file

use std::io::BufRead;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use super::{PodConfig, Topology};
use crate::common::Result;

/// Parse a sentinel configuration into a [`Topology`].
///
/// The file is processed one physical line at a time. Anything the parser
/// does not understand is logged and skipped; only an I/O error from
/// `reader` aborts the load. A `#` anywhere marks the whole line as
/// commentary, so directive values containing the marker are unsupported.
///
/// Duplicate `sentinel monitor` lines are deduplicated by the resolved
/// primary address (first seen wins) even though the pod map is keyed by
/// name; this mirrors how the sentinel itself tolerates rewritten files.
pub fn load_topology<R: BufRead>(reader: R) -> Result<Topology> {
    let mut topo = Topology::default();
    for line in reader.lines() {
        let line = line?;
        parse_line(&mut topo, line.trim());
    }
    Ok(topo)
}

fn parse_line(topo: &mut Topology, line: &str) {
    if line.contains('#') {
        return;
    }
    let entries: Vec<&str> = line.split(' ').collect();
    match entries[0] {
        "" => {}
        "bind" => {
            if let Some(&host) = entries.get(1) {
                topo.host = host.to_string();
            }
        }
        "port" => {
            if let Some(&raw) = entries.get(1) {
                topo.port = lenient_number(raw, "port");
            }
        }
        "dir" => {
            if let Some(&dir) = entries.get(1) {
                topo.dir = PathBuf::from(dir);
            }
        }
        "sentinel" => sentinel_directive(topo, &entries[1..]),
        other => warn!(keyword = other, "unhandled configuration keyword"),
    }
}

fn sentinel_directive(topo: &mut Topology, entries: &[&str]) {
    match entries.first().copied().unwrap_or("") {
        "monitor" => match entries {
            &[_, name, host, port, quorum, ..] => {
                let port = lenient_number(port, "monitor port");
                let addr = format!("{host}:{port}");
                // Dedup is by resolved address, not by the name the map is
                // keyed on: the first monitor line for an address wins.
                if topo.pods.values().any(|p| p.primary_addr() == addr) {
                    warn!(pod = name, %addr, "duplicate monitor for a registered primary, ignoring");
                    return;
                }
                topo.pods.insert(
                    name.to_string(),
                    PodConfig {
                        name: name.to_string(),
                        host: host.to_string(),
                        port,
                        quorum: lenient_number(quorum, "monitor quorum"),
                        auth_token: None,
                    },
                );
            }
            _ => warn!(?entries, "malformed monitor directive"),
        },
        "auth-pass" => match entries {
            &[_, name, token, ..] => match topo.pods.get_mut(name) {
                Some(pod) => pod.auth_token = Some(token.to_string()),
                // Only `monitor` creates pods; an auth-pass for a name we
                // have not seen is dropped rather than materializing an
                // empty pod.
                None => warn!(pod = name, "auth-pass for unknown pod, ignoring"),
            },
            _ => warn!(?entries, "malformed auth-pass directive"),
        },
        // Sentinel bookkeeping, not ours.
        "config-epoch" | "leader-epoch" | "current-epoch" | "down-after-milliseconds"
        | "known-sentinel" | "known-slave" => {}
        other => warn!(directive = other, "unhandled sentinel sub-directive"),
    }
}

/// Malformed numbers fall back to zero instead of aborting: the sentinel
/// owns this file, and a periodic job has to survive whatever it writes.
// TODO: count these anomalies and surface them in the run report.
fn lenient_number<T: FromStr + Default>(raw: &str, field: &str) -> T {
    match raw.parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(value = raw, field, "malformed numeric field, using 0");
            T::default()
        }
    }
}
