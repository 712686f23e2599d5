//! Per-pod configuration synchronization
//!
//! One pass per pod: connect to the configured primary, verify it actually
//! holds the primary role, snapshot the allow-listed directives, and push
//! the snapshot to every replica the primary reports. Failures before the
//! snapshot are terminal for the pod; from the push phase on they are
//! isolated to the failing replica or directive. Re-running converges to
//! the same end state, so the tool is safe to fire from a scheduler.

use serde::Serialize;
use tracing::{info, warn};

use crate::common::{DirectiveSet, Error, Result};
use crate::store::{Connector, Role, StoreLink};
use crate::topology::{PodConfig, Topology};

/// Per-pod accounting for one synchronization pass.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PodReport {
    pub pod: String,
    pub primary: String,
    pub pretend: bool,
    pub replicas_seen: usize,
    pub replicas_skipped: usize,
    pub directives_applied: usize,
    pub directives_failed: usize,
}

/// What happened to one pod in a run.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PodOutcome {
    Synced(PodReport),
    Failed { pod: String, error: String },
}

/// Whole-run summary across every pod.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub pods_synced: usize,
    pub pods_failed: usize,
    pub outcomes: Vec<PodOutcome>,
}

/// Synchronize one pod: read the allow-listed directives from its primary
/// and push them to every replica the primary reports.
///
/// The returned error is terminal for this pod only. Per-replica and
/// per-directive failures are logged and counted in the [`PodReport`], not
/// escalated: success means every replica was attempted, not that every
/// replica converged.
pub async fn synchronize_pod<C: Connector>(
    connector: &C,
    pod: &PodConfig,
    directives: &DirectiveSet,
    pretend: bool,
) -> Result<PodReport> {
    let primary_addr = pod.primary_addr();
    let mut primary = connector
        .connect(&primary_addr, pod.auth_token.as_deref())
        .await?;

    let info = primary.replication_info().await?;
    // Never propagate configuration sourced from a node that does not hold
    // the primary role; it may itself be a replica or mid-failover.
    if info.role != Role::Primary {
        return Err(Error::RoleSafety {
            addr: primary_addr,
            role: info.role.to_string(),
        });
    }

    let snapshot = take_snapshot(&mut primary, &primary_addr, directives).await;

    let mut report = PodReport {
        pod: pod.name.clone(),
        primary: primary_addr.clone(),
        pretend,
        replicas_seen: info.replicas.len(),
        ..Default::default()
    };

    for replica in &info.replicas {
        let replica_addr = replica.to_string();
        if pretend {
            info!(
                pod = %pod.name,
                source = %primary_addr,
                replica = %replica_addr,
                snapshot = ?snapshot,
                "would sync"
            );
            continue;
        }

        info!(pod = %pod.name, source = %primary_addr, replica = %replica_addr, "syncing");
        let mut link = match connector
            .connect(&replica_addr, pod.auth_token.as_deref())
            .await
        {
            Ok(link) => link,
            Err(e) => {
                warn!(pod = %pod.name, replica = %replica_addr, error = %e, "unable to connect to replica, skipping");
                report.replicas_skipped += 1;
                continue;
            }
        };
        for (directive, value) in &snapshot {
            match link.config_set(directive, value).await {
                Ok(()) => report.directives_applied += 1,
                Err(e) => {
                    warn!(pod = %pod.name, replica = %replica_addr, directive = %directive, error = %e, "config set failed");
                    report.directives_failed += 1;
                }
            }
        }
    }

    Ok(report)
}

/// Fetch the current value of every allow-listed directive from the primary.
///
/// A directive that cannot be read contributes an empty value instead of
/// failing the pod; replicas then converge on `""` for it, the same as if
/// the primary had reported it empty.
async fn take_snapshot<L: StoreLink>(
    primary: &mut L,
    addr: &str,
    directives: &DirectiveSet,
) -> Vec<(String, String)> {
    let mut snapshot = Vec::with_capacity(directives.len());
    for name in directives.names() {
        let value = match primary.config_get(name).await {
            Ok(Some(value)) => value,
            Ok(None) => String::new(),
            Err(e) => {
                warn!(primary = addr, directive = name, error = %e, "directive fetch failed, treating as empty");
                String::new()
            }
        };
        snapshot.push((name.to_string(), value));
    }
    snapshot
}

/// Run one synchronization pass over every pod in the topology.
///
/// Pods are independent and processed sequentially; a pod's terminal error
/// is logged and recorded, and the loop moves on to the next pod.
pub async fn synchronize_all<C: Connector>(
    connector: &C,
    topology: &Topology,
    directives: &DirectiveSet,
    pretend: bool,
) -> RunReport {
    let mut report = RunReport::default();
    for pod in topology.pods.values() {
        match synchronize_pod(connector, pod, directives, pretend).await {
            Ok(pod_report) => {
                info!(pod = %pod.name, "synchronized configuration");
                report.pods_synced += 1;
                report.outcomes.push(PodOutcome::Synced(pod_report));
            }
            Err(e) => {
                warn!(pod = %pod.name, error = %e, "error synchronizing pod");
                report.pods_failed += 1;
                report.outcomes.push(PodOutcome::Failed {
                    pod: pod.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    report
}
