//! One-shot synchronizer binary, meant to run periodically from a scheduler

use clap::Parser;
use configsync::store::RespConnector;
use configsync::sync::synchronize_all;
use configsync::{LaunchConfig, Topology};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let launch = LaunchConfig::parse();
    let directives = launch.directive_set()?;
    tracing::info!(count = directives.len(), list = %directives, "directives to sync");

    // Without topology there is nothing to synchronize; this is the one
    // error that fails the whole invocation.
    let topology = match Topology::load(&launch.config_file) {
        Ok(topology) => topology,
        Err(e) => {
            tracing::error!(error = %e, "cannot load sentinel configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(
        pods = topology.pods.len(),
        file = %launch.config_file.display(),
        pretend = launch.pretend,
        "topology loaded"
    );

    let connector = RespConnector::new(launch.connect_timeout, launch.op_timeout);
    let report = synchronize_all(&connector, &topology, &directives, launch.pretend).await;

    tracing::info!(
        synced = report.pods_synced,
        failed = report.pods_failed,
        "run complete"
    );
    if launch.summary_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    // Per-pod failures are noise for the next scheduled run to retry, not a
    // reason to fail the invocation.
    Ok(())
}
