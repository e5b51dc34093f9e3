//! Backup trigger - one-shot BackupSession creation for the Strata platform
//!
//! Invoked once per scheduled trigger (typically from a CronJob). Resolves
//! the invoker, validates its targets, and creates or patches one
//! time-stamped BackupSession — or records a skip event and exits.

use std::path::{Path, PathBuf};

use clap::Parser;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use strata_trigger::events::SkipRecorder;
use strata_trigger::invoker::InvokerKind;
use strata_trigger::session::unix_now;
use strata_trigger::trigger::{
    trigger_backup, KubeInvokerSource, KubeSessionStore, TriggerOutcome,
};
use strata_trigger::workload::{discover_deployment_config, WorkloadClients};
use strata_trigger::{Error, Result};

/// Trigger a BackupSession for a backup invoker
#[derive(Parser, Debug)]
#[command(name = "backup-trigger", version, about, long_about = None)]
struct Cli {
    /// The address of the Kubernetes API server (overrides any value in kubeconfig)
    #[arg(long)]
    master: Option<String>,

    /// Path to kubeconfig file with authorization information
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Name of the invoker
    #[arg(long)]
    invoker_name: String,

    /// Kind of the invoker (BackupConfiguration or BackupBatch)
    #[arg(long)]
    invoker_type: String,

    /// Namespace of the invoker and the created session
    #[arg(long, env = "POD_NAMESPACE", default_value = "default")]
    namespace: String,
}

#[tokio::main]
async fn main() {
    // The kube client speaks rustls; a process-wide crypto provider must be
    // installed before any TLS handshake.
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("failed to install the aws-lc-rs crypto provider");
        std::process::exit(1);
    }

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!(error = %e, "backup trigger failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let kind: InvokerKind = cli.invoker_type.parse()?;
    let client = create_client(cli.master.as_deref(), cli.kubeconfig.as_deref()).await?;

    // One capability probe per process; absence of DeploymentConfig support
    // just means the OpenShift workload family never exists on this cluster.
    let deployment_config = discover_deployment_config(&client).await?;

    let invokers = KubeInvokerSource::new(client.clone());
    let targets = WorkloadClients::new(client.clone(), deployment_config);
    let sessions = KubeSessionStore::new(client.clone());
    let skips = SkipRecorder::new(client);

    let outcome = trigger_backup(
        &invokers,
        &targets,
        &sessions,
        &skips,
        kind,
        &cli.invoker_name,
        &cli.namespace,
        unix_now(),
    )
    .await?;

    match outcome {
        TriggerOutcome::Created {
            session_name,
            newly_created,
        } => {
            info!(session = %session_name, newly_created, "trigger complete");
        }
        TriggerOutcome::Skipped { message } => {
            info!("trigger complete: {message}");
        }
    }
    Ok(())
}

/// Build a kube client from the CLI flags.
///
/// With `--kubeconfig` the file is loaded explicitly; otherwise the config
/// is inferred (in-cluster service account or the default kubeconfig).
/// `--master` overrides the API server address either way.
async fn create_client(master: Option<&str>, kubeconfig: Option<&Path>) -> Result<Client> {
    let mut config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .map_err(|e| Error::config(format!("failed to read kubeconfig: {e}")))?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| Error::config(format!("failed to load kubeconfig: {e}")))?
        }
        None => Config::infer()
            .await
            .map_err(|e| Error::config(format!("failed to infer cluster config: {e}")))?,
    };

    if let Some(master) = master {
        config.cluster_url = master
            .parse()
            .map_err(|e| Error::config(format!("invalid --master address {master}: {e}")))?;
    }

    Client::try_from(config).map_err(|e| Error::config(format!("failed to create client: {e}")))
}
