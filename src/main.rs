//! seldon-lifecycle - create, scale and delete a SeldonDeployment

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use kube::CustomResourceExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use seldon_lifecycle::controller::{run_from_manifest, KubeSeldonClient, LifecyclePlan};
use seldon_lifecycle::crd::SeldonDeployment;
use seldon_lifecycle::kube_utils::{create_client, default_kubeconfig_path};
use seldon_lifecycle::wait::{WaitOptions, DEFAULT_POLL_INTERVAL};

/// Create a SeldonDeployment, wait for it, scale it, wait again, delete it
#[derive(Parser, Debug)]
#[command(name = "seldon-lifecycle", version, about, long_about = None)]
struct Cli {
    /// Print the SeldonDeployment CRD manifest and exit
    #[arg(long)]
    crd: bool,

    /// Namespace to create the deployment in
    #[arg(short, long, env = "SELDON_NAMESPACE", default_value = "default")]
    namespace: String,

    /// Path to the SeldonDeployment YAML definition
    #[arg(short = 'f', long, default_value = "deployment.yml")]
    filename: PathBuf,

    /// Kubeconfig to use (inferred from KUBECONFIG or ~/.kube/config when unset)
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Available replicas to wait for after creation
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(i32).range(0..))]
    initial_replicas: i32,

    /// Replicas to scale to once the initial count is reached
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(i32).range(0..))]
    scale_to: i32,

    /// Seconds between two status polls
    #[arg(
        long,
        default_value_t = DEFAULT_POLL_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    poll_interval_secs: u64,

    /// Give up waiting after this many seconds (waits forever when unset)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Cli {
    fn plan(&self) -> LifecyclePlan {
        LifecyclePlan {
            initial_replicas: self.initial_replicas,
            scale_to: self.scale_to,
            wait: WaitOptions {
                poll_interval: Duration::from_secs(self.poll_interval_secs),
                timeout: self.timeout_secs.map(Duration::from_secs),
            },
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    if cli.crd {
        let crd = serde_yaml::to_string(&SeldonDeployment::crd())
            .context("failed to serialize CRD")?;
        println!("{crd}");
        return Ok(());
    }

    let kubeconfig = cli
        .kubeconfig
        .clone()
        .or_else(|| std::env::var_os("KUBECONFIG").map(PathBuf::from))
        .or_else(default_kubeconfig_path)
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "in-cluster".to_string());
    info!(
        kubeconfig = %kubeconfig,
        namespace = %cli.namespace,
        "Starting seldon deployment lifecycle"
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling wait");
            trigger.cancel();
        }
    });

    let kubeconfig_path = cli.kubeconfig.clone();
    let connect = move || async move {
        create_client(kubeconfig_path.as_deref())
            .await
            .map(KubeSeldonClient::new)
    };
    run_from_manifest(&cli.filename, &cli.namespace, connect, &cli.plan(), &cancel)
        .await
        .with_context(|| {
            format!(
                "seldon deployment lifecycle for {} failed",
                cli.filename.display()
            )
        })?;

    Ok(())
}
