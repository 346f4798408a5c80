//! The create, wait, scale, wait, delete run

use std::future::Future;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::deployment::{DeploymentController, SeldonClient};
use crate::crd::SeldonDeployment;
use crate::manifest::load_deployment;
use crate::wait::WaitOptions;
use crate::Result;

/// Replica targets and wait settings for one lifecycle run
#[derive(Clone, Debug)]
pub struct LifecyclePlan {
    /// Replicas to wait for after creation
    pub initial_replicas: i32,
    /// Replicas to scale to once the initial count is reached
    pub scale_to: i32,
    /// Interval and deadline for both waits
    pub wait: WaitOptions,
}

impl Default for LifecyclePlan {
    fn default() -> Self {
        Self {
            initial_replicas: 1,
            scale_to: 2,
            wait: WaitOptions::default(),
        }
    }
}

/// Create `desired`, wait for the initial replicas, scale, wait again, delete.
///
/// Steps run strictly one after another; the first error ends the run and
/// leaves the resource in place.
pub async fn run_lifecycle<C: SeldonClient>(
    controller: &DeploymentController<C>,
    desired: SeldonDeployment,
    plan: &LifecyclePlan,
    cancel: &CancellationToken,
) -> Result<()> {
    let handle = controller.create(desired).await?;
    let name = handle.name().to_string();

    info!(deployment = %name, replicas = plan.initial_replicas, "Waiting for initial replicas");
    let handle = controller
        .wait_until_replicas_reached(&handle, plan.initial_replicas, &plan.wait, cancel)
        .await?;

    info!(deployment = %name, replicas = plan.scale_to, "Scaling deployment");
    let handle = controller.update_replicas(&handle, plan.scale_to).await?;

    info!(deployment = %name, replicas = plan.scale_to, "Waiting for scaled replicas");
    let handle = controller
        .wait_until_replicas_reached(&handle, plan.scale_to, &plan.wait, cancel)
        .await?;

    controller.delete(handle).await?;
    info!(deployment = %name, "Lifecycle complete");
    Ok(())
}

/// Load the definition at `path`, connect, and run the lifecycle in
/// `namespace`.
///
/// `connect` is only called once the definition has been decoded and
/// validated, so a bad file fails before anything talks to the cluster.
pub async fn run_from_manifest<C, F, Fut>(
    path: &Path,
    namespace: &str,
    connect: F,
    plan: &LifecyclePlan,
    cancel: &CancellationToken,
) -> Result<()>
where
    C: SeldonClient,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<C>>,
{
    let desired = load_deployment(path).await?;
    debug!(path = %path.display(), "Loaded seldon deployment definition");

    let controller = DeploymentController::new(connect().await?, namespace);
    run_lifecycle(&controller, desired, plan, cancel).await
}
