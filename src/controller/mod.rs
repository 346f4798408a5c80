//! SeldonDeployment lifecycle controller

mod deployment;
mod lifecycle;

pub use deployment::{
    DeploymentController, DeploymentHandle, FreshDeployment, KubeSeldonClient, SeldonClient,
};
pub use lifecycle::{run_from_manifest, run_lifecycle, LifecyclePlan};
