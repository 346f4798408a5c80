//! Custom Resource Definitions for Seldon Core
//!
//! This module contains the SeldonDeployment resource managed by this crate.

mod deployment;
mod types;

pub use deployment::{SeldonDeployment, SeldonDeploymentSpec, SeldonDeploymentStatus};
pub use types::{
    Addressable, DeploymentGroupStatus, DeploymentState, Endpoint, Parameter, PredictiveUnit,
    PredictiveUnitType, PredictorSpec, Protocol, SeldonPodSpec, ServerType, ServiceStatus, Ssl,
    Transport,
};
