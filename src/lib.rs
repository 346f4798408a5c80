//! seldon-lifecycle - drive a SeldonDeployment through its lifecycle
//!
//! Creates a `machinelearning.seldon.io/v1` SeldonDeployment, waits until the
//! Seldon operator reports the desired number of available replicas, scales
//! it, waits again, and deletes it.
//!
//! # Modules
//!
//! - [`crd`] - SeldonDeployment custom resource types
//! - [`controller`] - Lifecycle controller and the remote API boundary
//! - [`wait`] - Fixed-interval polling with deadline and cancellation
//! - [`manifest`] - Loading resource definitions from YAML
//! - [`kube_utils`] - Kubernetes client construction
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod controller;
pub mod crd;
pub mod error;
pub mod kube_utils;
pub mod manifest;
pub mod wait;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
