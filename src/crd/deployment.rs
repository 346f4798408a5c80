//! SeldonDeployment Custom Resource Definition
//!
//! A SeldonDeployment describes one or more predictors (inference graphs plus
//! the pods that serve them). The Seldon operator turns each predictor into
//! Kubernetes Deployments and reports their availability in the status.
//!
//! Only the parts of the schema this crate reads or writes are typed; pod
//! specs, autoscaler settings and explainers are carried as opaque JSON, and
//! fields without a typed counterpart land in `extra`, so a decoded resource
//! can be re-submitted without losing fields.

use std::collections::{BTreeMap, HashSet};

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{
    Addressable, DeploymentGroupStatus, DeploymentState, PredictorSpec, Protocol, ServerType,
    ServiceStatus, Transport,
};

/// Specification for a SeldonDeployment
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "machinelearning.seldon.io",
    version = "v1",
    kind = "SeldonDeployment",
    plural = "seldondeployments",
    shortname = "sdep",
    status = "SeldonDeploymentStatus",
    namespaced,
    derive = "PartialEq",
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Replicas","type":"integer","jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SeldonDeploymentSpec {
    /// Deployment name used by the operator for generated resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Predictors served by this deployment
    pub predictors: Vec<PredictorSpec>,

    /// Default replica count for every predictor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Wire protocol of the inference graph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,

    /// Transport between orchestrator and components
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<Transport>,

    /// Server type fronting the predictors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_type: Option<ServerType>,

    /// Annotations applied to generated resources
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// OAuth key for the legacy API gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_key: Option<String>,

    /// OAuth secret for the legacy API gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_secret: Option<String>,

    /// Fields not modelled here, kept so a re-submitted resource loses nothing
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SeldonDeploymentSpec {
    /// Set the replica target on the spec, every predictor, and every
    /// component spec of every predictor.
    ///
    /// The operator honours the most specific level, so all three must agree
    /// for a scale request to take effect.
    pub fn set_replicas(&mut self, replicas: i32) {
        self.replicas = Some(replicas);
        for predictor in &mut self.predictors {
            predictor.replicas = Some(replicas);
            for component in &mut predictor.component_specs {
                component.replicas = Some(replicas);
            }
        }
    }

    /// Validate the deployment specification
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.predictors.is_empty() {
            return Err(crate::Error::validation(
                "a SeldonDeployment needs at least one predictor",
            ));
        }

        let mut names = HashSet::new();
        for predictor in &self.predictors {
            if predictor.name.is_empty() {
                return Err(crate::Error::validation("predictor name must not be empty"));
            }
            if !names.insert(predictor.name.as_str()) {
                return Err(crate::Error::validation(format!(
                    "duplicate predictor name '{}'",
                    predictor.name
                )));
            }
        }

        if let Some(replicas) = self.replicas.filter(|r| *r < 0) {
            return Err(crate::Error::validation(format!(
                "spec.replicas must not be negative, got {replicas}"
            )));
        }
        for predictor in &self.predictors {
            if let Some(replicas) = predictor.replicas.filter(|r| *r < 0) {
                return Err(crate::Error::validation(format!(
                    "predictor '{}' replicas must not be negative, got {replicas}",
                    predictor.name
                )));
            }
            for (i, component) in predictor.component_specs.iter().enumerate() {
                if let Some(replicas) = component.replicas.filter(|r| *r < 0) {
                    return Err(crate::Error::validation(format!(
                        "predictor '{}' componentSpecs[{i}] replicas must not be negative, got {replicas}",
                        predictor.name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Status for a SeldonDeployment, written by the Seldon operator
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeldonDeploymentStatus {
    /// Overall state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<DeploymentState>,

    /// Human-readable message about the current state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Per-deployment status, keyed by Kubernetes Deployment name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deployment_status: BTreeMap<String, DeploymentGroupStatus>,

    /// Per-service status, keyed by Kubernetes Service name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub service_status: BTreeMap<String, ServiceStatus>,

    /// Total replicas across deployments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Inference endpoint address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Addressable>,
}

impl SeldonDeploymentStatus {
    /// Available replica counts per deployment group, in name order
    pub fn available_replicas(&self) -> Vec<(&str, i32)> {
        self.deployment_status
            .iter()
            .map(|(name, group)| (name.as_str(), group.available_replicas))
            .collect()
    }

    /// Returns true if every deployment group reports exactly `target`
    /// available replicas.
    ///
    /// A status without any groups has not been populated by the operator
    /// yet and never counts as converged.
    pub fn replicas_converged(&self, target: i32) -> bool {
        !self.deployment_status.is_empty()
            && self
                .deployment_status
                .values()
                .all(|group| group.available_replicas == target)
    }
}
