//! SeldonDeployment lifecycle controller
//!
//! Drives a single SeldonDeployment through create, wait, scale and delete.
//! The last observed resource travels in a [`DeploymentHandle`] that callers
//! own; waits and updates borrow it and return a refreshed one, and only
//! `delete` consumes it. Replica changes are only applied to a
//! [`FreshDeployment`], which can only be obtained by re-reading the resource
//! from the API server.

use async_trait::async_trait;
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

#[cfg(test)]
use mockall::automock;

use crate::crd::{SeldonDeployment, SeldonDeploymentStatus};
use crate::wait::{poll_until, Poll, WaitOptions};
use crate::{Error, Result};

/// Trait abstracting the namespaced SeldonDeployment API
///
/// This trait allows mocking the Kubernetes client in tests while using
/// the real client in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SeldonClient: Send + Sync {
    /// Create a SeldonDeployment, returning the server's representation
    async fn create(
        &self,
        namespace: &str,
        deployment: &SeldonDeployment,
    ) -> Result<SeldonDeployment>;

    /// Fetch the current representation of a SeldonDeployment
    async fn get(&self, namespace: &str, name: &str) -> Result<SeldonDeployment>;

    /// Replace a SeldonDeployment, returning the accepted representation
    ///
    /// The API server rejects the request with 409 Conflict when the
    /// `resourceVersion` in `deployment` is not the latest one.
    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        deployment: &SeldonDeployment,
    ) -> Result<SeldonDeployment>;

    /// Delete a SeldonDeployment
    async fn delete(&self, namespace: &str, name: &str) -> Result<()>;
}

/// Real Kubernetes client implementation
pub struct KubeSeldonClient {
    client: Client,
}

impl KubeSeldonClient {
    /// Create a new KubeSeldonClient wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<SeldonDeployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl SeldonClient for KubeSeldonClient {
    async fn create(
        &self,
        namespace: &str,
        deployment: &SeldonDeployment,
    ) -> Result<SeldonDeployment> {
        Ok(self
            .api(namespace)
            .create(&PostParams::default(), deployment)
            .await?)
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<SeldonDeployment> {
        Ok(self.api(namespace).get(name).await?)
    }

    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        deployment: &SeldonDeployment,
    ) -> Result<SeldonDeployment> {
        Ok(self
            .api(namespace)
            .replace(name, &PostParams::default(), deployment)
            .await?)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        let response = self
            .api(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        if response.is_left() {
            debug!(namespace, name, "Deletion accepted, finalizers pending");
        }
        Ok(())
    }
}

/// The last observed state of one SeldonDeployment
///
/// Only built from an API server response, so `name` is always the
/// server-assigned name, including names produced from `generateName`.
#[derive(Clone, Debug)]
pub struct DeploymentHandle {
    namespace: String,
    name: String,
    resource: SeldonDeployment,
}

impl DeploymentHandle {
    fn from_response(namespace: &str, resource: SeldonDeployment) -> Result<Self> {
        let name = resource.metadata.name.clone().ok_or_else(|| {
            Error::validation("API server returned a SeldonDeployment without metadata.name")
        })?;
        Ok(Self {
            namespace: namespace.to_string(),
            name,
            resource,
        })
    }

    /// Namespace of the resource
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Server-assigned name of the resource
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last observed representation
    pub fn resource(&self) -> &SeldonDeployment {
        &self.resource
    }

    /// Last observed status, if the operator has written one
    pub fn status(&self) -> Option<&SeldonDeploymentStatus> {
        self.resource.status.as_ref()
    }
}

/// A representation read from the API server immediately before a mutation
///
/// Mutations go through this type so an update is always computed from the
/// latest `resourceVersion`; a concurrent writer makes the update fail with
/// a conflict instead of being silently overwritten.
#[derive(Clone, Debug)]
pub struct FreshDeployment(SeldonDeployment);

impl FreshDeployment {
    /// Set the replica target at the spec, predictor and component levels
    pub fn with_replicas(mut self, replicas: i32) -> Self {
        self.0.spec.set_replicas(replicas);
        self
    }

    /// The fetched representation
    pub fn resource(&self) -> &SeldonDeployment {
        &self.0
    }
}

/// Controller for the lifecycle of SeldonDeployments in one namespace
///
/// Generic over the client so tests can substitute a mock.
pub struct DeploymentController<C: SeldonClient> {
    client: C,
    namespace: String,
}

impl<C: SeldonClient> DeploymentController<C> {
    /// Create a controller operating in `namespace`
    pub fn new(client: C, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    /// Namespace this controller operates in
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Submit a new SeldonDeployment.
    ///
    /// The controller's namespace overrides any namespace on `desired`.
    #[instrument(skip(self, desired), fields(namespace = %self.namespace))]
    pub async fn create(&self, mut desired: SeldonDeployment) -> Result<DeploymentHandle> {
        desired.metadata.namespace = Some(self.namespace.clone());

        let created = self.client.create(&self.namespace, &desired).await?;
        let handle = DeploymentHandle::from_response(&self.namespace, created)?;

        info!(deployment = %handle.name, "Created seldon deployment");
        Ok(handle)
    }

    /// Poll until every deployment group reports exactly `target` available
    /// replicas, returning the handle refreshed by the final poll.
    ///
    /// A failed fetch ends the wait immediately. The wait is bounded by
    /// `options.timeout` and interrupted by `cancel`. The caller keeps
    /// `handle`, so the resource can still be deleted after a failed wait.
    #[instrument(skip(self, handle, options, cancel), fields(deployment = %handle.name))]
    pub async fn wait_until_replicas_reached(
        &self,
        handle: &DeploymentHandle,
        target: i32,
        options: &WaitOptions,
        cancel: &CancellationToken,
    ) -> Result<DeploymentHandle> {
        validate_replicas(target)?;

        let client = &self.client;
        let namespace = handle.namespace.as_str();
        let name = handle.name.as_str();

        poll_until(options, cancel, "wait_for_replicas", move || async move {
            let fetched = client.get(namespace, name).await?;
            let current = DeploymentHandle::from_response(namespace, fetched)?;

            let status = current.status().cloned().unwrap_or_default();
            if status.replicas_converged(target) {
                info!(
                    deployment = %name,
                    replicas = target,
                    "Deployment reached desired replica count"
                );
                return Ok(Poll::Ready(current));
            }

            let observed = status.available_replicas();
            for (group, available) in observed.iter().filter(|(_, n)| *n != target) {
                info!(
                    deployment = %name,
                    group = %group,
                    desired = target,
                    available = *available,
                    "Deployment currently not at desired replica count"
                );
            }
            let counts: Vec<i32> = observed.iter().map(|(_, n)| *n).collect();
            Ok(Poll::Pending(format!(
                "want {target} available replicas in every group, observed {counts:?}"
            )))
        })
        .await
    }

    /// Re-read the resource so it can be mutated
    pub async fn refresh(&self, handle: &DeploymentHandle) -> Result<FreshDeployment> {
        let current = self.client.get(&handle.namespace, &handle.name).await?;
        Ok(FreshDeployment(current))
    }

    /// Scale the deployment to `target` replicas.
    ///
    /// Re-reads the resource, sets the target at the spec, predictor and
    /// component levels, and replaces it. Conflicts are returned, not retried.
    #[instrument(skip(self, handle), fields(deployment = %handle.name))]
    pub async fn update_replicas(
        &self,
        handle: &DeploymentHandle,
        target: i32,
    ) -> Result<DeploymentHandle> {
        validate_replicas(target)?;

        let desired = self.refresh(handle).await?.with_replicas(target);
        let accepted = self
            .client
            .replace(&handle.namespace, &handle.name, desired.resource())
            .await?;

        info!(
            deployment = %handle.name,
            replicas = target,
            "Updated seldon deployment replicas"
        );
        DeploymentHandle::from_response(&handle.namespace, accepted)
    }

    /// Delete the deployment, consuming its handle
    #[instrument(skip(self, handle), fields(deployment = %handle.name))]
    pub async fn delete(&self, handle: DeploymentHandle) -> Result<()> {
        self.client.delete(&handle.namespace, &handle.name).await?;
        info!(deployment = %handle.name, "Deleted seldon deployment");
        Ok(())
    }
}

fn validate_replicas(target: i32) -> Result<()> {
    if target < 0 {
        return Err(Error::validation(format!(
            "replica count must not be negative, got {target}"
        )));
    }
    Ok(())
}
