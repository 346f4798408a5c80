//! Stories run against the real Seldon operator

use std::time::Duration;

use kube::api::{Api, DeleteParams, ListParams};
use kube::Client;
use tokio_util::sync::CancellationToken;

use seldon_lifecycle::controller::{
    run_lifecycle, DeploymentController, KubeSeldonClient, LifecyclePlan,
};
use seldon_lifecycle::crd::SeldonDeployment;
use seldon_lifecycle::kube_utils::create_client;
use seldon_lifecycle::manifest::parse_deployment;
use seldon_lifecycle::wait::WaitOptions;

const IRIS: &str = include_str!("../../manifests/iris.yml");

fn namespace() -> String {
    std::env::var("SELDON_TEST_NAMESPACE").unwrap_or_else(|_| "seldon-lifecycle-test".into())
}

/// Rollouts on a fresh cluster pull images, so give them a generous deadline
fn wait_options() -> WaitOptions {
    WaitOptions::with_timeout(Duration::from_secs(600)).poll_interval(Duration::from_secs(2))
}

async fn test_client() -> Client {
    create_client(None)
        .await
        .expect("failed to create client - is a cluster reachable?")
}

/// Removes leftovers from earlier interrupted runs
async fn cleanup_iris(client: &Client, namespace: &str) {
    let api: Api<SeldonDeployment> = Api::namespaced(client.clone(), namespace);
    let Ok(list) = api.list(&ListParams::default()).await else {
        return;
    };
    for sdep in list {
        let Some(name) = sdep.metadata.name else {
            continue;
        };
        if name.starts_with("iris-") {
            let _ = api.delete(&name, &DeleteParams::default()).await;
        }
    }
}

/// Story: operator runs the whole lifecycle against a real cluster
///
/// The run creates the iris model, waits for one replica, scales to two,
/// waits again and deletes it. Afterwards nothing named `iris-*` is left.
#[tokio::test]
#[ignore = "requires a cluster with Seldon Core - run with: cargo test --test kind -- --ignored"]
async fn story_full_lifecycle_leaves_nothing_behind() {
    let client = test_client().await;
    let namespace = namespace();
    cleanup_iris(&client, &namespace).await;

    let controller =
        DeploymentController::new(KubeSeldonClient::new(client.clone()), namespace.clone());
    let desired = parse_deployment(IRIS).expect("iris manifest should parse");
    let plan = LifecyclePlan {
        wait: wait_options(),
        ..Default::default()
    };

    run_lifecycle(&controller, desired, &plan, &CancellationToken::new())
        .await
        .expect("lifecycle should complete");

    let api: Api<SeldonDeployment> = Api::namespaced(client, &namespace);
    let remaining = api
        .list(&ListParams::default())
        .await
        .expect("failed to list deployments");
    assert!(
        remaining
            .iter()
            .filter_map(|sdep| sdep.metadata.name.as_deref())
            .all(|name| !name.starts_with("iris-")),
        "iris deployment should be gone"
    );
}

/// Story: scaling through the controller is visible at every level
///
/// The stored resource carries the new count on the spec, every predictor
/// and every component spec, and the operator converges on it.
#[tokio::test]
#[ignore = "requires a cluster with Seldon Core - run with: cargo test --test kind -- --ignored"]
async fn story_scale_updates_every_replica_field() {
    let client = test_client().await;
    let namespace = namespace();
    cleanup_iris(&client, &namespace).await;

    let controller =
        DeploymentController::new(KubeSeldonClient::new(client.clone()), namespace.clone());
    let desired = parse_deployment(IRIS).expect("iris manifest should parse");
    let cancel = CancellationToken::new();
    let options = wait_options();

    let handle = controller.create(desired).await.expect("create failed");
    let handle = controller
        .wait_until_replicas_reached(&handle, 1, &options, &cancel)
        .await
        .expect("initial rollout failed");
    let handle = controller
        .update_replicas(&handle, 2)
        .await
        .expect("scale failed");

    let stored = controller
        .refresh(&handle)
        .await
        .expect("failed to read back deployment");
    let spec = &stored.resource().spec;
    assert_eq!(spec.replicas, Some(2));
    for predictor in &spec.predictors {
        assert_eq!(predictor.replicas, Some(2));
        for component in &predictor.component_specs {
            assert_eq!(component.replicas, Some(2));
        }
    }

    let handle = controller
        .wait_until_replicas_reached(&handle, 2, &options, &cancel)
        .await
        .expect("scaled rollout failed");
    controller.delete(handle).await.expect("delete failed");
}
