//! Supporting types for the SeldonDeployment CRD

use std::collections::BTreeMap;

use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Schema for fields passed through to the operator untouched, so the API
/// server does not prune them
fn preserve_unknown_fields(_: &mut SchemaGenerator) -> Schema {
    let mut schema = SchemaObject {
        instance_type: Some(InstanceType::Object.into()),
        ..Default::default()
    };
    schema
        .extensions
        .insert("nullable".to_string(), serde_json::Value::Bool(true));
    schema.extensions.insert(
        "x-kubernetes-preserve-unknown-fields".to_string(),
        serde_json::Value::Bool(true),
    );
    Schema::Object(schema)
}

/// Wire protocol spoken by the inference graph
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Seldon protocol (default)
    #[default]
    Seldon,
    /// TensorFlow Serving protocol
    Tensorflow,
    /// KFServing V2 protocol (legacy name)
    Kfserving,
    /// Open inference V2 protocol
    V2,
}

/// Transport between the orchestrator and graph components
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// HTTP REST (default)
    #[default]
    Rest,
    /// gRPC
    Grpc,
}

/// Server type fronting the predictors
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    /// Synchronous request/response (default)
    #[default]
    Rpc,
    /// Kafka streaming
    Kafka,
}

/// Role of a node in the inference graph
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictiveUnitType {
    /// Type not specified
    UnknownType,
    /// Routes requests to one child
    Router,
    /// Combines the outputs of all children
    Combiner,
    /// Produces a prediction
    Model,
    /// Transforms the request before it reaches the children
    Transformer,
    /// Transforms the response after the children answer
    OutputTransformer,
}

/// A single predictor: an inference graph plus the pods that run it
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictorSpec {
    /// Predictor name, unique within the deployment
    pub name: String,

    /// Root of the inference graph
    pub graph: PredictiveUnit,

    /// Pod templates for the graph components
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component_specs: Vec<SeldonPodSpec>,

    /// Replica count for this predictor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Percentage of traffic routed to this predictor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic: Option<i32>,

    /// Mirror traffic without returning responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<bool>,

    /// Labels added to the predictor's pods
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Annotations added to the predictor's resources
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Resource requirements for the service orchestrator container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub engine_resources: Option<serde_json::Value>,

    /// Service orchestrator settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub svc_orch_spec: Option<serde_json::Value>,

    /// Model explainer deployed next to the predictor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub explainer: Option<serde_json::Value>,

    /// Seconds a rollout may take before it is reported as failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_deadline_seconds: Option<i32>,

    /// TLS settings for the predictor's ingress
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<Ssl>,

    /// Fields not modelled here, kept so a re-submitted resource loses nothing
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Pod template for one or more graph components
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeldonPodSpec {
    /// Pod metadata (labels, annotations, name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub metadata: Option<serde_json::Value>,

    /// Kubernetes PodSpec, passed through unchanged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub spec: Option<serde_json::Value>,

    /// Horizontal pod autoscaler settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub hpa_spec: Option<serde_json::Value>,

    /// KEDA autoscaler settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub keda_spec: Option<serde_json::Value>,

    /// Pod disruption budget settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub pdb_spec: Option<serde_json::Value>,

    /// Replica count for the pods of this component spec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Fields not modelled here, kept so a re-submitted resource loses nothing
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A node of the inference graph
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveUnit {
    /// Name matching a container in the component specs
    pub name: String,

    /// Child nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PredictiveUnit>,

    /// Role of the node
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<PredictiveUnitType>,

    /// Prepackaged server implementation (e.g. SKLEARN_SERVER)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,

    /// Methods the node implements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,

    /// Endpoint the orchestrator calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,

    /// Parameters passed to the component
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,

    /// Storage URI of the model artifact
    #[serde(default, rename = "modelUri", skip_serializing_if = "Option::is_none")]
    pub model_uri: Option<String>,

    /// Service account used to download the artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    /// Secret holding credentials for the artifact store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_secret_ref_name: Option<String>,

    /// Image used to download the artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_initializer_image: Option<String>,

    /// Request/response logger settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub logger: Option<serde_json::Value>,

    /// Fields not modelled here, kept so a re-submitted resource loses nothing
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// TLS settings of a predictor
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ssl {
    /// Secret holding the serving certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_secret_name: Option<String>,
}

/// Endpoint of a graph node
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Host serving the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_host: Option<String>,

    /// Port serving the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_port: Option<i32>,

    /// REST or GRPC
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// HTTP port of the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_port: Option<i32>,

    /// gRPC port of the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc_port: Option<i32>,
}

/// Named, typed parameter passed to a graph node
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Value as a string
    pub value: String,
    /// Value type (INT, FLOAT, DOUBLE, STRING, BOOL)
    #[serde(rename = "type")]
    pub type_: String,
}

/// Overall state reported by the Seldon operator
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum DeploymentState {
    /// Resources are being created or rolled out
    Creating,
    /// All deployments are available
    Available,
    /// The operator gave up on the rollout
    Failed,
}

/// Status of one Kubernetes Deployment created for a predictor
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentGroupStatus {
    /// Deployment name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Deployment status string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Desired replicas
    #[serde(default)]
    pub replicas: i32,

    /// Replicas that are available; omitted by the operator when zero
    #[serde(default)]
    pub available_replicas: i32,

    /// Predictor this deployment explains, for explainer deployments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explainer_for: Option<String>,
}

/// Status of one Kubernetes Service created for a predictor
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    /// Service name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svc_name: Option<String>,

    /// In-cluster HTTP endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_endpoint: Option<String>,

    /// In-cluster gRPC endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc_endpoint: Option<String>,

    /// Explainer this service fronts, for explainer services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explainer_for: Option<String>,
}

/// Address where the deployment can be reached
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Addressable {
    /// URL of the inference endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
