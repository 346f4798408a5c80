//! Loading SeldonDeployment definitions from YAML files

use std::path::Path;

use kube::Resource;
use tracing::debug;

use crate::crd::SeldonDeployment;
use crate::{Error, Result};

/// Read a SeldonDeployment definition from a YAML file.
///
/// The path is resolved against the current directory before reading so
/// errors name the file unambiguously.
pub async fn load_deployment(path: &Path) -> Result<SeldonDeployment> {
    let path = std::path::absolute(path).map_err(|e| Error::io(path, e))?;
    debug!(path = %path.display(), "Reading SeldonDeployment definition");

    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| Error::io(&path, e))?;

    parse_deployment(&content)
}

/// Decode and validate a SeldonDeployment definition.
///
/// The document must declare `apiVersion: machinelearning.seldon.io/v1` and
/// `kind: SeldonDeployment`, carry either `metadata.name` or
/// `metadata.generateName`, and pass spec validation.
pub fn parse_deployment(content: &str) -> Result<SeldonDeployment> {
    let document: serde_yaml::Value = serde_yaml::from_str(content)
        .map_err(|e| Error::manifest(format!("invalid YAML: {}", e)))?;

    let expected_api_version = SeldonDeployment::api_version(&());
    let expected_kind = SeldonDeployment::kind(&());

    let api_version = document.get("apiVersion").and_then(|v| v.as_str());
    if api_version != Some(&*expected_api_version) {
        return Err(Error::manifest(format!(
            "expected apiVersion {}, found {}",
            expected_api_version,
            api_version.unwrap_or("<none>")
        )));
    }

    let kind = document.get("kind").and_then(|v| v.as_str());
    if kind != Some(&*expected_kind) {
        return Err(Error::manifest(format!(
            "expected kind {}, found {}",
            expected_kind,
            kind.unwrap_or("<none>")
        )));
    }

    let deployment: SeldonDeployment = serde_yaml::from_value(document)
        .map_err(|e| Error::manifest(format!("invalid {}: {}", expected_kind, e)))?;

    if deployment.metadata.name.is_none() && deployment.metadata.generate_name.is_none() {
        return Err(Error::validation(
            "SeldonDeployment must have metadata.name or metadata.generateName",
        ));
    }
    deployment.spec.validate()?;

    Ok(deployment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::PredictiveUnitType;

    const IRIS: &str = r#"
apiVersion: machinelearning.seldon.io/v1
kind: SeldonDeployment
metadata:
  name: iris-model
  namespace: seldon
spec:
  name: iris
  predictors:
  - name: default
    replicas: 1
    graph:
      name: classifier
      type: MODEL
      implementation: SKLEARN_SERVER
      modelUri: gs://seldon-models/v1.18.0/sklearn/iris
    componentSpecs:
    - spec:
        containers:
        - name: classifier
          image: seldonio/sklearnserver:1.18.0
"#;

    #[test]
    fn parses_a_sklearn_deployment() {
        let deployment = parse_deployment(IRIS).unwrap();

        assert_eq!(deployment.metadata.name.as_deref(), Some("iris-model"));
        assert_eq!(deployment.spec.name.as_deref(), Some("iris"));
        let predictor = &deployment.spec.predictors[0];
        assert_eq!(predictor.name, "default");
        assert_eq!(predictor.replicas, Some(1));
        assert_eq!(predictor.graph.type_, Some(PredictiveUnitType::Model));
        assert_eq!(
            predictor.graph.model_uri.as_deref(),
            Some("gs://seldon-models/v1.18.0/sklearn/iris")
        );
        assert_eq!(predictor.component_specs.len(), 1);
        assert!(predictor.component_specs[0].spec.is_some());
    }

    #[test]
    fn generate_name_is_enough() {
        let manifest = IRIS.replace("  name: iris-model", "  generateName: iris-");
        let deployment = parse_deployment(&manifest).unwrap();

        assert!(deployment.metadata.name.is_none());
        assert_eq!(deployment.metadata.generate_name.as_deref(), Some("iris-"));
    }

    /// Story: fields this crate does not type are submitted unchanged
    #[test]
    fn ssl_and_untyped_fields_survive_decoding() {
        let manifest = IRIS
            .replace(
                "  - name: default\n",
                "  - name: default\n    ssl:\n      certSecretName: iris-tls\n    \
                 dnsPolicy: ClusterFirst\n",
            )
            .replace(
                "      implementation: SKLEARN_SERVER\n",
                "      implementation: SKLEARN_SERVER\n      envSecretRefName: s3-creds\n      \
                 customField: kept\n",
            )
            .replace("  name: iris\n", "  name: iris\n  futureFlag: true\n");

        let deployment = parse_deployment(&manifest).unwrap();
        let predictor = &deployment.spec.predictors[0];
        assert_eq!(
            predictor.ssl.as_ref().and_then(|ssl| ssl.cert_secret_name.as_deref()),
            Some("iris-tls")
        );

        let encoded = serde_json::to_value(&deployment).unwrap();
        let spec = &encoded["spec"];
        assert_eq!(spec["futureFlag"], true);
        assert_eq!(spec["predictors"][0]["ssl"]["certSecretName"], "iris-tls");
        assert_eq!(spec["predictors"][0]["dnsPolicy"], "ClusterFirst");
        assert_eq!(spec["predictors"][0]["graph"]["customField"], "kept");
        assert_eq!(spec["predictors"][0]["graph"]["envSecretRefName"], "s3-creds");
        assert_eq!(spec["predictors"][0]["replicas"], 1);
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let err = parse_deployment("spec: [unclosed").unwrap_err();
        assert!(matches!(err, Error::Manifest(_)));
        assert!(err.to_string().contains("invalid YAML"));
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let manifest = IRIS.replace("kind: SeldonDeployment", "kind: Deployment");
        let err = parse_deployment(&manifest).unwrap_err();
        assert!(err.to_string().contains("expected kind SeldonDeployment, found Deployment"));
    }

    #[test]
    fn wrong_api_version_is_rejected() {
        let manifest = IRIS.replace("machinelearning.seldon.io/v1", "apps/v1");
        let err = parse_deployment(&manifest).unwrap_err();
        assert!(err.to_string().contains("found apps/v1"));
    }

    #[test]
    fn schema_mismatch_is_rejected() {
        let manifest = IRIS.replace("replicas: 1", "replicas: lots");
        let err = parse_deployment(&manifest).unwrap_err();
        assert!(matches!(err, Error::Manifest(_)));
    }

    #[test]
    fn missing_name_is_rejected() {
        let manifest = IRIS.replace("  name: iris-model\n", "");
        let err = parse_deployment(&manifest).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployment.yml");
        std::fs::write(&path, IRIS).unwrap();

        let deployment = load_deployment(&path).await.unwrap();

        assert_eq!(deployment.metadata.name.as_deref(), Some("iris-model"));
    }

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yml");

        let err = load_deployment(&path).await.unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("missing.yml"));
    }
}
