//! Error types for SeldonDeployment lifecycle operations

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for lifecycle operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error (connectivity, auth, not found, rejection, conflict)
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// A local file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that was being read
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The resource definition could not be decoded
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Validation error for a resource or a requested replica count
    #[error("validation error: {0}")]
    Validation(String),

    /// Kubernetes client configuration could not be loaded
    #[error("client configuration error: {0}")]
    Config(String),

    /// A wait did not converge before its deadline
    #[error("{operation} timed out after {}s: {last_progress}", waited.as_secs())]
    WaitTimeout {
        /// Name of the wait that timed out
        operation: String,
        /// Time spent waiting
        waited: Duration,
        /// Last progress reported by the check
        last_progress: String,
    },

    /// A wait was cancelled before it converged
    #[error("wait cancelled")]
    Cancelled,
}

impl Error {
    /// Create an IO error for the given path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a manifest error with the given message
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a client configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true if the API server answered 404 Not Found
    pub fn is_not_found(&self) -> bool {
        self.api_status_code() == Some(404)
    }

    /// Returns true if the API server answered 409 Conflict
    ///
    /// Raised for duplicate names on create and for a stale
    /// `resourceVersion` on replace.
    pub fn is_conflict(&self) -> bool {
        self.api_status_code() == Some(409)
    }

    fn api_status_code(&self) -> Option<u16> {
        match self {
            Self::Kube(kube::Error::Api(response)) => Some(response.code),
            _ => None,
        }
    }
}
