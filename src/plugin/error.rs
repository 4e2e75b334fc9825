//! Publish error types.

use std::time::Duration;

use thiserror::Error;

use crate::security::{PathError, RegistryError, TOKEN_ENV_VAR};

/// Result type for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Errors that can occur while publishing a crate.
///
/// Every variant becomes a failed response; none of them abort the host.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Manifest path escapes the working tree.
    #[error("configuration validation failed: invalid manifest_path: {0}")]
    InvalidManifestPath(#[source] PathError),

    /// Registry name or URL rejected.
    #[error("configuration validation failed: invalid registry: {0}")]
    InvalidRegistry(#[source] RegistryError),

    /// No token in the configuration or the environment.
    #[error(
        "no API token provided: set token in config or {} environment variable",
        TOKEN_ENV_VAR
    )]
    MissingToken,

    /// The publish tool could not be started.
    #[error("cargo publish failed: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    /// The publish tool ran and reported failure.
    #[error("cargo publish failed: {status}\nOutput: {output}")]
    CommandFailed { status: String, output: String },

    /// The caller cancelled the invocation.
    #[error("publish cancelled")]
    Cancelled,

    /// The publish tool did not finish in time.
    #[error("cargo publish timed out after {0:?}")]
    TimedOut(Duration),
}

impl PublishError {
    /// Whether the error came from configuration validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidManifestPath(_) | Self::InvalidRegistry(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let err = PublishError::InvalidManifestPath(PathError::Absolute);
        assert_eq!(
            err.to_string(),
            "configuration validation failed: invalid manifest_path: absolute paths are not allowed"
        );
        assert!(err.is_validation());

        let err = PublishError::InvalidRegistry(RegistryError::InvalidName);
        assert!(err.to_string().contains("invalid registry: invalid registry name format"));
    }

    #[test]
    fn test_missing_token_message() {
        let message = PublishError::MissingToken.to_string();
        assert!(message.starts_with("no API token provided"));
        assert!(message.contains("CARGO_REGISTRY_TOKEN"));
        assert!(!PublishError::MissingToken.is_validation());
    }

    #[test]
    fn test_command_failed_includes_output() {
        let err = PublishError::CommandFailed {
            status: "exit status 101".to_string(),
            output: "error: crate already published".to_string(),
        };
        let message = err.to_string();
        assert!(message.starts_with("cargo publish failed: exit status 101"));
        assert!(message.contains("Output: error: crate already published"));
    }

    #[test]
    fn test_timeout_message() {
        let err = PublishError::TimedOut(Duration::from_secs(90));
        assert_eq!(err.to_string(), "cargo publish timed out after 90s");

        let err = PublishError::TimedOut(Duration::from_millis(250));
        assert_eq!(err.to_string(), "cargo publish timed out after 250ms");
    }
}
