//! Error types for cyklist.

use thiserror::Error;

use crate::phases::Phase;

/// Errors that can stop a lifecycle invocation.
#[derive(Error, Debug)]
pub enum CyklistError {
    #[error("[{0}] {1}")]
    Aws(String, String),

    #[error("[{0}] AWS credentials error: {1}")]
    AwsCredentials(String, String),

    #[error("Unrecognized lifecycle phase: '{0}' (expected one of: detach, drain, terminate)")]
    UnknownPhase(String),

    #[error("Instance {instance_id} is tagged for phase {found} but was listed for phase {expected}")]
    PhaseMismatch {
        instance_id: String,
        found: Phase,
        expected: Phase,
    },

    #[error("Instance {0} has no private DNS name to use as a node name")]
    MissingNodeName(String),

    #[error("Failed to drain node {node}: {reason}")]
    Drain { node: String, reason: String },

    #[error("Drain of node {node} did not finish within {seconds} seconds")]
    DrainTimeout { node: String, seconds: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CyklistError {
    /// Create an AWS error from any SDK error, separating credential
    /// problems from everything else.
    pub fn aws<E: std::fmt::Debug + std::fmt::Display>(component: &str, err: E) -> Self {
        let err_debug = format!("{err:?}");
        let err_display = err.to_string();
        let component = component.to_string();
        let details = Self::extract_error_details(&err_debug, &err_display);

        let combined_lower = format!("{err_display} {err_debug}").to_lowercase();
        let credential_markers = [
            "no credentials",
            "credentials not found",
            "expired token",
            "expiredtoken",
            "the security token included in the request is",
            "unrecognizedclient",
            "invalidclienttokenid",
            "signaturedoesnotmatch",
            "access denied",
            "accessdenied",
            "unauthorizedoperation",
            "not authorized",
        ];

        if credential_markers
            .iter()
            .any(|marker| combined_lower.contains(marker))
        {
            return Self::AwsCredentials(component, details);
        }

        Self::Aws(component, details)
    }

    /// Pull the service `message` out of an SDK error's debug output,
    /// falling back to the display string.
    fn extract_error_details(debug_str: &str, display_str: &str) -> String {
        const MESSAGE_MARKER: &str = "message: Some(\"";

        if let Some(pos) = debug_str.find(MESSAGE_MARKER) {
            let rest = &debug_str[pos + MESSAGE_MARKER.len()..];
            if let Some(end) = rest.find('"') {
                return rest[..end].to_string();
            }
        }

        if !display_str.to_lowercase().contains("service error") {
            return display_str.to_string();
        }

        "AWS API request failed".to_string()
    }
}

/// Result type alias for cyklist operations.
pub type Result<T> = std::result::Result<T, CyklistError>;
