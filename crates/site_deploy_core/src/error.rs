use thiserror::Error;

/// Fatal conditions of a deployment. The `Display` string is the message the
/// control plane sees on a FAILED response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeploymentError {
    #[error("{0}")]
    Validation(String),

    #[error("failed to fetch artifact s3://{bucket}/{key}: {message}")]
    Fetch {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("failed to prepare scratch storage: {0}")]
    Workspace(String),

    #[error("{0}")]
    Extraction(String),

    #[error("failed to publish '{key}': {message}")]
    Publish { key: String, message: String },

    #[error("failed to invalidate distribution {distribution_id}: {message}")]
    Invalidation {
        distribution_id: String,
        message: String,
    },

    #[error("failed to list objects in bucket {bucket}: {message}")]
    Cleanup { bucket: String, message: String },
}

impl DeploymentError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction(message.into())
    }

    /// Stable short code used in structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Fetch { .. } => "fetch_error",
            Self::Workspace(_) => "workspace_error",
            Self::Extraction(_) => "extraction_error",
            Self::Publish { .. } => "publish_error",
            Self::Invalidation { .. } => "invalidation_error",
            Self::Cleanup { .. } => "cleanup_error",
        }
    }
}
