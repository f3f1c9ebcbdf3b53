use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DeploymentError;

/// The only logical resource this handler knows how to provision.
pub const SUPPORTED_LOGICAL_RESOURCE_ID: &str = "SiteDeployment";
pub const PHYSICAL_ID_PREFIX: &str = "Deployment";
pub const PHYSICAL_ID_SEPARATOR: &str = "::";
/// Name of the inner archive carried by a build artifact.
pub const PACKAGE_ENTRY_NAME: &str = "package.zip";

pub const OPTION_SOURCE_BUCKET: &str = "SourceBucket";
pub const OPTION_SOURCE_ARTIFACT: &str = "SourceArtifact";
pub const OPTION_DESTINATION_BUCKET: &str = "DestinationBucket";

pub type Options = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceProperties {
    #[serde(default)]
    pub options: Options,
}

/// Provisioning event delivered by the control plane. Unknown fields are
/// ignored so that service-added attributes never break parsing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisioningRequest {
    #[serde(default)]
    pub request_type: String,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    #[serde(default)]
    pub stack_id: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: ResourceProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Create,
    Update,
    Delete,
}

impl RequestKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Create" => Some(Self::Create),
            "Update" => Some(Self::Update),
            "Delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentOptions {
    pub source_bucket: String,
    pub source_artifact: String,
    pub destination_bucket: String,
}

impl DeploymentOptions {
    pub fn from_options(options: &Options) -> Result<Self, DeploymentError> {
        let lookup = |name: &str| {
            options
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let source_bucket = lookup(OPTION_SOURCE_BUCKET);
        let source_artifact = lookup(OPTION_SOURCE_ARTIFACT);
        let destination_bucket = lookup(OPTION_DESTINATION_BUCKET);

        match (source_bucket, source_artifact, destination_bucket) {
            (Some(source_bucket), Some(source_artifact), Some(destination_bucket)) => Ok(Self {
                source_bucket,
                source_artifact,
                destination_bucket,
            }),
            (source_bucket, source_artifact, destination_bucket) => {
                let missing: Vec<&str> = [
                    (OPTION_SOURCE_BUCKET, source_bucket.is_none()),
                    (OPTION_SOURCE_ARTIFACT, source_artifact.is_none()),
                    (OPTION_DESTINATION_BUCKET, destination_bucket.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(DeploymentError::validation(format!(
                    "ResourceProperties.Options must provide {OPTION_SOURCE_BUCKET}, \
                     {OPTION_SOURCE_ARTIFACT} and {OPTION_DESTINATION_BUCKET} \
                     (missing: {})",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// Stable identifier of a deployed site, `Deployment::<bucket>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhysicalResourceId {
    prefix: String,
    bucket: String,
}

impl PhysicalResourceId {
    pub fn for_bucket(bucket: impl Into<String>) -> Self {
        Self {
            prefix: PHYSICAL_ID_PREFIX.to_string(),
            bucket: bucket.into(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, DeploymentError> {
        let Some((prefix, bucket)) = raw.split_once(PHYSICAL_ID_SEPARATOR) else {
            return Err(DeploymentError::validation(format!(
                "PhysicalResourceId '{raw}' is malformed (expected '<prefix>{PHYSICAL_ID_SEPARATOR}<bucketName>')"
            )));
        };

        if prefix.is_empty() || bucket.is_empty() || bucket.contains(PHYSICAL_ID_SEPARATOR) {
            return Err(DeploymentError::validation(format!(
                "PhysicalResourceId '{raw}' is malformed (expected '<prefix>{PHYSICAL_ID_SEPARATOR}<bucketName>')"
            )));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            bucket: bucket.to_string(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl fmt::Display for PhysicalResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{PHYSICAL_ID_SEPARATOR}{}", self.prefix, self.bucket)
    }
}

/// What a validated request asks the orchestrator to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentPlan {
    Publish {
        kind: RequestKind,
        options: DeploymentOptions,
    },
    Cleanup {
        physical_id: PhysicalResourceId,
        raw_physical_id: String,
    },
}

/// Validates a request without performing any I/O.
pub fn plan_request(request: &ProvisioningRequest) -> Result<DeploymentPlan, DeploymentError> {
    if request.logical_resource_id != SUPPORTED_LOGICAL_RESOURCE_ID {
        return Err(DeploymentError::validation(format!(
            "Unsupported LogicalResourceId '{}' (expected '{SUPPORTED_LOGICAL_RESOURCE_ID}')",
            request.logical_resource_id
        )));
    }

    let Some(kind) = RequestKind::parse(&request.request_type) else {
        return Err(DeploymentError::validation(format!(
            "Invalid RequestType '{}' (expected Create, Update, or Delete)",
            request.request_type
        )));
    };

    match kind {
        RequestKind::Create | RequestKind::Update => {
            let options = DeploymentOptions::from_options(&request.resource_properties.options)?;
            Ok(DeploymentPlan::Publish { kind, options })
        }
        RequestKind::Delete => {
            let raw = request
                .physical_resource_id
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    DeploymentError::validation("PhysicalResourceId is required for Delete")
                })?;
            let physical_id = PhysicalResourceId::parse(raw)?;
            Ok(DeploymentPlan::Cleanup {
                physical_id,
                raw_physical_id: raw.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

/// Terminal result of one invocation; exactly one is produced per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentOutcome {
    pub status: OutcomeStatus,
    pub message: String,
    pub physical_resource_id: Option<String>,
}

impl DeploymentOutcome {
    pub fn success(message: impl Into<String>, physical_resource_id: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Success,
            message: message.into(),
            physical_resource_id: Some(physical_resource_id.into()),
        }
    }

    pub fn failed(error: &DeploymentError, physical_resource_id: Option<String>) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            message: error.to_string(),
            physical_resource_id,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseData {
    pub message: String,
}

/// Body of the PUT sent to the request's `ResponseURL`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackResponse {
    pub status: OutcomeStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub data: ResponseData,
}

impl CallbackResponse {
    pub fn new(
        outcome: &DeploymentOutcome,
        request: &ProvisioningRequest,
        log_stream_name: &str,
    ) -> Self {
        let log_reference = format!("See the details in CloudWatch Log Stream: {log_stream_name}");
        let reason = match outcome.status {
            OutcomeStatus::Success => log_reference,
            OutcomeStatus::Failed => format!("{}. {log_reference}", outcome.message),
        };

        Self {
            status: outcome.status,
            reason,
            physical_resource_id: outcome
                .physical_resource_id
                .clone()
                .unwrap_or_else(|| log_stream_name.to_string()),
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
            data: ResponseData {
                message: outcome.message.clone(),
            },
        }
    }
}
