use std::sync::Arc;

use site_deploy_core::contract::{CallbackResponse, DeploymentOutcome, ProvisioningRequest};
use thiserror::Error;
use tracing::{error, info};

use crate::adapters::callback::CallbackClient;

/// Identifies the running invocation for log references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,
    pub log_stream_name: String,
}

/// Failure to deliver the response itself. This goes to the invocation's own
/// error channel, never into the response body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignalError {
    #[error("failed to serialize callback response: {0}")]
    Serialize(String),
    #[error("failed to deliver callback response: {0}")]
    Delivery(String),
}

#[derive(Clone)]
pub struct ResponseSignaler {
    client: Arc<dyn CallbackClient>,
}

impl ResponseSignaler {
    pub fn new(client: Arc<dyn CallbackClient>) -> Self {
        Self { client }
    }

    /// Sends the single terminal response for `request`. Takes the outcome by
    /// value; a request must never be signaled twice.
    pub async fn signal(
        &self,
        outcome: DeploymentOutcome,
        request: &ProvisioningRequest,
        invocation: &InvocationContext,
    ) -> Result<(), SignalError> {
        let response = CallbackResponse::new(&outcome, request, &invocation.log_stream_name);
        let body = serde_json::to_string(&response)
            .map_err(|error| SignalError::Serialize(error.to_string()))?;

        if let Err(message) = self.client.put(&request.response_url, body).await {
            error!(
                component = "signaler",
                event = "response_delivery_failed",
                request_id = %request.request_id,
                error = %message,
            );
            return Err(SignalError::Delivery(message));
        }

        info!(
            component = "signaler",
            event = "response_sent",
            request_id = %request.request_id,
            status = ?response.status,
            physical_resource_id = %response.physical_resource_id,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use site_deploy_core::DeploymentError;

    use super::*;

    struct CapturingClient {
        puts: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl CapturingClient {
        fn new(fail: bool) -> Self {
            Self {
                puts: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl CallbackClient for CapturingClient {
        async fn put(&self, url: &str, body: String) -> Result<(), String> {
            self.puts
                .lock()
                .expect("poisoned mutex")
                .push((url.to_string(), body));
            if self.fail {
                Err("connection reset".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn sample_request() -> ProvisioningRequest {
        serde_json::from_value(json!({
            "RequestType": "Delete",
            "ResponseURL": "https://callback.example/put?sig=abc",
            "StackId": "stack-9",
            "RequestId": "req-9",
            "LogicalResourceId": "SiteDeployment",
            "PhysicalResourceId": "Deployment::site"
        }))
        .expect("request should parse")
    }

    fn invocation() -> InvocationContext {
        InvocationContext {
            request_id: "aws-req-1".to_string(),
            log_stream_name: "2026/10/16/[$LATEST]feed".to_string(),
        }
    }

    #[tokio::test]
    async fn puts_one_response_to_the_callback_url() {
        let client = Arc::new(CapturingClient::new(false));
        let signaler = ResponseSignaler::new(client.clone());

        signaler
            .signal(
                DeploymentOutcome::success("Cleaned", "Deployment::site"),
                &sample_request(),
                &invocation(),
            )
            .await
            .expect("signal should succeed");

        let puts = client.puts.lock().expect("poisoned mutex").clone();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].0, "https://callback.example/put?sig=abc");
        let body: Value = serde_json::from_str(&puts[0].1).expect("body should be json");
        assert_eq!(body["Status"], json!("SUCCESS"));
        assert_eq!(body["StackId"], json!("stack-9"));
        assert_eq!(body["PhysicalResourceId"], json!("Deployment::site"));
    }

    #[tokio::test]
    async fn delivery_failure_is_reported_separately() {
        let client = Arc::new(CapturingClient::new(true));
        let signaler = ResponseSignaler::new(client);

        let error = signaler
            .signal(
                DeploymentOutcome::failed(&DeploymentError::validation("bad"), None),
                &sample_request(),
                &invocation(),
            )
            .await
            .expect_err("delivery should fail");

        assert_eq!(error, SignalError::Delivery("connection reset".to_string()));
    }
}
