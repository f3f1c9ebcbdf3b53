use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::{json, Value};
use site_deploy_core::contract::ProvisioningRequest;
use site_deploy_lambda::adapters::callback::HttpCallbackClient;
use site_deploy_lambda::adapters::edge_cache::CloudFrontEdgeCache;
use site_deploy_lambda::adapters::object_store::S3ObjectStore;
use site_deploy_lambda::config::DeployConfig;
use site_deploy_lambda::handlers::deployment::DeploymentOrchestrator;
use site_deploy_lambda::handlers::signaler::InvocationContext;
use site_deploy_lambda::telemetry;

async fn handle_request(
    orchestrator: &DeploymentOrchestrator,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    let (payload, context) = event.into_parts();
    let request = parse_request(payload)?;
    let invocation = InvocationContext {
        request_id: context.request_id.clone(),
        log_stream_name: context.env_config.log_stream.clone(),
    };

    let status = orchestrator
        .handle(request, &invocation)
        .await
        .map_err(|error| Error::from(error.to_string()))?;
    Ok(json!({ "status": status }))
}

// Without a ResponseURL there is nobody to signal, so this is an invocation
// error rather than a FAILED response.
fn parse_request(payload: Value) -> Result<ProvisioningRequest, Error> {
    serde_json::from_value(payload)
        .map_err(|error| Error::from(format!("invalid provisioning event: {error}")))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init()?;
    let config = DeployConfig::from_env()?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let orchestrator = DeploymentOrchestrator::new(
        config,
        Arc::new(S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config))),
        Arc::new(CloudFrontEdgeCache::new(aws_sdk_cloudfront::Client::new(
            &aws_config,
        ))),
        Arc::new(HttpCallbackClient::new(reqwest::Client::new())),
    );

    let orchestrator = &orchestrator;
    lambda_runtime::run(service_fn(move |event| handle_request(orchestrator, event))).await
}
