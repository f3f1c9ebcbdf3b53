use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::{json, Value};
use site_deploy_lambda::adapters::webhook::HttpWebhookClient;
use site_deploy_lambda::config::DeployConfig;
use site_deploy_lambda::handlers::notification::{notify_stage_change, PipelineStageEvent};
use site_deploy_lambda::telemetry;

struct RuntimeDependencies {
    webhook_url: Option<String>,
    webhook: HttpWebhookClient,
}

async fn handle_request(
    deps: &RuntimeDependencies,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    let stage_event: PipelineStageEvent = serde_json::from_value(event.payload)
        .map_err(|error| Error::from(format!("invalid pipeline event: {error}")))?;

    let status =
        notify_stage_change(&deps.webhook, deps.webhook_url.as_deref(), &stage_event).await;
    Ok(json!({ "status": status }))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init()?;
    let config = DeployConfig::from_env()?;
    let deps = RuntimeDependencies {
        webhook_url: config.webhook_url,
        webhook: HttpWebhookClient::new(reqwest::Client::new()),
    };

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event| handle_request(deps, event))).await
}
