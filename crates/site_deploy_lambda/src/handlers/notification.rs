//! Posts pipeline stage transitions to a team chat webhook.
//!
//! Purely informational: webhook failures are logged and never fail the
//! invocation or touch any deployment outcome.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::adapters::webhook::WebhookClient;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineStageEvent {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub detail: StageDetail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct StageDetail {
    #[serde(default)]
    pub pipeline: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub execution_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    Skipped,
    Failed,
}

fn state_marker(state: &str) -> Option<&'static str> {
    match state {
        "STARTED" | "RESUMED" => Some(":hourglass_flowing_sand:"),
        "SUCCEEDED" => Some(":white_check_mark:"),
        "FAILED" | "CANCELED" | "SUPERSEDED" => Some(":x:"),
        _ => None,
    }
}

pub fn format_stage_message(event: &PipelineStageEvent) -> String {
    let detail = &event.detail;
    let headline = format!(
        "Pipeline *{}* stage *{}* {}",
        detail.pipeline, detail.stage, detail.state
    );
    let headline = match state_marker(&detail.state) {
        Some(marker) => format!("{marker} {headline}"),
        None => headline,
    };

    if detail.execution_id.is_empty() {
        headline
    } else {
        format!("{headline} (execution {})", detail.execution_id)
    }
}

pub async fn notify_stage_change(
    webhook: &dyn WebhookClient,
    webhook_url: Option<&str>,
    event: &PipelineStageEvent,
) -> NotificationStatus {
    let Some(url) = webhook_url else {
        info!(
            component = "notifier",
            event = "notification_skipped",
            reason = "no webhook configured",
            pipeline = %event.detail.pipeline,
        );
        return NotificationStatus::Skipped;
    };

    let payload: Value = json!({ "text": format_stage_message(event) });
    match webhook.post_json(url, &payload).await {
        Ok(()) => {
            info!(
                component = "notifier",
                event = "notification_sent",
                pipeline = %event.detail.pipeline,
                stage = %event.detail.stage,
                state = %event.detail.state,
            );
            NotificationStatus::Sent
        }
        Err(message) => {
            warn!(
                component = "notifier",
                event = "notification_failed",
                pipeline = %event.detail.pipeline,
                error = %message,
            );
            NotificationStatus::Failed
        }
    }
}
