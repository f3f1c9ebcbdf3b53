use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait WebhookClient: Send + Sync {
    async fn post_json(&self, url: &str, payload: &Value) -> Result<(), String>;
}

#[derive(Clone, Default)]
pub struct HttpWebhookClient {
    http_client: reqwest::Client,
}

impl HttpWebhookClient {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl WebhookClient for HttpWebhookClient {
    async fn post_json(&self, url: &str, payload: &Value) -> Result<(), String> {
        self.http_client
            .post(url)
            .json(payload)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map(|_| ())
            .map_err(|error| format!("failed to post webhook message: {error}"))
    }
}
