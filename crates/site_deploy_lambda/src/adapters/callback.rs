use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

/// Delivers the terminal response to a pre-signed callback URL.
#[async_trait]
pub trait CallbackClient: Send + Sync {
    async fn put(&self, url: &str, body: String) -> Result<(), String>;
}

#[derive(Clone, Default)]
pub struct HttpCallbackClient {
    http_client: reqwest::Client,
}

impl HttpCallbackClient {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl CallbackClient for HttpCallbackClient {
    async fn put(&self, url: &str, body: String) -> Result<(), String> {
        // The callback URL is signed without a content type.
        let response = self
            .http_client
            .put(url)
            .header(CONTENT_TYPE, "")
            .body(body)
            .send()
            .await
            .map_err(|error| format!("failed to send callback response: {error}"))?;

        response
            .error_for_status()
            .map(|_| ())
            .map_err(|error| format!("callback endpoint rejected response: {error}"))
    }
}
