use async_trait::async_trait;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};

#[async_trait]
pub trait EdgeCache: Send + Sync {
    async fn create_invalidation(
        &self,
        distribution_id: &str,
        caller_reference: &str,
        paths: &[String],
    ) -> Result<(), String>;
}

#[derive(Clone)]
pub struct CloudFrontEdgeCache {
    cloudfront_client: aws_sdk_cloudfront::Client,
}

impl CloudFrontEdgeCache {
    pub fn new(cloudfront_client: aws_sdk_cloudfront::Client) -> Self {
        Self { cloudfront_client }
    }
}

#[async_trait]
impl EdgeCache for CloudFrontEdgeCache {
    async fn create_invalidation(
        &self,
        distribution_id: &str,
        caller_reference: &str,
        paths: &[String],
    ) -> Result<(), String> {
        let quantity = i32::try_from(paths.len())
            .map_err(|_| format!("too many invalidation paths: {}", paths.len()))?;
        let paths = Paths::builder()
            .quantity(quantity)
            .set_items(Some(paths.to_vec()))
            .build()
            .map_err(|error| format!("invalid invalidation paths: {error}"))?;
        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(caller_reference)
            .build()
            .map_err(|error| format!("invalid invalidation batch: {error}"))?;

        self.cloudfront_client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| format!("failed to create cloudfront invalidation: {error}"))
    }
}
