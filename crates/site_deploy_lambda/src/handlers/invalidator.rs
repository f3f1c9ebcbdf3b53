use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use site_deploy_core::DeploymentError;
use tracing::info;

use crate::adapters::edge_cache::EdgeCache;

pub const WILDCARD_PATH: &str = "/*";

#[derive(Clone)]
pub struct CacheInvalidator {
    cache: Arc<dyn EdgeCache>,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<dyn EdgeCache>) -> Self {
        Self { cache }
    }

    /// Submits a single wildcard invalidation for the whole distribution.
    pub async fn invalidate_all(&self, distribution_id: &str) -> Result<(), DeploymentError> {
        let caller_reference = caller_reference();
        self.cache
            .create_invalidation(
                distribution_id,
                &caller_reference,
                &[WILDCARD_PATH.to_string()],
            )
            .await
            .map_err(|message| DeploymentError::Invalidation {
                distribution_id: distribution_id.to_string(),
                message,
            })?;

        info!(
            component = "invalidator",
            event = "invalidation_submitted",
            distribution_id,
            caller_reference = %caller_reference,
        );
        Ok(())
    }
}

static CALLER_SEQUENCE: AtomicU64 = AtomicU64::new(0);

// The edge cache deduplicates requests by caller reference, so it must differ
// on every call, including two calls within one clock tick.
fn caller_reference() -> String {
    let now = Utc::now();
    format!(
        "site-deploy-{}-{:09}-{}",
        now.timestamp(),
        now.timestamp_subsec_nanos(),
        CALLER_SEQUENCE.fetch_add(1, Ordering::Relaxed)
    )
}
