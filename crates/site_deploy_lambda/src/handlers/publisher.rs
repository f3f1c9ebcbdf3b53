use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt};
use site_deploy_core::archive::ExtractedFile;
use site_deploy_core::content_type::resolve_content_type;
use site_deploy_core::DeploymentError;
use tracing::{debug, error, info};

use crate::adapters::object_store::ObjectStore;

/// One independent upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTask {
    pub relative_path: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl From<ExtractedFile> for PublishTask {
    fn from(file: ExtractedFile) -> Self {
        let content_type = resolve_content_type(&file.relative_path);
        Self {
            relative_path: file.relative_path,
            bytes: file.bytes,
            content_type,
        }
    }
}

/// Uploads publish tasks with bounded parallelism.
///
/// This is a fan-out, not a transaction: after the first failure no further
/// task is started, uploads already in flight run to completion, and nothing
/// already written is rolled back. The first failure is returned.
#[derive(Clone)]
pub struct ObjectPublisher {
    store: Arc<dyn ObjectStore>,
    concurrency: usize,
}

impl ObjectPublisher {
    pub fn new(store: Arc<dyn ObjectStore>, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn publish_all(
        &self,
        bucket: &str,
        tasks: Vec<PublishTask>,
    ) -> Result<Vec<String>, DeploymentError> {
        let task_count = tasks.len();
        let store = self.store.as_ref();
        let halted = AtomicBool::new(false);
        let halted = &halted;

        let results: Vec<Result<String, DeploymentError>> = stream::iter(tasks)
            .take_while(|_| future::ready(!halted.load(Ordering::SeqCst)))
            .map(|task| async move {
                let key = task.relative_path;
                debug!(
                    component = "publisher",
                    event = "object_upload_started",
                    bucket,
                    key = %key,
                    content_type = %task.content_type,
                    bytes = task.bytes.len(),
                );
                match store
                    .put_object(bucket, &key, task.bytes, &task.content_type)
                    .await
                {
                    Ok(written) => Ok(written),
                    Err(message) => {
                        halted.store(true, Ordering::SeqCst);
                        error!(
                            component = "publisher",
                            event = "object_upload_failed",
                            bucket,
                            key = %key,
                            error = %message,
                        );
                        Err(DeploymentError::Publish { key, message })
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut keys = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(key) => keys.push(key),
                Err(error) => {
                    first_error.get_or_insert(error);
                }
            }
        }
        if let Some(error) = first_error {
            info!(
                component = "publisher",
                event = "publish_halted",
                bucket,
                objects = task_count,
                written = keys.len(),
            );
            return Err(error);
        }

        info!(
            component = "publisher",
            event = "publish_completed",
            bucket,
            objects = task_count,
            concurrency = self.concurrency,
        );
        Ok(keys)
    }
}
