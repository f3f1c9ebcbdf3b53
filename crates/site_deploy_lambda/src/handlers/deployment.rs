use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use site_deploy_core::archive;
use site_deploy_core::contract::{
    plan_request, DeploymentOptions, DeploymentOutcome, DeploymentPlan, OutcomeStatus,
    PhysicalResourceId, ProvisioningRequest, PACKAGE_ENTRY_NAME,
};
use site_deploy_core::scratch::ScratchWorkspace;
use site_deploy_core::DeploymentError;
use tracing::{error, info};

use crate::adapters::callback::CallbackClient;
use crate::adapters::edge_cache::EdgeCache;
use crate::adapters::object_store::ObjectStore;
use crate::config::DeployConfig;
use crate::handlers::invalidator::CacheInvalidator;
use crate::handlers::publisher::{ObjectPublisher, PublishTask};
use crate::handlers::signaler::{InvocationContext, ResponseSignaler, SignalError};

/// Top-level state machine for one provisioning event.
///
/// Every call to [`DeploymentOrchestrator::handle`] ends in exactly one
/// callback, whatever path the request takes.
pub struct DeploymentOrchestrator {
    config: DeployConfig,
    store: Arc<dyn ObjectStore>,
    publisher: ObjectPublisher,
    invalidator: CacheInvalidator,
    signaler: ResponseSignaler,
    workspace: ScratchWorkspace,
}

impl DeploymentOrchestrator {
    pub fn new(
        config: DeployConfig,
        store: Arc<dyn ObjectStore>,
        cache: Arc<dyn EdgeCache>,
        callback: Arc<dyn CallbackClient>,
    ) -> Self {
        Self {
            publisher: ObjectPublisher::new(store.clone(), config.upload_concurrency),
            invalidator: CacheInvalidator::new(cache),
            signaler: ResponseSignaler::new(callback),
            workspace: ScratchWorkspace::new(config.scratch_dir.clone()),
            store,
            config,
        }
    }

    /// Runs the request to its outcome and signals it. The returned error is
    /// only ever a failure to deliver that signal.
    pub async fn handle(
        &self,
        request: ProvisioningRequest,
        invocation: &InvocationContext,
    ) -> Result<OutcomeStatus, SignalError> {
        let started_at = Instant::now();
        info!(
            component = "deployment",
            event = "deployment_started",
            request_id = %request.request_id,
            request_type = %request.request_type,
            logical_resource_id = %request.logical_resource_id,
        );

        let outcome = self.run(&request).await;
        let status = outcome.status;
        if outcome.is_success() {
            info!(
                component = "deployment",
                event = "deployment_succeeded",
                request_id = %request.request_id,
                duration_ms = started_at.elapsed().as_millis() as u64,
                message = %outcome.message,
            );
        } else {
            error!(
                component = "deployment",
                event = "deployment_failed",
                request_id = %request.request_id,
                duration_ms = started_at.elapsed().as_millis() as u64,
                error = %outcome.message,
            );
        }

        self.signaler.signal(outcome, &request, invocation).await?;
        Ok(status)
    }

    async fn run(&self, request: &ProvisioningRequest) -> DeploymentOutcome {
        let plan = match plan_request(request) {
            Ok(plan) => plan,
            Err(error) => return failed(error, None),
        };

        match plan {
            DeploymentPlan::Publish { kind, options } => {
                info!(
                    component = "deployment",
                    event = "upload_artifacts",
                    request_type = kind.as_str(),
                    source_bucket = %options.source_bucket,
                    source_artifact = %options.source_artifact,
                    destination_bucket = %options.destination_bucket,
                );
                match self.upload_artifacts(&options).await {
                    Ok((physical_id, published)) => DeploymentOutcome::success(
                        format!(
                            "Published {published} objects to {}",
                            options.destination_bucket
                        ),
                        physical_id.to_string(),
                    ),
                    Err(error) => failed(error, None),
                }
            }
            DeploymentPlan::Cleanup {
                physical_id,
                raw_physical_id,
            } => match self.clean_bucket(physical_id.bucket()).await {
                Ok(()) => DeploymentOutcome::success(
                    format!("Cleaned bucket {}", physical_id.bucket()),
                    raw_physical_id,
                ),
                Err(error) => failed(error, Some(raw_physical_id)),
            },
        }
    }

    async fn upload_artifacts(
        &self,
        options: &DeploymentOptions,
    ) -> Result<(PhysicalResourceId, usize), DeploymentError> {
        let artifact = self
            .store
            .get_object(&options.source_bucket, &options.source_artifact)
            .await
            .map_err(|message| DeploymentError::Fetch {
                bucket: options.source_bucket.clone(),
                key: options.source_artifact.clone(),
                message,
            })?;
        info!(
            component = "deployment",
            event = "artifact_fetched",
            bytes = artifact.len(),
        );

        self.workspace.prepare()?;
        let artifact_path = self.workspace.persist_artifact(&artifact)?;

        let package_path =
            archive::extract(&artifact_path, PACKAGE_ENTRY_NAME, self.workspace.root())?;

        let deployment_dir = self.workspace.reset_deployment_dir()?;
        let tasks: Vec<PublishTask> = archive::extract_files(&package_path, &deployment_dir)?
            .into_iter()
            .map(PublishTask::from)
            .collect();
        info!(
            component = "deployment",
            event = "package_extracted",
            files = tasks.len(),
        );

        let published = self
            .publisher
            .publish_all(&options.destination_bucket, tasks)
            .await?
            .len();

        match self.config.distribution_id.as_deref() {
            Some(distribution_id) => self.invalidator.invalidate_all(distribution_id).await?,
            None => info!(
                component = "deployment",
                event = "invalidation_skipped",
                reason = "no distribution configured",
            ),
        }

        Ok((
            PhysicalResourceId::for_bucket(&options.destination_bucket),
            published,
        ))
    }

    /// Deletes every object in `bucket`. Individual delete failures are logged
    /// and do not change the outcome.
    async fn clean_bucket(&self, bucket: &str) -> Result<(), DeploymentError> {
        let keys = self
            .store
            .list_objects(bucket)
            .await
            .map_err(|message| DeploymentError::Cleanup {
                bucket: bucket.to_string(),
                message,
            })?;
        let listed = keys.len();
        let store = self.store.as_ref();

        let failures: Vec<(String, String)> = stream::iter(keys)
            .map(|key| async move {
                store
                    .delete_object(bucket, &key)
                    .await
                    .map_err(|message| (key, message))
            })
            .buffer_unordered(self.config.upload_concurrency.max(1))
            .filter_map(|result| async move { result.err() })
            .collect()
            .await;

        for (key, message) in &failures {
            error!(
                component = "deployment",
                event = "object_delete_failed",
                bucket,
                key = %key,
                error = %message,
            );
        }
        info!(
            component = "deployment",
            event = "bucket_cleaned",
            bucket,
            listed,
            failed = failures.len(),
        );
        Ok(())
    }
}

fn failed(error: DeploymentError, physical_resource_id: Option<String>) -> DeploymentOutcome {
    error!(
        component = "deployment",
        event = "stage_failed",
        error_code = error.code(),
        error = %error,
    );
    DeploymentOutcome::failed(&error, physical_resource_id)
}
