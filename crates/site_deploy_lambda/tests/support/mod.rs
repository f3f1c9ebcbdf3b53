#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use site_deploy_lambda::adapters::callback::CallbackClient;
use site_deploy_lambda::adapters::edge_cache::EdgeCache;
use site_deploy_lambda::adapters::object_store::ObjectStore;
use site_deploy_lambda::config::DeployConfig;
use site_deploy_lambda::handlers::deployment::DeploymentOrchestrator;
use site_deploy_lambda::handlers::signaler::InvocationContext;
use zip::write::FileOptions;
use zip::ZipWriter;

pub const SOURCE_BUCKET: &str = "artifacts";
pub const SOURCE_KEY: &str = "builds/site.zip";
pub const DESTINATION_BUCKET: &str = "www.example.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// In-memory object store that records every call it receives.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    calls: Mutex<Vec<String>>,
    denied_put_suffix: Mutex<Option<String>>,
    denied_delete_keys: Mutex<HashSet<String>>,
    fail_list: Mutex<bool>,
}

impl MemoryStore {
    pub fn seed(&self, bucket: &str, key: &str, body: Vec<u8>) {
        self.objects.lock().expect("poisoned mutex").insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: "application/zip".to_string(),
            },
        );
    }

    pub fn deny_puts_ending_with(&self, suffix: &str) {
        *self.denied_put_suffix.lock().expect("poisoned mutex") = Some(suffix.to_string());
    }

    pub fn deny_delete(&self, key: &str) {
        self.denied_delete_keys
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string());
    }

    pub fn fail_listing(&self) {
        *self.fail_list.lock().expect("poisoned mutex") = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("poisoned mutex").clone()
    }

    pub fn bucket(&self, bucket: &str) -> BTreeMap<String, StoredObject> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .iter()
            .filter(|((owner, _), _)| owner == bucket)
            .map(|((_, key), object)| (key.clone(), object.clone()))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("poisoned mutex").push(call);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String> {
        self.record(format!("get {bucket}/{key}"));
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(&(bucket.to_string(), key.to_string()))
            .map(|object| object.body.clone())
            .ok_or_else(|| "NoSuchKey".to_string())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, String> {
        self.record(format!("put {bucket}/{key}"));
        let denied = self.denied_put_suffix.lock().expect("poisoned mutex").clone();
        if denied.is_some_and(|suffix| key.ends_with(&suffix)) {
            return Err("AccessDenied".to_string());
        }
        self.objects.lock().expect("poisoned mutex").insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(key.to_string())
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>, String> {
        self.record(format!("list {bucket}"));
        if *self.fail_list.lock().expect("poisoned mutex") {
            return Err("NoSuchBucket".to_string());
        }
        Ok(self.bucket(bucket).into_keys().collect())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), String> {
        self.record(format!("delete {bucket}/{key}"));
        if self
            .denied_delete_keys
            .lock()
            .expect("poisoned mutex")
            .contains(key)
        {
            return Err("AccessDenied".to_string());
        }
        self.objects
            .lock()
            .expect("poisoned mutex")
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingCache {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    fail: Mutex<bool>,
}

impl RecordingCache {
    pub fn failing() -> Self {
        Self {
            fail: Mutex::new(true),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl EdgeCache for RecordingCache {
    async fn create_invalidation(
        &self,
        distribution_id: &str,
        _caller_reference: &str,
        paths: &[String],
    ) -> Result<(), String> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push((distribution_id.to_string(), paths.to_vec()));
        if *self.fail.lock().expect("poisoned mutex") {
            Err("TooManyInvalidationsInProgress".to_string())
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct RecordingCallback {
    puts: Mutex<Vec<(String, Value)>>,
    fail: bool,
}

impl RecordingCallback {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn puts(&self) -> Vec<(String, Value)> {
        self.puts.lock().expect("poisoned mutex").clone()
    }

    pub fn only_response(&self) -> Value {
        let puts = self.puts();
        assert_eq!(puts.len(), 1, "exactly one callback PUT per invocation");
        puts[0].1.clone()
    }
}

#[async_trait]
impl CallbackClient for RecordingCallback {
    async fn put(&self, url: &str, body: String) -> Result<(), String> {
        let body: Value = serde_json::from_str(&body).map_err(|error| error.to_string())?;
        self.puts
            .lock()
            .expect("poisoned mutex")
            .push((url.to_string(), body));
        if self.fail {
            Err("connection refused".to_string())
        } else {
            Ok(())
        }
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<RecordingCache>,
    pub callback: Arc<RecordingCallback>,
    pub orchestrator: DeploymentOrchestrator,
    pub scratch: tempfile::TempDir,
}

impl Harness {
    pub fn new(distribution_id: Option<&str>) -> Self {
        Self::with_doubles(
            distribution_id,
            RecordingCache::default(),
            RecordingCallback::default(),
        )
    }

    pub fn with_doubles(
        distribution_id: Option<&str>,
        cache: RecordingCache,
        callback: RecordingCallback,
    ) -> Self {
        let scratch = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(MemoryStore::default());
        let cache = Arc::new(cache);
        let callback = Arc::new(callback);
        let config = DeployConfig {
            distribution_id: distribution_id.map(str::to_string),
            upload_concurrency: 4,
            scratch_dir: scratch.path().join("scratch"),
            webhook_url: None,
        };
        let orchestrator =
            DeploymentOrchestrator::new(config, store.clone(), cache.clone(), callback.clone());

        Self {
            store,
            cache,
            callback,
            orchestrator,
            scratch,
        }
    }
}

pub fn invocation() -> InvocationContext {
    InvocationContext {
        request_id: "lambda-req-1".to_string(),
        log_stream_name: "2026/10/16/[$LATEST]0123abcd".to_string(),
    }
}

pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, FileOptions::default())
                .expect("directory entry should be added");
        } else {
            writer
                .start_file(*name, FileOptions::default())
                .expect("file entry should start");
            writer.write_all(body).expect("file entry should write");
        }
    }
    writer.finish().expect("zip should finish").into_inner()
}

/// Outer artifact wrapping a `package.zip` with `a.txt` and `b/c.css`.
pub fn site_artifact() -> Vec<u8> {
    let package = build_zip(&[("a.txt", b"hello"), ("b/", b""), ("b/c.css", b"body{}")]);
    build_zip(&[("buildspec.yml", &b"version: 0.2"[..]), ("package.zip", package.as_slice())])
}

pub fn publish_event(request_type: &str) -> Value {
    json!({
        "RequestType": request_type,
        "ResponseURL": "https://callback.example/response?signature=xyz",
        "StackId": "arn:aws:cloudformation:eu-west-1:123456789012:stack/site/guid",
        "RequestId": "9f1c-req",
        "LogicalResourceId": "SiteDeployment",
        "ResourceType": "Custom::SiteDeployment",
        "ResourceProperties": {
            "ServiceToken": "arn:aws:lambda:eu-west-1:123456789012:function:deploy",
            "Options": {
                "SourceBucket": SOURCE_BUCKET,
                "SourceArtifact": SOURCE_KEY,
                "DestinationBucket": DESTINATION_BUCKET
            }
        }
    })
}

pub fn delete_event(physical_resource_id: Value) -> Value {
    json!({
        "RequestType": "Delete",
        "ResponseURL": "https://callback.example/response?signature=xyz",
        "StackId": "arn:aws:cloudformation:eu-west-1:123456789012:stack/site/guid",
        "RequestId": "9f1d-req",
        "LogicalResourceId": "SiteDeployment",
        "PhysicalResourceId": physical_resource_id,
        "ResourceProperties": {}
    })
}
