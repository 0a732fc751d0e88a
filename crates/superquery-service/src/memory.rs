//! In-memory object store for tests and local runs.

use std::collections::{BTreeMap, BTreeSet};

use superquery_core::locator::Locator;
use superquery_core::traits::ObjectStore;
use superquery_core::types::{CredentialStatus, LocatorStatus, ObjectInfo};
use superquery_core::{Error, Result};

const SAMPLE_KEYS: usize = 5;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub size: u64,
    pub content_type: String,
    pub last_modified: String,
    pub storage_class: String,
}

impl StoredObject {
    pub fn new(size: u64, content_type: &str) -> Self {
        Self {
            size,
            content_type: content_type.to_string(),
            last_modified: "2024-01-01T00:00:00+00:00".to_string(),
            storage_class: "STANDARD".to_string(),
        }
    }
}

/// Buckets and keys held in sorted maps, so listings come back in key order.
#[derive(Debug, Clone)]
pub struct MemoryObjectStore {
    buckets: BTreeMap<String, BTreeMap<String, StoredObject>>,
    denied: BTreeSet<String>,
    credentials: CredentialStatus,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self {
            buckets: BTreeMap::new(),
            denied: BTreeSet::new(),
            credentials: CredentialStatus {
                configured: true,
                account_id: Some("000000000000".to_string()),
                user_arn: Some("arn:aws:iam::000000000000:user/local".to_string()),
                error: None,
            },
        }
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(mut self, bucket: &str) -> Self {
        self.buckets.entry(bucket.to_string()).or_default();
        self
    }

    pub fn with_object(mut self, bucket: &str, key: &str, object: StoredObject) -> Self {
        self.buckets.entry(bucket.to_string()).or_default().insert(key.to_string(), object);
        self
    }

    /// Refuse every operation on `bucket`.
    pub fn deny(mut self, bucket: &str) -> Self {
        self.denied.insert(bucket.to_string());
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialStatus) -> Self {
        self.credentials = credentials;
        self
    }

    fn bucket(&self, bucket: &str) -> Result<&BTreeMap<String, StoredObject>> {
        if self.denied.contains(bucket) {
            return Err(Error::UpstreamAccessDenied(format!("bucket {bucket}")));
        }
        self.buckets
            .get(bucket)
            .ok_or_else(|| Error::UpstreamNotFound(format!("bucket {bucket}")))
    }

    fn classify(&self, locator: &str) -> Result<LocatorStatus> {
        let parsed = Locator::parse(locator)?;
        let objects = self.bucket(&parsed.bucket)?;
        if parsed.is_prefix() {
            let prefix = parsed.prefix();
            let sample_objects: Vec<String> = objects
                .keys()
                .filter(|k| k.starts_with(prefix))
                .take(SAMPLE_KEYS)
                .cloned()
                .collect();
            if sample_objects.is_empty() {
                return Err(Error::UpstreamNotFound(format!("No objects found with prefix: {prefix}")));
            }
            return Ok(LocatorStatus::Prefix {
                bucket: parsed.bucket.clone(),
                prefix: prefix.to_string(),
                sample_objects,
            });
        }
        let object = objects
            .get(&parsed.key)
            .ok_or_else(|| Error::UpstreamNotFound(format!("Object not found: {locator}")))?;
        Ok(LocatorStatus::Object {
            bucket: parsed.bucket,
            key: parsed.key,
            size: object.size,
            content_type: object.content_type.clone(),
        })
    }
}

impl ObjectStore for MemoryObjectStore {
    async fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<ObjectInfo>> {
        let objects = self.bucket(bucket)?;
        let prefix = prefix.unwrap_or_default();
        Ok(objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectInfo {
                key: key.clone(),
                size: object.size,
                last_modified: object.last_modified.clone(),
                etag: format!("\"{:x}\"", object.size),
                storage_class: object.storage_class.clone(),
                s3_url: format!("s3://{bucket}/{key}"),
            })
            .collect())
    }

    async fn validate_locator(&self, locator: &str) -> LocatorStatus {
        self.classify(locator)
            .unwrap_or_else(|e| LocatorStatus::Invalid { error: e.to_string() })
    }

    async fn credential_status(&self) -> CredentialStatus {
        self.credentials.clone()
    }
}
