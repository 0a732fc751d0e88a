use std::future::Future;

use crate::error::Result;
use crate::types::{CredentialStatus, LocatorStatus, ObjectInfo};

/// Object-store collaborator. Implementations own pagination and retries and
/// hand back the final, fully paginated result.
pub trait ObjectStore: Send + Sync {
    /// List objects under `bucket`, optionally filtered by key prefix.
    ///
    /// Missing buckets surface as `Error::UpstreamNotFound`, refused access as
    /// `Error::UpstreamAccessDenied`.
    fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> impl Future<Output = Result<Vec<ObjectInfo>>> + Send;

    /// Classify a locator as a single object, a prefix with sample keys, or invalid.
    fn validate_locator(&self, locator: &str) -> impl Future<Output = LocatorStatus> + Send;

    fn credential_status(&self) -> impl Future<Output = CredentialStatus> + Send;
}
