//! Request layer over the compiler, the engine and the analyzer.
//!
//! Every operation returns a [`Response`] envelope; failures from any
//! component become `{"status": "error", ...}` with the input echoed back.

pub mod memory;

use serde::{Deserialize, Serialize};

use superquery_core::config::Settings;
use superquery_core::locator::{format_file_size, Locator};
use superquery_core::request::{ExploreRequest, ListRequest, QueryRequest, Response};
use superquery_core::traits::ObjectStore;
use superquery_core::types::{CredentialStatus, FieldSchema, LocatorStatus, ObjectInfo, Record};
use superquery_core::Result;
use superquery_engine::{BinaryStatus, ProbeOutcome, SuperExecutor};
use superquery_schema::QualitySummary;

pub use memory::{MemoryObjectStore, StoredObject};

/// Records returned verbatim by `explore`.
pub const EXPLORE_PREVIEW_RECORDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPayload {
    pub query: String,
    pub results: Vec<Record>,
    pub record_count: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryInput {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorePayload {
    pub s3_path: String,
    pub schema: std::collections::BTreeMap<String, FieldSchema>,
    pub sample_records: Vec<Record>,
    pub data_quality: QualitySummary,
    pub total_sampled: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathInput {
    pub s3_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPayload {
    pub bucket: String,
    pub prefix: Option<String>,
    pub files: Vec<ObjectInfo>,
    pub total_files: usize,
    pub total_size: u64,
    /// `total_size` as e.g. `2.5 KB`.
    pub total_size_formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListInput {
    pub bucket: String,
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorHealth {
    pub s3_path: String,
    pub status: LocatorStatus,
    pub probe: ProbeOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub binary: BinaryStatus,
    pub credentials: CredentialStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<LocatorHealth>,
}

pub struct QueryService<S>
where
    S: ObjectStore,
{
    executor: SuperExecutor,
    store: S,
}

impl<S> QueryService<S>
where
    S: ObjectStore,
{
    pub fn new(settings: &Settings, store: S) -> Self {
        Self::with_executor(SuperExecutor::new(settings), store)
    }

    pub fn with_executor(executor: SuperExecutor, store: S) -> Self {
        Self { executor, store }
    }

    /// Compile the question and run it against the locator.
    pub async fn query(&self, request: &QueryRequest) -> Response<QueryPayload, QueryInput> {
        tracing::info!(request = %request.request, s3_path = %request.s3_path, "Processing query");
        let result = self.run_query(request).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Error processing query");
        }
        Response::from_result(result, QueryInput { query: request.request.clone() })
    }

    async fn run_query(&self, request: &QueryRequest) -> Result<QueryPayload> {
        Locator::parse(&request.s3_path)?;
        let query = superquery_compiler::compile(&request.request, &request.s3_path, request.limit);
        let result = self.executor.execute(&query, &request.s3_path).await?;
        Ok(QueryPayload {
            query,
            record_count: result.len(),
            truncated: result.truncated,
            results: result.records,
        })
    }

    /// Sample the locator and describe its fields.
    pub async fn explore(&self, request: &ExploreRequest) -> Response<ExplorePayload, PathInput> {
        tracing::info!(s3_path = %request.s3_path, "Exploring data structure");
        let result = self.run_explore(request).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Error exploring data");
        }
        Response::from_result(result, PathInput { s3_path: request.s3_path.clone() })
    }

    async fn run_explore(&self, request: &ExploreRequest) -> Result<ExplorePayload> {
        Locator::parse(&request.s3_path)?;
        let query = superquery_compiler::fallback_query(&request.s3_path, request.sample_size);
        let sample = self.executor.execute(&query, &request.s3_path).await?;
        let analysis = superquery_schema::analyze(&sample.records);
        let total_sampled = sample.len();
        let mut sample_records = sample.records;
        sample_records.truncate(EXPLORE_PREVIEW_RECORDS);
        Ok(ExplorePayload {
            s3_path: request.s3_path.clone(),
            schema: analysis.schema,
            sample_records,
            data_quality: analysis.quality,
            total_sampled,
        })
    }

    pub async fn list(&self, request: &ListRequest) -> Response<ListPayload, ListInput> {
        tracing::info!(bucket = %request.bucket, prefix = ?request.prefix, "Listing objects");
        let result = self
            .store
            .list_objects(&request.bucket, request.prefix.as_deref())
            .await
            .map(|files| {
                let total_size = files.iter().map(|f| f.size).sum();
                ListPayload {
                    bucket: request.bucket.clone(),
                    prefix: request.prefix.clone(),
                    total_files: files.len(),
                    total_size,
                    total_size_formatted: format_file_size(total_size),
                    files,
                }
            });
        if let Err(e) = &result {
            tracing::error!(error = %e, "Error listing objects");
        }
        Response::from_result(result, ListInput { bucket: request.bucket.clone(), prefix: request.prefix.clone() })
    }

    /// Binary self-test and credential status, plus a validation and one-record
    /// probe of `locator` when given.
    pub async fn health(&self, locator: Option<&str>) -> HealthReport {
        let binary = self.executor.test_binary().await;
        let credentials = self.store.credential_status().await;
        let locator = match locator {
            Some(s3_path) => Some(LocatorHealth {
                s3_path: s3_path.to_string(),
                status: self.store.validate_locator(s3_path).await,
                probe: self.executor.probe_locator(s3_path).await,
            }),
            None => None,
        };
        let healthy = binary.accessible && locator.as_ref().map_or(true, |l| l.probe.reachable);
        HealthReport { healthy, binary, credentials, locator }
    }
}
