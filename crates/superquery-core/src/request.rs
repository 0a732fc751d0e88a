//! Inbound request shapes and the uniform response envelope.

use serde::{Deserialize, Serialize};

pub const DEFAULT_QUERY_LIMIT: usize = 100;
pub const DEFAULT_SAMPLE_SIZE: usize = 100;

fn default_query_limit() -> usize {
    DEFAULT_QUERY_LIMIT
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

/// A business question against one locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub request: String,
    pub s3_path: String,
    #[serde(default = "default_query_limit")]
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreRequest {
    pub s3_path: String,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    pub bucket: String,
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Error body: the failure message plus the caller's input, flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure<C> {
    pub error: String,
    #[serde(flatten)]
    pub input: C,
}

/// `{"status": "success", ...payload}` or `{"status": "error", "error": ..., ...input}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response<T, C> {
    Success(T),
    Error(Failure<C>),
}

impl<T, C> Response<T, C> {
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>, input: C) -> Self {
        match result {
            Ok(payload) => Response::Success(payload),
            Err(e) => Response::Error(Failure { error: e.to_string(), input }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Response::Success(payload) => Some(payload),
            Response::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Response::Success(_) => None,
            Response::Error(failure) => Some(&failure.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Echo {
        s3_path: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Count {
        n: u32,
    }

    #[test]
    fn request_defaults() {
        let q: QueryRequest = serde_json::from_value(json!({"request": "count rows", "s3_path": "s3://b/k"})).unwrap();
        assert_eq!(q.limit, 100);
        let e: ExploreRequest = serde_json::from_value(json!({"s3_path": "s3://b/k"})).unwrap();
        assert_eq!(e.sample_size, 100);
        let l: ListRequest = serde_json::from_value(json!({"bucket": "b"})).unwrap();
        assert_eq!(l.prefix, None);
    }

    #[test]
    fn envelope_shapes() {
        let ok: Response<Count, Echo> = Response::Success(Count { n: 3 });
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"status": "success", "n": 3}));

        let err: Response<Count, Echo> =
            Response::from_result(Err("Access denied: b"), Echo { s3_path: "s3://b/k".into() });
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"status": "error", "error": "Access denied: b", "s3_path": "s3://b/k"})
        );
        assert_eq!(err.error(), Some("Access denied: b"));
        assert!(err.payload().is_none());
    }
}
