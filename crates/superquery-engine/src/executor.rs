use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use superquery_core::config::Settings;
use superquery_core::types::ResultSet;
use superquery_core::{Error, Result};

use crate::process::{self, EngineEnv};

const VERSION_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_QUERY: &str = "HEAD 1";

/// Outcome of a binary self-test. Never an error: failures land in `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryStatus {
    pub binary_path: PathBuf,
    pub accessible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Whether a one-record read of a locator succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Check that `path` names an existing, executable file.
pub fn validate_binary(path: &Path) -> Result<()> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::BinaryNotFound { path: path.to_path_buf() })
        }
        Err(e) => return Err(Error::Io(e)),
    };
    if !meta.is_file() || !is_executable(&meta) {
        return Err(Error::BinaryNotExecutable { path: path.to_path_buf() });
    }
    Ok(())
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
    true
}

/// Runs compiled queries through the external `super` engine.
///
/// Holds no per-query state; one executor serves concurrent queries, each in
/// its own child process.
#[derive(Debug, Clone)]
pub struct SuperExecutor {
    binary: PathBuf,
    timeout: Duration,
    max_results: usize,
    default_region: String,
}

impl SuperExecutor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            binary: settings.super_binary_path.clone(),
            timeout: settings.query_timeout(),
            max_results: settings.max_results,
            default_region: settings.default_region.clone(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Execute `query` against `locator` with the configured limits.
    pub async fn execute(&self, query: &str, locator: &str) -> Result<ResultSet> {
        self.execute_with(query, locator, self.timeout, self.max_results).await
    }

    pub async fn execute_with(
        &self,
        query: &str,
        locator: &str,
        timeout: Duration,
        max_results: usize,
    ) -> Result<ResultSet> {
        tracing::info!(query, locator, "Executing Super query");
        let env = EngineEnv::from_process(&self.default_region);
        let command = process::command(&self.binary, &["-f", "json", "-c", query, locator], Some(&env));
        let result = process::run_json_lines(command, &self.binary, timeout, max_results).await?;
        tracing::info!(
            records = result.len(),
            truncated = result.truncated,
            skipped_lines = result.skipped_lines,
            "Super query completed"
        );
        Ok(result)
    }

    /// Version string reported by the engine.
    pub async fn version(&self) -> Result<String> {
        let command = process::command(&self.binary, &["--version"], None);
        let captured = process::run_captured(command, &self.binary, VERSION_TIMEOUT).await?;
        if !captured.status.success() {
            return Err(Error::ExecutionFailed { stderr: process::failure_text(captured.stderr) });
        }
        Ok(captured.stdout)
    }

    pub async fn test_binary(&self) -> BinaryStatus {
        let checked = match validate_binary(&self.binary) {
            Ok(()) => self.version().await,
            Err(e) => Err(e),
        };
        match checked {
            Ok(version) => BinaryStatus {
                binary_path: self.binary.clone(),
                accessible: true,
                version: Some(version),
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, binary = %self.binary.display(), "Super binary self-test failed");
                BinaryStatus { binary_path: self.binary.clone(), accessible: false, version: None, error: Some(e.to_string()) }
            }
        }
    }

    /// Read a single record from `locator` to check that it is reachable.
    pub async fn probe_locator(&self, locator: &str) -> ProbeOutcome {
        match self.execute_with(PROBE_QUERY, locator, PROBE_TIMEOUT, 1).await {
            Ok(_) => ProbeOutcome { reachable: true, error: None },
            Err(e) => ProbeOutcome { reachable: false, error: Some(e.to_string()) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_limits() {
        let exec = SuperExecutor::new(&Settings::default())
            .with_timeout(Duration::from_secs(2))
            .with_max_results(7);
        assert_eq!(exec.timeout(), Duration::from_secs(2));
        assert_eq!(exec.max_results(), 7);
        assert_eq!(exec.binary(), Path::new("/usr/local/bin/super"));
    }

    #[test]
    fn missing_binary_is_not_found() {
        let err = validate_binary(Path::new("/definitely/not/here/super")).unwrap_err();
        assert!(matches!(err, Error::BinaryNotFound { .. }));
    }

    #[test]
    fn status_omits_empty_fields() {
        let status = BinaryStatus {
            binary_path: PathBuf::from("/bin/super"),
            accessible: true,
            version: Some("v0.1".into()),
            error: None,
        };
        let v = serde_json::to_value(&status).unwrap();
        assert_eq!(v["version"], "v0.1");
        assert!(v.get("error").is_none());
    }
}
