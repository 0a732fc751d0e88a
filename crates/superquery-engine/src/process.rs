//! Child-process supervision: spawn, bounded wait, forced teardown.
//!
//! Every exit path that leaves the child running (timeout, read error,
//! truncation) kills it and waits for the kill to be reaped before returning.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};

use superquery_core::types::ResultSet;
use superquery_core::{Error, Result};

use crate::output::{Flow, JsonLinesCollector};

/// Credential and region variables forwarded explicitly to the engine.
pub const CREDENTIAL_VARS: [&str; 4] = [
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "AWS_REGION",
];

const REGION_VAR: &str = "AWS_REGION";

/// Diagnostic text kept from standard error (64 KB).
const MAX_STDERR_BYTES: usize = 64 * 1024;

/// How long stderr may stay open once the engine has exited.
const STDERR_GRACE: Duration = Duration::from_secs(1);

/// Environment additions for one engine process. The rest of the caller's
/// environment is inherited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEnv {
    pub forwarded: Vec<(&'static str, OsString)>,
    pub injected_region: Option<String>,
}

impl EngineEnv {
    pub fn resolve(lookup: impl Fn(&str) -> Option<OsString>, default_region: &str) -> Self {
        let forwarded = CREDENTIAL_VARS
            .iter()
            .filter_map(|&name| lookup(name).map(|value| (name, value)))
            .collect();
        let injected_region = lookup(REGION_VAR).is_none().then(|| default_region.to_string());
        Self { forwarded, injected_region }
    }

    pub fn from_process(default_region: &str) -> Self {
        Self::resolve(|name| std::env::var_os(name), default_region)
    }

    fn apply(&self, command: &mut Command) {
        for (name, value) in &self.forwarded {
            command.env(name, value);
        }
        if let Some(region) = &self.injected_region {
            command.env(REGION_VAR, region);
        }
        let names: Vec<&str> = self.forwarded.iter().map(|(name, _)| *name).collect();
        tracing::debug!(forwarded = ?names, injected_region = ?self.injected_region, "engine environment");
    }
}

pub(crate) fn command(binary: &Path, args: &[&str], env: Option<&EngineEnv>) -> Command {
    let mut command = Command::new(binary);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(env) = env {
        env.apply(&mut command);
    }
    command
}

fn spawn(mut command: Command, binary: &Path) -> Result<Child> {
    command.spawn().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::BinaryNotFound { path: binary.to_path_buf() },
        io::ErrorKind::PermissionDenied => Error::BinaryNotExecutable { path: binary.to_path_buf() },
        _ => Error::Io(e),
    })
}

fn missing_pipe(name: &str) -> Error {
    Error::Io(io::Error::other(format!("{name} was not captured")))
}

/// Kill the child and wait until it has been reaped.
async fn terminate(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "kill failed, child already gone");
    }
    tracing::debug!(pid = ?child.id(), "engine process torn down");
}

/// Keep the first [`MAX_STDERR_BYTES`] and drain the rest so the child never
/// blocks on a full pipe.
async fn read_diagnostics<R: AsyncRead + Unpin>(mut reader: R) -> io::Result<String> {
    let mut buf = Vec::new();
    (&mut reader).take(MAX_STDERR_BYTES as u64).read_to_end(&mut buf).await?;
    tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(String::from_utf8_lossy(&buf).trim().to_string())
}

async fn collect_lines<R: AsyncRead + Unpin>(reader: R, max_records: usize) -> io::Result<ResultSet> {
    let mut collector = JsonLinesCollector::new(max_records);
    let mut lines = BufReader::new(reader).split(b'\n');
    while let Some(line) = lines.next_segment().await? {
        if collector.push(&line) == Flow::Stop {
            break;
        }
    }
    Ok(collector.finish())
}

/// Run the command, streaming standard output as JSON lines.
///
/// Non-zero exit is an `ExecutionFailed` carrying standard error. When the
/// record cap is hit the process is killed and its exit status ignored.
pub(crate) async fn run_json_lines(
    command: Command,
    binary: &Path,
    timeout: Duration,
    max_records: usize,
) -> Result<ResultSet> {
    let mut child = spawn(command, binary)?;
    let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;
    let mut stderr_task = tokio::spawn(read_diagnostics(stderr));
    let stderr_abort = stderr_task.abort_handle();

    let run = async {
        let result = collect_lines(stdout, max_records).await?;
        if result.truncated {
            terminate(&mut child).await;
            stderr_abort.abort();
            return Ok::<_, io::Error>((result, None, String::new()));
        }
        let status = child.wait().await?;
        // Descendants of the engine may still hold stderr open after it exits.
        let diagnostics = match tokio::time::timeout(STDERR_GRACE, &mut stderr_task).await {
            Ok(joined) => joined.map_err(io::Error::other)??,
            Err(_) => {
                tracing::debug!("stderr still open after engine exit");
                stderr_abort.abort();
                String::new()
            }
        };
        Ok::<_, io::Error>((result, Some(status), diagnostics))
    };

    match tokio::time::timeout(timeout, run).await {
        Ok(Ok((result, status, diagnostics))) => {
            if let Some(status) = status.filter(|s| !s.success()) {
                tracing::error!(?status, stderr = %diagnostics, "Super query failed");
                return Err(Error::ExecutionFailed { stderr: failure_text(diagnostics) });
            }
            Ok(result)
        }
        Ok(Err(e)) => {
            terminate(&mut child).await;
            stderr_abort.abort();
            Err(Error::Io(e))
        }
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs_f64(), "Query timed out, killing engine");
            terminate(&mut child).await;
            stderr_abort.abort();
            Err(Error::Timeout { timeout })
        }
    }
}

/// Fully captured output of a short-lived invocation.
#[derive(Debug)]
pub(crate) struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Run the command to completion, capturing both streams as text.
pub(crate) async fn run_captured(command: Command, binary: &Path, timeout: Duration) -> Result<Captured> {
    let mut child = spawn(command, binary)?;
    let mut stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

    let run = async {
        let mut out = Vec::new();
        let (read, diagnostics) = tokio::join!(stdout.read_to_end(&mut out), read_diagnostics(stderr));
        read?;
        let stderr = diagnostics?;
        let status = child.wait().await?;
        Ok::<_, io::Error>(Captured {
            status,
            stdout: String::from_utf8_lossy(&out).trim().to_string(),
            stderr,
        })
    };

    match tokio::time::timeout(timeout, run).await {
        Ok(Ok(captured)) => Ok(captured),
        Ok(Err(e)) => {
            terminate(&mut child).await;
            Err(Error::Io(e))
        }
        Err(_) => {
            terminate(&mut child).await;
            Err(Error::Timeout { timeout })
        }
    }
}

pub(crate) fn failure_text(stderr: String) -> String {
    if stderr.is_empty() {
        "Unknown error".to_string()
    } else {
        stderr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> =
            vars.iter().map(|(k, v)| ((*k).to_string(), OsString::from(v))).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn injects_default_region_when_unset() {
        let env = EngineEnv::resolve(lookup(&[("AWS_ACCESS_KEY_ID", "test-key")]), "us-east-1");
        assert_eq!(env.injected_region.as_deref(), Some("us-east-1"));
        assert_eq!(env.forwarded, vec![("AWS_ACCESS_KEY_ID", OsString::from("test-key"))]);
    }

    #[test]
    fn keeps_caller_region() {
        let env = EngineEnv::resolve(
            lookup(&[
                ("AWS_ACCESS_KEY_ID", "test-key"),
                ("AWS_SECRET_ACCESS_KEY", "test-secret"),
                ("AWS_REGION", "us-west-2"),
                ("UNRELATED", "x"),
            ]),
            "us-east-1",
        );
        assert_eq!(env.injected_region, None);
        let names: Vec<&str> = env.forwarded.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_REGION"]);
    }

    #[test]
    fn empty_stderr_gets_generic_message() {
        assert_eq!(failure_text(String::new()), "Unknown error");
        assert_eq!(failure_text("boom".into()), "boom");
    }
}
