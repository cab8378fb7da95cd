//! Command execution capability for probes
//!
//! Probes never shell out themselves. They describe what they want to run
//! in a [`CaptureRequest`] and an injected [`CommandExecutor`] turns that
//! into an ordered list of output lines. The live executor runs the command
//! through a shell and captures stdout into a transient log artifact; the
//! fixture executor reads canned diagnostic text and never executes anything.

use crate::config::ExecutorConfig;
use crate::error::{ClusterbotError, ClusterbotResult};
use crate::types::Subsystem;

use async_trait::async_trait;
use scopeguard::ScopeGuard;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// What a probe asks the executor to capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    /// Subsystem issuing the request, used to name the sink
    pub subsystem: Subsystem,
    /// Shell command line to run in live mode
    pub command: String,
    /// Keep the transient log artifact after reading it
    pub retain: bool,
}

impl CaptureRequest {
    pub fn new(subsystem: Subsystem, command: impl Into<String>) -> Self {
        Self {
            subsystem,
            command: command.into(),
            retain: false,
        }
    }

    pub fn retained(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    fn failure(&self, details: impl Into<String>) -> ClusterbotError {
        ClusterbotError::ProbeExecution {
            subsystem: self.subsystem,
            command: self.command.clone(),
            details: details.into(),
        }
    }
}

/// Produces the raw diagnostic text for a probe
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Capture the output of `request` as ordered lines, terminators stripped
    async fn capture(&self, request: &CaptureRequest) -> ClusterbotResult<Vec<String>>;

    /// Whether this executor reads fixtures instead of running commands
    fn is_offline(&self) -> bool {
        false
    }
}

/// Live executor: `<shell> -c <command>` with stdout redirected to a log artifact
#[derive(Debug, Clone)]
pub struct ShellCommandExecutor {
    /// Shell used to interpret command lines
    pub shell: String,
    /// Directory holding transient log artifacts
    pub log_dir: PathBuf,
    /// Unique per run so concurrent probes and overlapping runs never share an artifact
    pub run_id: String,
    /// Upper bound on a single command
    pub timeout: Option<Duration>,
}

impl ShellCommandExecutor {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            shell: "sh".to_string(),
            log_dir: log_dir.into(),
            run_id: uuid::Uuid::new_v4().simple().to_string(),
            timeout: Some(Duration::from_secs(300)),
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Artifact path for a subsystem in this run
    pub fn artifact_path(&self, subsystem: Subsystem) -> PathBuf {
        self.log_dir
            .join(format!("{}_{}.log", subsystem.key(), self.run_id))
    }

    async fn run_into(
        &self,
        request: &CaptureRequest,
        artifact: &Path,
    ) -> ClusterbotResult<std::process::Output> {
        let sink = std::fs::File::create(artifact).map_err(|e| {
            request.failure(format!("cannot create log {}: {}", artifact.display(), e))
        })?;

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(&request.command)
            .stdin(Stdio::null())
            .stdout(Stdio::from(sink))
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| request.failure(format!("failed to spawn {}: {}", self.shell, e)))?;

        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| request.failure(format!("timed out after {:?}", limit)))?,
            None => wait.await,
        };

        output.map_err(|e| request.failure(format!("failed to wait for command: {}", e)))
    }
}

#[async_trait]
impl CommandExecutor for ShellCommandExecutor {
    #[instrument(skip(self, request), fields(subsystem = %request.subsystem))]
    async fn capture(&self, request: &CaptureRequest) -> ClusterbotResult<Vec<String>> {
        let artifact = self.artifact_path(request.subsystem);
        // Removes the artifact on every exit path, including cancellation by a caller's deadline
        let cleanup = scopeguard::guard(artifact.clone(), |path| remove_artifact(&path));
        debug!("Executing command: {}", request.command);

        let start_time = Instant::now();
        let outcome = self.run_into(request, &artifact).await;

        let lines = match outcome {
            Ok(output) => match read_lines(&artifact).await {
                Ok(lines) if lines.is_empty() && !output.status.success() => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(request.failure(format!(
                        "exit status {} with no output: {}",
                        output.status.code().unwrap_or(-1),
                        stderr.trim()
                    )))
                }
                Ok(lines) => Ok(lines),
                Err(e) => Err(request.failure(format!(
                    "cannot read log {}: {}",
                    artifact.display(),
                    e
                ))),
            },
            Err(e) => Err(e),
        };

        if request.retain {
            debug!("Retaining log artifact {}", artifact.display());
            ScopeGuard::into_inner(cleanup);
        } else {
            drop(cleanup);
        }

        let duration = start_time.elapsed();
        match &lines {
            Ok(lines) => {
                if lines.is_empty() {
                    warn!("Command produced no output: {}", request.command);
                }
                info!(
                    "Command completed in {:?} with {} lines: {}",
                    duration,
                    lines.len(),
                    request.command
                );
            }
            Err(e) => error!("Command failed after {:?}: {}", duration, e),
        }
        lines
    }
}

/// Offline executor: `<fixture_dir>/<subsystem>.txt` stands in for the command output
#[derive(Debug, Clone)]
pub struct FixtureCommandExecutor {
    pub fixture_dir: PathBuf,
}

impl FixtureCommandExecutor {
    pub fn new(fixture_dir: impl Into<PathBuf>) -> Self {
        Self {
            fixture_dir: fixture_dir.into(),
        }
    }

    pub fn fixture_path(&self, subsystem: Subsystem) -> PathBuf {
        self.fixture_dir.join(format!("{}.txt", subsystem.key()))
    }
}

#[async_trait]
impl CommandExecutor for FixtureCommandExecutor {
    async fn capture(&self, request: &CaptureRequest) -> ClusterbotResult<Vec<String>> {
        let path = self.fixture_path(request.subsystem);
        debug!("Reading fixture {} in place of: {}", path.display(), request.command);

        let lines = read_lines(&path).await.map_err(|e| {
            request.failure(format!("fixture {} unreadable: {}", path.display(), e))
        })?;
        if lines.is_empty() {
            warn!("Fixture {} is empty", path.display());
        }
        Ok(lines)
    }

    fn is_offline(&self) -> bool {
        true
    }
}

fn remove_artifact(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_file(path) {
        warn!("Failed to remove log artifact {}: {}", path.display(), e);
    }
}

async fn read_lines(path: &Path) -> std::io::Result<Vec<String>> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect())
}

/// Canned response for one subsystem
#[derive(Debug, Clone)]
pub enum MockResponse {
    Lines(Vec<String>),
    Failure(String),
    /// Respond with lines after sleeping, for timeout tests
    Delayed(Duration, Vec<String>),
}

/// Mock implementation for testing
#[derive(Debug, Clone, Default)]
pub struct MockCommandExecutor {
    responses: HashMap<Subsystem, MockResponse>,
    calls: Arc<Mutex<Vec<CaptureRequest>>>,
}

impl MockCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `subsystem` with the given text, split into lines
    pub fn with_output(mut self, subsystem: Subsystem, text: &str) -> Self {
        let lines = text.lines().map(str::to_string).collect();
        self.responses.insert(subsystem, MockResponse::Lines(lines));
        self
    }

    pub fn with_failure(mut self, subsystem: Subsystem, details: impl Into<String>) -> Self {
        self.responses
            .insert(subsystem, MockResponse::Failure(details.into()));
        self
    }

    pub fn with_delay(mut self, subsystem: Subsystem, delay: Duration, text: &str) -> Self {
        let lines = text.lines().map(str::to_string).collect();
        self.responses
            .insert(subsystem, MockResponse::Delayed(delay, lines));
        self
    }

    /// Requests received so far, in arrival order
    pub async fn calls(&self) -> Vec<CaptureRequest> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl CommandExecutor for MockCommandExecutor {
    async fn capture(&self, request: &CaptureRequest) -> ClusterbotResult<Vec<String>> {
        self.calls.lock().await.push(request.clone());

        match self.responses.get(&request.subsystem) {
            Some(MockResponse::Lines(lines)) => Ok(lines.clone()),
            Some(MockResponse::Failure(details)) => Err(request.failure(details.clone())),
            Some(MockResponse::Delayed(delay, lines)) => {
                tokio::time::sleep(*delay).await;
                Ok(lines.clone())
            }
            None => Err(request.failure("no canned response")),
        }
    }

    fn is_offline(&self) -> bool {
        true
    }
}

/// Factory for creating command executors
pub struct CommandExecutorFactory;

impl CommandExecutorFactory {
    /// Live shell executor configured from `[executor]`
    pub fn create_live(config: &ExecutorConfig) -> Arc<dyn CommandExecutor> {
        let log_dir = config
            .log_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        Arc::new(
            ShellCommandExecutor::new(log_dir)
                .with_shell(config.shell.clone())
                .with_timeout(config.command_timeout),
        )
    }

    /// Fixture-backed executor for offline runs
    pub fn create_offline(config: &ExecutorConfig) -> Arc<dyn CommandExecutor> {
        Arc::new(FixtureCommandExecutor::new(config.fixture_dir.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fixture_executor_reads_lines_in_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("yarn.txt"),
            "Total Nodes:2\nslave1:45454 RUNNING\nslave2:45454 RUNNING\n",
        )
        .unwrap();

        let executor = FixtureCommandExecutor::new(dir.path());
        let request = CaptureRequest::new(Subsystem::ResourceManager, "yarn node -list -all");
        let lines = executor.capture(&request).await.unwrap();

        assert_eq!(
            lines,
            vec!["Total Nodes:2", "slave1:45454 RUNNING", "slave2:45454 RUNNING"]
        );
        // fixtures are never consumed
        assert!(dir.path().join("yarn.txt").exists());
        assert!(executor.is_offline());
    }

    #[tokio::test]
    async fn test_fixture_executor_missing_fixture_is_execution_error() {
        let dir = TempDir::new().unwrap();
        let executor = FixtureCommandExecutor::new(dir.path());
        let request = CaptureRequest::new(Subsystem::Filesystem, "hdfs dfsadmin -report");

        let err = executor.capture(&request).await.unwrap_err();
        assert!(matches!(
            err,
            ClusterbotError::ProbeExecution { subsystem: Subsystem::Filesystem, .. }
        ));
    }

    #[tokio::test]
    async fn test_shell_executor_captures_and_removes_artifact() {
        let dir = TempDir::new().unwrap();
        let executor = ShellCommandExecutor::new(dir.path()).with_run_id("t1");
        let request = CaptureRequest::new(Subsystem::ResourceManager, "printf 'a\\nb\\n'");

        let lines = executor.capture(&request).await.unwrap();

        assert_eq!(lines, vec!["a", "b"]);
        assert!(!executor.artifact_path(Subsystem::ResourceManager).exists());
    }

    #[tokio::test]
    async fn test_shell_executor_retains_artifact_on_request() {
        let dir = TempDir::new().unwrap();
        let executor = ShellCommandExecutor::new(dir.path()).with_run_id("t2");
        let request = CaptureRequest::new(Subsystem::Filesystem, "echo kept").retained(true);

        executor.capture(&request).await.unwrap();

        let artifact = executor.artifact_path(Subsystem::Filesystem);
        assert!(artifact.ends_with("hdfs_t2.log"));
        assert_eq!(std::fs::read_to_string(artifact).unwrap(), "kept\n");
    }

    #[tokio::test]
    async fn test_shell_executor_failure_without_output() {
        let dir = TempDir::new().unwrap();
        let executor = ShellCommandExecutor::new(dir.path());
        let request = CaptureRequest::new(Subsystem::ResourceManager, "echo boom >&2; exit 3");

        let err = executor.capture(&request).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("exit status 3"));
        assert!(message.contains("boom"));
    }

    #[tokio::test]
    async fn test_shell_executor_nonzero_exit_with_output_is_kept() {
        let dir = TempDir::new().unwrap();
        let executor = ShellCommandExecutor::new(dir.path());
        let request = CaptureRequest::new(Subsystem::Connectivity, "echo partial; exit 1");

        let lines = executor.capture(&request).await.unwrap();
        assert_eq!(lines, vec!["partial"]);
    }

    #[tokio::test]
    async fn test_shell_executor_timeout() {
        let dir = TempDir::new().unwrap();
        let executor = ShellCommandExecutor::new(dir.path())
            .with_run_id("t3")
            .with_timeout(Duration::from_millis(100));
        let request = CaptureRequest::new(Subsystem::ProcessingWorkers, "sleep 5");

        let err = executor.capture(&request).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(!executor.artifact_path(Subsystem::ProcessingWorkers).exists());
    }

    #[tokio::test]
    async fn test_shell_executor_removes_artifact_when_cancelled() {
        let dir = TempDir::new().unwrap();
        let executor = ShellCommandExecutor::new(dir.path())
            .with_run_id("t4")
            .without_timeout();
        let request = CaptureRequest::new(Subsystem::Connectivity, "echo partial; sleep 5");

        let outcome =
            tokio::time::timeout(Duration::from_millis(300), executor.capture(&request)).await;

        assert!(outcome.is_err());
        assert!(!executor.artifact_path(Subsystem::Connectivity).exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_artifact_names_are_unique_per_subsystem_and_run() {
        let first = ShellCommandExecutor::new("/tmp");
        let second = ShellCommandExecutor::new("/tmp");

        assert_ne!(
            first.artifact_path(Subsystem::ResourceManager),
            first.artifact_path(Subsystem::Filesystem)
        );
        assert_ne!(
            first.artifact_path(Subsystem::ResourceManager),
            second.artifact_path(Subsystem::ResourceManager)
        );
    }

    #[tokio::test]
    async fn test_mock_executor_records_calls() {
        let executor = MockCommandExecutor::new()
            .with_output(Subsystem::ResourceManager, "a RUNNING\n")
            .with_failure(Subsystem::Filesystem, "no hdfs binary");

        let ok = CaptureRequest::new(Subsystem::ResourceManager, "yarn node -list -all");
        assert_eq!(executor.capture(&ok).await.unwrap(), vec!["a RUNNING"]);

        let failing = CaptureRequest::new(Subsystem::Filesystem, "hdfs dfsadmin -report");
        assert!(executor.capture(&failing).await.is_err());

        let unknown = CaptureRequest::new(Subsystem::Connectivity, "ping");
        assert!(executor.capture(&unknown).await.is_err());

        assert_eq!(executor.calls().await.len(), 3);
    }
}
