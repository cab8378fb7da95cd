//! Configuration loaded from TOML with environment variable overrides
//!
//! Every section falls back to defaults matching the reference deployment:
//! nine slaves named `slave1`..`slave9`, all five services enabled, live mode.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ClusterbotError, ClusterbotResult};
use crate::types::{Subsystem, DEFAULT_EXPECTED};

static HOST_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+$").expect("host name pattern is valid")
});

/// Placeholder substituted with each host name in per-host commands
pub const HOST_PLACEHOLDER: &str = "{host}";

/// Complete configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which services run and how
    pub report: ReportConfig,

    /// Webhook delivery
    pub notifier: NotifierConfig,

    /// Command execution
    pub executor: ExecutorConfig,

    /// Host inventory
    pub cluster: ClusterConfig,

    /// Per-probe thresholds, commands and markers
    pub probes: ProbesConfig,

    /// Logging
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Enabled services; the rest render as disabled
    pub services: Vec<Subsystem>,

    /// Read fixtures and print instead of executing and posting
    pub offline: bool,

    /// Deadline for a single probe; overrunning probes are reported incomplete
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Incoming webhook URL, required for live runs
    pub webhook_url: Option<String>,

    /// Request timeout for the single POST
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Where transient log artifacts go (system temp dir when unset)
    pub log_dir: Option<PathBuf>,

    /// Keep log artifacts after reading them
    pub retain_logs: bool,

    /// Directory of `<service>.txt` fixtures for offline runs
    pub fixture_dir: PathBuf,

    /// Shell interpreting probe commands
    pub shell: String,

    /// Upper bound on a single shell command
    #[serde(with = "humantime_serde")]
    pub command_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Explicit host list; generated from `host_prefix` when empty
    pub hosts: Vec<String>,

    /// Hosts are `<prefix>1`..`<prefix>N` when no list is given
    pub host_prefix: String,

    /// Line echoed before each host's output in per-host probes
    pub host_delimiter: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbesConfig {
    pub executors: ConnectivityProbeConfig,
    pub jvm: JvmProbeConfig,
    pub yarn: YarnProbeConfig,
    pub hdfs: HdfsProbeConfig,
    pub spark: SparkProbeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityProbeConfig {
    pub expected: u32,
    pub host_command: String,
    /// Present on a ping summary line only when the echo came back
    pub success_marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JvmProbeConfig {
    pub expected: u32,
    pub host_command: String,
    /// jps prints "process information unavailable" for stale JVMs
    pub unavailable_marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YarnProbeConfig {
    pub expected: u32,
    pub command: String,
    pub running_marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HdfsProbeConfig {
    pub expected: u32,
    pub command: String,
    /// Matched case-insensitively
    pub live_marker: String,
    pub dead_marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SparkProbeConfig {
    pub expected: u32,
    pub host_command: String,
    pub worker_marker: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            services: Subsystem::ALL.to_vec(),
            offline: false,
            probe_timeout: Duration::from_secs(120),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            retain_logs: false,
            fixture_dir: PathBuf::from("fixtures"),
            shell: "sh".to_string(),
            command_timeout: Duration::from_secs(90),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            host_prefix: "slave".to_string(),
            host_delimiter: "==>".to_string(),
        }
    }
}

impl Default for ConnectivityProbeConfig {
    fn default() -> Self {
        Self {
            expected: DEFAULT_EXPECTED,
            host_command: "ping -c 1 -W 2 {host}".to_string(),
            success_marker: "transmitted, 1".to_string(),
        }
    }
}

impl Default for JvmProbeConfig {
    fn default() -> Self {
        Self {
            expected: DEFAULT_EXPECTED,
            host_command: "ssh -o BatchMode=yes {host} jps".to_string(),
            unavailable_marker: "unavailable".to_string(),
        }
    }
}

impl Default for YarnProbeConfig {
    fn default() -> Self {
        Self {
            expected: DEFAULT_EXPECTED,
            command: "yarn node -list -all".to_string(),
            running_marker: "RUNNING".to_string(),
        }
    }
}

impl Default for HdfsProbeConfig {
    fn default() -> Self {
        Self {
            expected: DEFAULT_EXPECTED,
            command: "hdfs dfsadmin -report".to_string(),
            live_marker: "live datanodes".to_string(),
            dead_marker: "Dead".to_string(),
        }
    }
}

impl Default for SparkProbeConfig {
    fn default() -> Self {
        Self {
            expected: DEFAULT_EXPECTED,
            host_command: "ssh -o BatchMode=yes {host} jps -l".to_string(),
            worker_marker: "org.apache.spark.deploy.worker.Worker".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ClusterConfig {
    /// Hosts a per-host probe should visit
    pub fn hosts_for(&self, expected: u32) -> Vec<String> {
        if self.hosts.is_empty() {
            (1..=expected)
                .map(|i| format!("{}{}", self.host_prefix, i))
                .collect()
        } else {
            self.hosts.clone()
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file, environment included
    pub fn from_file<P: AsRef<Path>>(path: P) -> ClusterbotResult<Self> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse the file and apply environment overrides, leaving validation to the caller
    pub fn load<P: AsRef<Path>>(path: P) -> ClusterbotResult<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse the file as written, without environment overrides or validation
    pub fn parse_file<P: AsRef<Path>>(path: P) -> ClusterbotResult<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            ClusterbotError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Ok(toml::from_str(&contents)?)
    }

    /// Apply `CLUSTERBOT_*` environment variables
    pub fn apply_env_overrides(&mut self) -> ClusterbotResult<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> ClusterbotResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CLUSTERBOT_WEBHOOK_URL") {
            self.notifier.webhook_url = Some(url);
        }
        if let Some(services) = lookup("CLUSTERBOT_SERVICES") {
            self.report.services = parse_services(&services)?;
        }
        if let Some(level) = lookup("CLUSTERBOT_LOG_LEVEL") {
            self.observability.logging.level = level;
        }
        if let Some(dir) = lookup("CLUSTERBOT_FIXTURE_DIR") {
            self.executor.fixture_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ClusterbotResult<()> {
        if !self.report.offline {
            let url = self.notifier.webhook_url.as_deref().ok_or_else(|| {
                ClusterbotError::ConfigError(
                    "webhook_url is required unless running offline".to_string(),
                )
            })?;
            let parsed = url::Url::parse(url).map_err(|e| {
                ClusterbotError::ConfigError(format!("Invalid webhook URL '{}': {}", url, e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ClusterbotError::ConfigError(format!(
                    "Webhook URL must be http or https, got '{}'",
                    parsed.scheme()
                )));
            }
        }

        if self.report.probe_timeout.is_zero() {
            return Err(ClusterbotError::ConfigError(
                "probe_timeout must be greater than zero".to_string(),
            ));
        }
        // Shell commands must hit their own deadline before the probe deadline fires
        if !self.report.offline && self.report.probe_timeout <= self.executor.command_timeout {
            return Err(ClusterbotError::ConfigError(format!(
                "report.probe_timeout ({:?}) must exceed executor.command_timeout ({:?})",
                self.report.probe_timeout, self.executor.command_timeout
            )));
        }

        match self.observability.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ClusterbotError::ConfigError(format!(
                    "Invalid log level: {}",
                    self.observability.logging.level
                )))
            }
        }

        // Host names end up inside shell command lines
        for host in &self.cluster.hosts {
            if !HOST_NAME.is_match(host) {
                return Err(ClusterbotError::ConfigError(format!(
                    "Invalid host name: '{}'",
                    host
                )));
            }
        }
        if !self.cluster.host_prefix.is_empty() && !HOST_NAME.is_match(&self.cluster.host_prefix) {
            return Err(ClusterbotError::ConfigError(format!(
                "Invalid host prefix: '{}'",
                self.cluster.host_prefix
            )));
        }
        if self.cluster.hosts.is_empty() && self.cluster.host_prefix.is_empty() {
            return Err(ClusterbotError::ConfigError(
                "Either cluster.hosts or cluster.host_prefix must be set".to_string(),
            ));
        }
        if self.cluster.host_delimiter.trim().is_empty() || self.cluster.host_delimiter.contains('\'') {
            return Err(ClusterbotError::ConfigError(
                "cluster.host_delimiter must be non-empty and free of single quotes".to_string(),
            ));
        }

        let templates = [
            ("probes.executors.host_command", &self.probes.executors.host_command),
            ("probes.jvm.host_command", &self.probes.jvm.host_command),
            ("probes.spark.host_command", &self.probes.spark.host_command),
        ];
        for (field, template) in templates {
            if !template.contains(HOST_PLACEHOLDER) {
                return Err(ClusterbotError::ConfigError(format!(
                    "{} must contain {}",
                    field, HOST_PLACEHOLDER
                )));
            }
        }

        let required = [
            ("probes.executors.success_marker", &self.probes.executors.success_marker),
            ("probes.jvm.unavailable_marker", &self.probes.jvm.unavailable_marker),
            ("probes.yarn.command", &self.probes.yarn.command),
            ("probes.yarn.running_marker", &self.probes.yarn.running_marker),
            ("probes.hdfs.command", &self.probes.hdfs.command),
            ("probes.hdfs.live_marker", &self.probes.hdfs.live_marker),
            ("probes.hdfs.dead_marker", &self.probes.hdfs.dead_marker),
            ("probes.spark.worker_marker", &self.probes.spark.worker_marker),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ClusterbotError::ConfigError(format!(
                    "{} cannot be empty",
                    field
                )));
            }
        }

        Ok(())
    }

    /// Enabled services as a set; duplicates collapse
    pub fn selected_services(&self) -> BTreeSet<Subsystem> {
        self.report.services.iter().copied().collect()
    }
}

/// Parse a comma separated service list; an empty list disables every service
pub fn parse_services(value: &str) -> ClusterbotResult<Vec<Subsystem>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::parse::<Subsystem>)
        .collect()
}

/// Configuration builder for programmatic construction
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.config.notifier.webhook_url = Some(url.into());
        self
    }

    pub fn services<I: IntoIterator<Item = Subsystem>>(mut self, services: I) -> Self {
        self.config.report.services = services.into_iter().collect();
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.config.report.offline = offline;
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.report.probe_timeout = timeout;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.executor.command_timeout = timeout;
        self
    }

    pub fn fixture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.executor.fixture_dir = dir.into();
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.executor.log_dir = Some(dir.into());
        self
    }

    pub fn retain_logs(mut self, retain: bool) -> Self {
        self.config.executor.retain_logs = retain;
        self
    }

    pub fn hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.cluster.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Set the expected capacity of one subsystem
    pub fn expected(mut self, subsystem: Subsystem, expected: u32) -> Self {
        let probes = &mut self.config.probes;
        match subsystem {
            Subsystem::Connectivity => probes.executors.expected = expected,
            Subsystem::InstrumentedProcesses => probes.jvm.expected = expected,
            Subsystem::ResourceManager => probes.yarn.expected = expected,
            Subsystem::Filesystem => probes.hdfs.expected = expected,
            Subsystem::ProcessingWorkers => probes.spark.expected = expected,
        }
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.observability.logging.level = level.into();
        self
    }

    pub fn build(self) -> ClusterbotResult<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
