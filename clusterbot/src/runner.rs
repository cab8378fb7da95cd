use std::path::PathBuf;

use clusterbot_core::{
    ClusterbotError, ClusterbotResult, Config, Report, Reporter, Subsystem,
};

/// Options gathered from the command line; anything set here wins over the config file
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    pub webhook_url: Option<String>,
    pub services: Vec<Subsystem>,
    pub offline: bool,
    pub fixture_dir: Option<PathBuf>,
    pub retain_logs: bool,
    pub log_level: Option<String>,
}

impl RunOptions {
    /// Resolve the effective configuration: file, then environment, then flags
    pub fn resolve(&self) -> ClusterbotResult<Config> {
        let mut config = match &self.config_path {
            Some(path) => Config::load(path)?,
            None => {
                let mut config = Config::default();
                config.apply_env_overrides()?;
                config
            }
        };

        if let Some(url) = &self.webhook_url {
            config.notifier.webhook_url = Some(url.clone());
        }
        if !self.services.is_empty() {
            config.report.services = self.services.clone();
        }
        if self.offline {
            config.report.offline = true;
        }
        if let Some(dir) = &self.fixture_dir {
            config.executor.fixture_dir = dir.clone();
        }
        if self.retain_logs {
            config.executor.retain_logs = true;
        }
        if let Some(level) = &self.log_level {
            config.observability.logging.level = level.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

/// Run every selected probe, deliver the report, then apply the exit policy.
///
/// The report is always delivered first; probe execution failures turn
/// into an error afterwards so the process exits non-zero.
pub async fn run(config: &Config) -> ClusterbotResult<Report> {
    let reporter = Reporter::from_config(config)?;
    let report = reporter.run_all().await;
    reporter.deliver(&report).await?;

    let failed = report.failed_subsystems();
    if !failed.is_empty() {
        return Err(ClusterbotError::ProbesFailed {
            subsystems: failed
                .iter()
                .map(Subsystem::key)
                .collect::<Vec<_>>()
                .join(", "),
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn config_without_webhook() -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[report]\nservices = [\"yarn\"]\n").unwrap();
        file
    }

    #[test]
    fn test_offline_flag_completes_config_file() {
        let file = config_without_webhook();
        let options = RunOptions {
            config_path: Some(file.path().to_path_buf()),
            offline: true,
            ..RunOptions::default()
        };

        let config = options.resolve().unwrap();
        assert!(config.report.offline);
        assert_eq!(config.report.services, vec![Subsystem::ResourceManager]);
    }

    #[test]
    fn test_webhook_flag_completes_config_file() {
        let file = config_without_webhook();
        let options = RunOptions {
            config_path: Some(file.path().to_path_buf()),
            webhook_url: Some("https://hooks.example.com/T2".to_string()),
            ..RunOptions::default()
        };

        let config = options.resolve().unwrap();
        assert_eq!(
            config.notifier.webhook_url.as_deref(),
            Some("https://hooks.example.com/T2")
        );
    }

    #[test]
    fn test_flags_override_defaults() {
        let options = RunOptions {
            webhook_url: Some("https://hooks.example.com/T1".to_string()),
            services: vec![Subsystem::Filesystem],
            retain_logs: true,
            log_level: Some("debug".to_string()),
            ..RunOptions::default()
        };

        let config = options.resolve().unwrap();

        assert_eq!(
            config.notifier.webhook_url.as_deref(),
            Some("https://hooks.example.com/T1")
        );
        assert_eq!(config.report.services, vec![Subsystem::Filesystem]);
        assert!(config.executor.retain_logs);
        assert_eq!(config.observability.logging.level, "debug");
    }

    #[test]
    fn test_offline_flag_skips_webhook_requirement() {
        let options = RunOptions {
            offline: true,
            fixture_dir: Some(PathBuf::from("/srv/fixtures")),
            ..RunOptions::default()
        };
        let config = options.resolve().unwrap();
        assert!(config.report.offline);
        assert_eq!(config.executor.fixture_dir, PathBuf::from("/srv/fixtures"));
    }

    #[tokio::test]
    async fn test_run_reports_missing_fixtures_as_failure() {
        let dir = std::env::temp_dir().join(format!("clusterbot-empty-{}", std::process::id()));
        let options = RunOptions {
            offline: true,
            services: vec![Subsystem::ResourceManager],
            fixture_dir: Some(dir),
            ..RunOptions::default()
        };
        let config = options.resolve().unwrap();

        let err = run(&config).await.unwrap_err();
        assert!(matches!(err, ClusterbotError::ProbesFailed { ref subsystems } if subsystems == "yarn"));
    }
}
