//! The reporter: runs the selected probes and delivers one aggregated message
//!
//! Probes run concurrently, each bounded by the configured probe timeout.
//! A probe that fails degrades its own line and never aborts the run; a
//! probe that overruns is reported incomplete. The report is assembled in
//! canonical order whatever the completion order.

use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::abstractions::{
    Clock, CommandExecutor, CommandExecutorFactory, ConsoleNotifier, FixedClock, Notifier,
    SystemClock, WebhookNotifier,
};
use crate::config::Config;
use crate::error::{ClusterbotError, ClusterbotResult};
use crate::probes::{probe_for, Probe};
use crate::report::{Report, ReportBuilder, ReportEntry};
use crate::types::Subsystem;

pub struct Reporter {
    probes: BTreeMap<Subsystem, Box<dyn Probe>>,
    executor: Arc<dyn CommandExecutor>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    probe_timeout: Duration,
    retain_logs: bool,
}

impl Reporter {
    /// Assemble a reporter from explicit capabilities
    pub fn new(
        config: &Config,
        executor: Arc<dyn CommandExecutor>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let probes = config
            .selected_services()
            .into_iter()
            .map(|subsystem| (subsystem, probe_for(subsystem, config)))
            .collect();

        Self {
            probes,
            executor,
            notifier,
            clock,
            probe_timeout: config.report.probe_timeout,
            retain_logs: config.executor.retain_logs,
        }
    }

    /// Pick live or offline capabilities once, from `report.offline`
    pub fn from_config(config: &Config) -> ClusterbotResult<Self> {
        if config.report.offline {
            info!(
                "Offline mode: reading fixtures from {}",
                config.executor.fixture_dir.display()
            );
            return Ok(Self::new(
                config,
                CommandExecutorFactory::create_offline(&config.executor),
                Arc::new(ConsoleNotifier),
                Arc::new(FixedClock::offline()),
            ));
        }

        let endpoint = config.notifier.webhook_url.clone().ok_or_else(|| {
            ClusterbotError::ConfigError("webhook_url is required unless running offline".to_string())
        })?;
        let notifier = WebhookNotifier::new(endpoint, config.notifier.timeout)?;

        Ok(Self::new(
            config,
            CommandExecutorFactory::create_live(&config.executor),
            Arc::new(notifier),
            Arc::new(SystemClock::new()),
        ))
    }

    /// Services that will be probed, in canonical order
    pub fn selected(&self) -> BTreeSet<Subsystem> {
        self.probes.keys().copied().collect()
    }

    pub fn is_offline(&self) -> bool {
        self.executor.is_offline()
    }

    /// Run every selected probe and finalize the report
    pub async fn run_all(&self) -> Report {
        let timestamp = self.clock.timestamp();
        info!(
            "Starting cluster report ({}) for {} service(s)",
            timestamp,
            self.probes.len()
        );

        let mut builder = ReportBuilder::new(timestamp);
        for subsystem in Subsystem::ALL {
            if !self.probes.contains_key(&subsystem) {
                builder.record(ReportEntry::Disabled(subsystem));
            }
        }

        let runs = self.probes.values().map(|probe| self.run_probe(probe.as_ref()));
        for entry in join_all(runs).await {
            builder.record(entry);
        }

        let report = builder.finish();
        info!("Cluster report finished: {}", report.overall());
        report
    }

    async fn run_probe(&self, probe: &dyn Probe) -> ReportEntry {
        let subsystem = probe.subsystem();
        let execution = probe.execute(self.executor.as_ref(), self.retain_logs);

        match tokio::time::timeout(self.probe_timeout, execution).await {
            Ok(Ok(result)) => {
                info!(
                    subsystem = %subsystem,
                    healthy = result.healthy,
                    expected = result.expected,
                    status = ?result.status,
                    "Probe finished"
                );
                ReportEntry::Probed(result)
            }
            Ok(Err(e)) => {
                error!(subsystem = %subsystem, "{}", e);
                let reason = match e {
                    ClusterbotError::ProbeExecution { details, .. } => details,
                    other => other.to_string(),
                };
                ReportEntry::Failed {
                    subsystem,
                    command: probe.inspection_hint(),
                    reason,
                }
            }
            Err(_) => {
                warn!(
                    subsystem = %subsystem,
                    "Probe still running after {:?}, reporting incomplete",
                    self.probe_timeout
                );
                ReportEntry::Incomplete {
                    subsystem,
                    after: self.probe_timeout,
                }
            }
        }
    }

    /// Hand the finished report to the notifier; the report text is logged if that fails
    pub async fn deliver(&self, report: &Report) -> ClusterbotResult<()> {
        match self.notifier.post(report.text(), report.display_name()).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("Report delivery failed: {}\n{}", e, report.text());
                Err(e)
            }
        }
    }
}
