//! Subsystem probes
//!
//! A probe names the command that produces its diagnostic text and reduces
//! that text to a [`ProbeResult`]. Interpretation is pure so every probe can
//! be exercised against literal output in tests; only [`Probe::execute`]
//! touches the injected executor.

pub mod connectivity;
pub mod filesystem;
pub mod instrumented_processes;
pub mod processing_workers;
pub mod resource_manager;

pub use connectivity::ConnectivityProbe;
pub use filesystem::FilesystemProbe;
pub use instrumented_processes::InstrumentedProcessesProbe;
pub use processing_workers::ProcessingWorkersProbe;
pub use resource_manager::ResourceManagerProbe;

use async_trait::async_trait;
use tracing::warn;

use crate::abstractions::{CaptureRequest, CommandExecutor};
use crate::config::{Config, HOST_PLACEHOLDER};
use crate::error::ClusterbotResult;
use crate::types::{ProbeResult, Subsystem};

/// Common contract of every subsystem check
#[async_trait]
pub trait Probe: Send + Sync {
    fn subsystem(&self) -> Subsystem;

    /// Command line whose output the probe interprets
    fn command(&self) -> String;

    /// Command an operator can run by hand when the subsystem is degraded
    fn inspection_hint(&self) -> String {
        self.command()
    }

    /// Reduce raw diagnostic lines to a result
    fn interpret(&self, lines: &[String]) -> ProbeResult;

    /// Capture diagnostic text through `executor` and interpret it
    async fn execute(
        &self,
        executor: &dyn CommandExecutor,
        retain: bool,
    ) -> ClusterbotResult<ProbeResult> {
        let request = CaptureRequest::new(self.subsystem(), self.command()).retained(retain);
        let lines = executor.capture(&request).await?;

        let mut result = self.interpret(&lines).with_hint(self.inspection_hint());
        if lines.is_empty() && result.anomaly.is_none() {
            // An empty capture reads as zero healthy units; make that visible.
            warn!(subsystem = %self.subsystem(), "Probe produced no diagnostic output");
            result = result.with_anomaly("no diagnostic output");
        }
        Ok(result)
    }
}

/// Build the probe for `subsystem` from configuration
pub fn probe_for(subsystem: Subsystem, config: &Config) -> Box<dyn Probe> {
    match subsystem {
        Subsystem::Connectivity => Box::new(ConnectivityProbe::from_config(config)),
        Subsystem::InstrumentedProcesses => {
            Box::new(InstrumentedProcessesProbe::from_config(config))
        }
        Subsystem::ResourceManager => Box::new(ResourceManagerProbe::from_config(config)),
        Subsystem::Filesystem => Box::new(FilesystemProbe::from_config(config)),
        Subsystem::ProcessingWorkers => Box::new(ProcessingWorkersProbe::from_config(config)),
    }
}

/// Number of lines containing `marker`
pub(crate) fn count_matching(lines: &[String], marker: &str) -> u32 {
    lines.iter().filter(|line| line.contains(marker)).count() as u32
}

/// Shell script visiting every host in turn, each section opened by a delimiter line
pub(crate) fn per_host_command(hosts: &[String], delimiter: &str, template: &str) -> String {
    hosts
        .iter()
        .map(|host| {
            format!(
                "echo '{} {}'; {}",
                delimiter,
                host,
                template.replace(HOST_PLACEHOLDER, host)
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Template with the host slot left visible, for remediation hints
pub(crate) fn host_hint(template: &str) -> String {
    template.replace(HOST_PLACEHOLDER, "<host>")
}

#[cfg(test)]
pub(crate) fn lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}
