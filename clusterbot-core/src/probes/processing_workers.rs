//! Spark workers, one `jps -l` listing per host

use crate::config::Config;
use crate::probes::{count_matching, host_hint, per_host_command, Probe};
use crate::types::{ProbeResult, Subsystem};

#[derive(Debug, Clone)]
pub struct ProcessingWorkersProbe {
    pub hosts: Vec<String>,
    pub delimiter: String,
    pub host_command: String,
    pub worker_marker: String,
    pub expected: u32,
}

impl ProcessingWorkersProbe {
    pub fn from_config(config: &Config) -> Self {
        let probe = &config.probes.spark;
        Self {
            hosts: config.cluster.hosts_for(probe.expected),
            delimiter: config.cluster.host_delimiter.clone(),
            host_command: probe.host_command.clone(),
            worker_marker: probe.worker_marker.clone(),
            expected: probe.expected,
        }
    }
}

impl Probe for ProcessingWorkersProbe {
    fn subsystem(&self) -> Subsystem {
        Subsystem::ProcessingWorkers
    }

    fn command(&self) -> String {
        per_host_command(&self.hosts, &self.delimiter, &self.host_command)
    }

    fn inspection_hint(&self) -> String {
        host_hint(&self.host_command)
    }

    fn interpret(&self, lines: &[String]) -> ProbeResult {
        let hosts = count_matching(lines, &self.delimiter);
        let workers = count_matching(lines, &self.worker_marker);
        let result = ProbeResult::new(Subsystem::ProcessingWorkers, workers, self.expected);
        // workers == hosts && workers == expected
        if workers == self.expected && hosts != self.expected {
            result.with_anomaly(format!("{} of {} hosts listed", hosts, self.expected))
        } else {
            result
        }
    }
}
