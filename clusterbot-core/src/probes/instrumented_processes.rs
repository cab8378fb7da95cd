//! JVM inventory, one `jps` listing per host
//!
//! Health is judged by the absence of problems: a host section counts as
//! healthy unless one of its lines carries the unavailable marker.

use crate::config::Config;
use crate::probes::{count_matching, host_hint, per_host_command, Probe};
use crate::types::{ProbeResult, Subsystem};

#[derive(Debug, Clone)]
pub struct InstrumentedProcessesProbe {
    pub hosts: Vec<String>,
    pub delimiter: String,
    pub host_command: String,
    pub unavailable_marker: String,
    pub expected: u32,
}

impl InstrumentedProcessesProbe {
    pub fn from_config(config: &Config) -> Self {
        let probe = &config.probes.jvm;
        Self {
            hosts: config.cluster.hosts_for(probe.expected),
            delimiter: config.cluster.host_delimiter.clone(),
            host_command: probe.host_command.clone(),
            unavailable_marker: probe.unavailable_marker.clone(),
            expected: probe.expected,
        }
    }
}

impl Probe for InstrumentedProcessesProbe {
    fn subsystem(&self) -> Subsystem {
        Subsystem::InstrumentedProcesses
    }

    fn command(&self) -> String {
        per_host_command(&self.hosts, &self.delimiter, &self.host_command)
    }

    fn inspection_hint(&self) -> String {
        host_hint(&self.host_command)
    }

    fn interpret(&self, lines: &[String]) -> ProbeResult {
        let hosts = count_matching(lines, &self.delimiter);
        let problems = count_matching(lines, &self.unavailable_marker);
        ProbeResult::new(
            Subsystem::InstrumentedProcesses,
            hosts.saturating_sub(problems),
            self.expected,
        )
        .with_problems(problems)
    }
}
