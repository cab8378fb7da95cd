//! YARN node managers, counted from `yarn node -list -all`

use crate::config::Config;
use crate::probes::{count_matching, Probe};
use crate::types::{ProbeResult, Subsystem};

#[derive(Debug, Clone)]
pub struct ResourceManagerProbe {
    pub command: String,
    pub running_marker: String,
    pub expected: u32,
}

impl ResourceManagerProbe {
    pub fn from_config(config: &Config) -> Self {
        let yarn = &config.probes.yarn;
        Self {
            command: yarn.command.clone(),
            running_marker: yarn.running_marker.clone(),
            expected: yarn.expected,
        }
    }
}

impl Probe for ResourceManagerProbe {
    fn subsystem(&self) -> Subsystem {
        Subsystem::ResourceManager
    }

    fn command(&self) -> String {
        self.command.clone()
    }

    fn interpret(&self, lines: &[String]) -> ProbeResult {
        let running = count_matching(lines, &self.running_marker);
        ProbeResult::new(Subsystem::ResourceManager, running, self.expected)
    }
}
