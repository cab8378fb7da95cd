//! HDFS datanodes from `hdfs dfsadmin -report`
//!
//! The live count is the whole digit run on the first line mentioning live
//! datanodes, so "Live datanodes (12):" reads as 12. Dead datanodes are
//! problems: a summary line such as "Dead datanodes (2):" contributes its
//! count, any other line carrying the dead marker contributes one.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::config::Config;
use crate::error::{ClusterbotError, ClusterbotResult};
use crate::probes::Probe;
use crate::types::{ProbeResult, Subsystem};

static DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("digit pattern is valid"));

#[derive(Debug, Clone)]
pub struct FilesystemProbe {
    pub command: String,
    pub live_marker: String,
    pub dead_marker: String,
    pub expected: u32,
}

impl FilesystemProbe {
    pub fn from_config(config: &Config) -> Self {
        let hdfs = &config.probes.hdfs;
        Self {
            command: hdfs.command.clone(),
            live_marker: hdfs.live_marker.clone(),
            dead_marker: hdfs.dead_marker.clone(),
            expected: hdfs.expected,
        }
    }

    /// Live count from the report
    pub fn live_datanodes(&self, lines: &[String]) -> ClusterbotResult<u32> {
        let anomaly = |details: String| ClusterbotError::ParseAnomaly {
            subsystem: Subsystem::Filesystem,
            details,
        };
        let marker = self.live_marker.to_lowercase();
        let line = lines
            .iter()
            .find(|line| line.to_lowercase().contains(&marker))
            .ok_or_else(|| anomaly(format!("no '{}' line", self.live_marker)))?;
        first_number(line)
            .ok_or_else(|| anomaly(format!("no count on '{}' line", self.live_marker)))
    }

    pub fn dead_datanodes(&self, lines: &[String]) -> u32 {
        lines
            .iter()
            .filter(|line| line.contains(&self.dead_marker))
            .map(|line| {
                if line.to_lowercase().contains("datanodes") {
                    first_number(line).unwrap_or(1)
                } else {
                    1
                }
            })
            .sum()
    }
}

fn first_number(line: &str) -> Option<u32> {
    DIGIT_RUN
        .find(line)
        .and_then(|digits| digits.as_str().parse().ok())
}

impl Probe for FilesystemProbe {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Filesystem
    }

    fn command(&self) -> String {
        self.command.clone()
    }

    fn interpret(&self, lines: &[String]) -> ProbeResult {
        let dead = self.dead_datanodes(lines);
        match self.live_datanodes(lines) {
            Ok(live) => ProbeResult::new(Subsystem::Filesystem, live, self.expected)
                .with_problems(dead),
            Err(e) => {
                warn!("{}", e);
                let details = match e {
                    ClusterbotError::ParseAnomaly { details, .. } => details,
                    other => other.to_string(),
                };
                ProbeResult::new(Subsystem::Filesystem, 0, self.expected)
                    .with_problems(dead)
                    .with_anomaly(details)
            }
        }
    }
}
