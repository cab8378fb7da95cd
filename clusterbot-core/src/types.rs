//! Core types shared by probes, the report and the reporter

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ClusterbotError;

/// Glyph marking a subsystem at expected capacity
pub const OK_GLYPH: &str = ":white_check_mark:";
/// Glyph marking a degraded subsystem. The overall verdict greps for it.
pub const DEGRADED_GLYPH: &str = ":red_circle:";
/// Glyph marking a subsystem that was not selected for this run
pub const DISABLED_GLYPH: &str = ":white_circle:";

/// Default operator-declared capacity for every subsystem
pub const DEFAULT_EXPECTED: u32 = 9;

/// A monitored cluster facet.
///
/// Variants are declared in canonical report order; [`Subsystem::ALL`]
/// is the order lines appear in every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subsystem {
    /// Compute-node connectivity (ping)
    #[serde(rename = "executors", alias = "ping", alias = "connectivity")]
    Connectivity,
    /// JVM inventory on every host
    #[serde(rename = "jvm", alias = "jvms", alias = "instrumented-processes")]
    InstrumentedProcesses,
    /// YARN node managers
    #[serde(rename = "yarn", alias = "resource-manager")]
    ResourceManager,
    /// HDFS datanodes
    #[serde(rename = "hdfs", alias = "filesystem", alias = "filesystem-nodes")]
    Filesystem,
    /// Spark workers
    #[serde(rename = "spark", alias = "processing-workers")]
    ProcessingWorkers,
}

impl Subsystem {
    /// Every subsystem, in canonical report order
    pub const ALL: [Subsystem; 5] = [
        Subsystem::Connectivity,
        Subsystem::InstrumentedProcesses,
        Subsystem::ResourceManager,
        Subsystem::Filesystem,
        Subsystem::ProcessingWorkers,
    ];

    /// Stable identifier used on the command line, in config files and fixture names
    pub fn key(&self) -> &'static str {
        match self {
            Subsystem::Connectivity => "executors",
            Subsystem::InstrumentedProcesses => "jvm",
            Subsystem::ResourceManager => "yarn",
            Subsystem::Filesystem => "hdfs",
            Subsystem::ProcessingWorkers => "spark",
        }
    }

    /// Human label shown in the report
    pub fn label(&self) -> &'static str {
        match self {
            Subsystem::Connectivity => "Executors",
            Subsystem::InstrumentedProcesses => "JVMs",
            Subsystem::ResourceManager => "YARN",
            Subsystem::Filesystem => "HDFS",
            Subsystem::ProcessingWorkers => "Spark",
        }
    }

    /// What the `healthy/expected` fraction counts
    pub fn unit(&self) -> &'static str {
        match self {
            Subsystem::Connectivity => "hosts reachable",
            Subsystem::InstrumentedProcesses => "hosts healthy",
            Subsystem::ResourceManager => "slaves up",
            Subsystem::Filesystem => "datanodes live",
            Subsystem::ProcessingWorkers => "workers up",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Subsystem {
    type Err = ClusterbotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "executors" | "ping" | "connectivity" => Ok(Subsystem::Connectivity),
            "jvm" | "jvms" | "instrumented-processes" => Ok(Subsystem::InstrumentedProcesses),
            "yarn" | "resource-manager" => Ok(Subsystem::ResourceManager),
            "hdfs" | "filesystem" | "filesystem-nodes" => Ok(Subsystem::Filesystem),
            "spark" | "processing-workers" => Ok(Subsystem::ProcessingWorkers),
            other => Err(ClusterbotError::InvalidInput {
                field: "service".to_string(),
                message: format!(
                    "unknown service '{}', expected one of: executors, jvm, yarn, hdfs, spark",
                    other
                ),
            }),
        }
    }
}

/// Health classification of one subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Ok,
    Degraded,
}

impl Status {
    /// Exact match only: more healthy units than expected is also degraded.
    pub fn classify(healthy: u32, expected: u32) -> Self {
        if healthy == expected {
            Status::Ok
        } else {
            Status::Degraded
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Status::Ok => OK_GLYPH,
            Status::Degraded => DEGRADED_GLYPH,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Status::Degraded)
    }
}

/// Outcome of interpreting one subsystem's diagnostic text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub subsystem: Subsystem,
    /// Units observed healthy
    pub healthy: u32,
    /// Operator-declared capacity
    pub expected: u32,
    /// Explicit problem markers seen (dead nodes, unavailable JVMs)
    pub problems: u32,
    pub status: Status,
    /// Inspection command shown when degraded
    pub hint: Option<String>,
    /// Set when the diagnostic text was not what the probe expected
    pub anomaly: Option<String>,
}

impl ProbeResult {
    pub fn new(subsystem: Subsystem, healthy: u32, expected: u32) -> Self {
        Self {
            subsystem,
            healthy,
            expected,
            problems: 0,
            status: Status::classify(healthy, expected),
            hint: None,
            anomaly: None,
        }
    }

    /// Record explicit problem markers; any problem degrades the subsystem.
    pub fn with_problems(mut self, problems: u32) -> Self {
        self.problems = problems;
        self.reclassify();
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Flag unexpected diagnostic text. Always degrades the subsystem.
    pub fn with_anomaly(mut self, anomaly: impl Into<String>) -> Self {
        self.anomaly = Some(anomaly.into());
        self.reclassify();
        self
    }

    fn reclassify(&mut self) {
        self.status = if self.anomaly.is_some() || self.problems > 0 {
            Status::Degraded
        } else {
            Status::classify(self.healthy, self.expected)
        };
    }

    /// Status line, plus a hint line when degraded
    pub fn render(&self) -> String {
        let mut line = format!(
            "{} {} ({}/{} {})",
            self.status.glyph(),
            self.subsystem.label(),
            self.healthy,
            self.expected,
            self.subsystem.unit()
        );
        if let Some(anomaly) = &self.anomaly {
            line.push_str(&format!(" [{}]", anomaly));
        }
        if self.status.is_degraded() {
            if let Some(hint) = &self.hint {
                line.push_str(&format!("\n    > inspect with `{}`", hint));
            }
        }
        line
    }
}
