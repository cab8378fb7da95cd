//! Report assembly
//!
//! A [`ReportBuilder`] collects one entry per subsystem in whatever order
//! probes finish. [`ReportBuilder::finish`] fills in anything missing, sorts
//! into canonical order and computes the verdict once, yielding an immutable
//! [`Report`].

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::types::{ProbeResult, Status, Subsystem, DEGRADED_GLYPH, DISABLED_GLYPH};

/// Header separator, fixed width
pub const SEPARATOR: &str = "--------------------";

/// Display name used when any enabled subsystem is degraded
pub const PROBLEM_DISPLAY_NAME: &str = "Problem(s) happened!";
/// Display name used when everything enabled is at capacity
pub const ALRIGHT_DISPLAY_NAME: &str = "Cluster alright!";

/// One subsystem's contribution to a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEntry {
    /// Probe ran and interpreted its output
    Probed(ProbeResult),
    /// Probe could not obtain diagnostic text
    Failed {
        subsystem: Subsystem,
        command: String,
        reason: String,
    },
    /// Probe was still running when the deadline passed
    Incomplete { subsystem: Subsystem, after: Duration },
    /// Subsystem not selected for this run
    Disabled(Subsystem),
}

impl ReportEntry {
    pub fn subsystem(&self) -> Subsystem {
        match self {
            ReportEntry::Probed(result) => result.subsystem,
            ReportEntry::Failed { subsystem, .. }
            | ReportEntry::Incomplete { subsystem, .. }
            | ReportEntry::Disabled(subsystem) => *subsystem,
        }
    }

    /// `None` for disabled subsystems; they carry no health signal
    pub fn status(&self) -> Option<Status> {
        match self {
            ReportEntry::Probed(result) => Some(result.status),
            ReportEntry::Failed { .. } | ReportEntry::Incomplete { .. } => Some(Status::Degraded),
            ReportEntry::Disabled(_) => None,
        }
    }

    pub fn render(&self) -> String {
        match self {
            ReportEntry::Probed(result) => result.render(),
            ReportEntry::Failed {
                subsystem,
                command,
                reason,
            } => format!(
                "{} {} (probe failed to execute: {})\n    > reproduce with `{}`",
                DEGRADED_GLYPH,
                subsystem.label(),
                reason,
                command
            ),
            ReportEntry::Incomplete { subsystem, after } => format!(
                "{} {} (incomplete: no answer after {}s)",
                DEGRADED_GLYPH,
                subsystem.label(),
                after.as_secs()
            ),
            ReportEntry::Disabled(subsystem) => {
                format!("{} {} (disabled)", DISABLED_GLYPH, subsystem.label())
            }
        }
    }
}

/// Overall verdict of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overall {
    Alright,
    Problem,
}

impl Overall {
    /// OR-reduction over the statuses of enabled subsystems
    pub fn from_statuses<I: IntoIterator<Item = Status>>(statuses: I) -> Self {
        if statuses.into_iter().any(|status| status.is_degraded()) {
            Overall::Problem
        } else {
            Overall::Alright
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Overall::Alright => ALRIGHT_DISPLAY_NAME,
            Overall::Problem => PROBLEM_DISPLAY_NAME,
        }
    }
}

impl fmt::Display for Overall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Overall::Alright => f.write_str("alright"),
            Overall::Problem => f.write_str("problem"),
        }
    }
}

/// A report under construction
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    timestamp: String,
    entries: BTreeMap<Subsystem, ReportEntry>,
}

impl ReportBuilder {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Record an entry; a later entry for the same subsystem replaces the earlier one
    pub fn record(&mut self, entry: ReportEntry) -> &mut Self {
        self.entries.insert(entry.subsystem(), entry);
        self
    }

    /// Finalize: unvisited subsystems are reported incomplete so the verdict never understates a problem
    pub fn finish(mut self) -> Report {
        for subsystem in Subsystem::ALL {
            self.entries
                .entry(subsystem)
                .or_insert(ReportEntry::Incomplete {
                    subsystem,
                    after: Duration::ZERO,
                });
        }

        // BTreeMap iteration follows the enum declaration order, which is canonical
        let entries: Vec<ReportEntry> = self.entries.into_values().collect();
        let overall = Overall::from_statuses(entries.iter().filter_map(ReportEntry::status));
        let mut text = format!("Cluster report ({})\n{}\n", self.timestamp, SEPARATOR);
        for entry in &entries {
            text.push_str(&entry.render());
            text.push('\n');
        }

        Report {
            timestamp: self.timestamp,
            entries,
            overall,
            text,
        }
    }
}

/// A finalized report, ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    timestamp: String,
    entries: Vec<ReportEntry>,
    overall: Overall,
    text: String,
}

impl Report {
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Entries in canonical order, one per subsystem
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn entry(&self, subsystem: Subsystem) -> Option<&ReportEntry> {
        self.entries.iter().find(|entry| entry.subsystem() == subsystem)
    }

    pub fn overall(&self) -> Overall {
        self.overall
    }

    pub fn display_name(&self) -> &'static str {
        self.overall.display_name()
    }

    /// Full message body
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Subsystems whose probe could not run
    pub fn failed_subsystems(&self) -> Vec<Subsystem> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                ReportEntry::Failed { subsystem, .. } => Some(*subsystem),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn all_disabled() -> ReportBuilder {
        let mut builder = ReportBuilder::new("offline");
        for subsystem in Subsystem::ALL {
            builder.record(ReportEntry::Disabled(subsystem));
        }
        builder
    }

    #[test]
    fn test_all_disabled_report_is_alright() {
        let report = all_disabled().finish();
        assert_eq!(report.overall(), Overall::Alright);
        assert_eq!(report.display_name(), "Cluster alright!");
        assert_eq!(
            report.text(),
            "Cluster report (offline)\n\
             --------------------\n\
             :white_circle: Executors (disabled)\n\
             :white_circle: JVMs (disabled)\n\
             :white_circle: YARN (disabled)\n\
             :white_circle: HDFS (disabled)\n\
             :white_circle: Spark (disabled)\n"
        );
    }

    #[test]
    fn test_recording_order_does_not_change_output() {
        let mut forward = ReportBuilder::new("t");
        let mut backward = ReportBuilder::new("t");
        for subsystem in Subsystem::ALL {
            forward.record(ReportEntry::Probed(ProbeResult::new(subsystem, 9, 9)));
        }
        for subsystem in Subsystem::ALL.iter().rev() {
            backward.record(ReportEntry::Probed(ProbeResult::new(*subsystem, 9, 9)));
        }
        assert_eq!(forward.finish().text(), backward.finish().text());
    }

    #[test]
    fn test_single_degraded_entry_flags_problem() {
        let mut builder = all_disabled();
        builder.record(ReportEntry::Probed(ProbeResult::new(
            Subsystem::ResourceManager,
            8,
            9,
        )));
        let report = builder.finish();
        assert_eq!(report.overall(), Overall::Problem);
        assert_eq!(report.display_name(), "Problem(s) happened!");
        assert!(report.text().contains(":red_circle: YARN (8/9 slaves up)"));
    }

    #[test]
    fn test_failed_and_incomplete_are_degraded() {
        let mut builder = all_disabled();
        builder.record(ReportEntry::Failed {
            subsystem: Subsystem::Filesystem,
            command: "hdfs dfsadmin -report".to_string(),
            reason: "fixture missing".to_string(),
        });
        builder.record(ReportEntry::Incomplete {
            subsystem: Subsystem::ProcessingWorkers,
            after: Duration::from_secs(120),
        });
        let report = builder.finish();

        assert_eq!(report.overall(), Overall::Problem);
        assert_eq!(report.failed_subsystems(), vec![Subsystem::Filesystem]);
        assert!(report
            .text()
            .contains(":red_circle: HDFS (probe failed to execute: fixture missing)"));
        assert!(report
            .text()
            .contains(":red_circle: Spark (incomplete: no answer after 120s)"));
    }

    #[test]
    fn test_unvisited_subsystems_become_incomplete() {
        let report = ReportBuilder::new("t").finish();
        assert_eq!(report.entries().len(), Subsystem::ALL.len());
        assert_eq!(report.overall(), Overall::Problem);
    }

    #[test]
    fn test_verdict_matches_glyph_scan() {
        let mut builder = all_disabled();
        builder.record(ReportEntry::Probed(ProbeResult::new(Subsystem::Connectivity, 9, 9)));
        let report = builder.finish();
        assert_eq!(
            report.text().contains(DEGRADED_GLYPH),
            report.overall() == Overall::Problem
        );
    }
}
