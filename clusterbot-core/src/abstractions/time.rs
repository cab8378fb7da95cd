//! Clock abstraction for report timestamps
//!
//! Offline runs must render byte-identical reports, so the wall clock is
//! injected and replaced by a fixed sentinel when running against fixtures.

/// Sentinel timestamp used by offline runs
pub const OFFLINE_TIMESTAMP: &str = "offline";

/// Source of the run identifier printed in the report header
pub trait Clock: Send + Sync {
    fn timestamp(&self) -> String;
}

/// Production clock using local wall-clock time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn timestamp(&self) -> String {
        // ctime layout, e.g. "Fri Oct 16 09:30:00 2026"
        chrono::Local::now().format("%a %b %e %H:%M:%S %Y").to_string()
    }
}

/// Clock that always reports the same value
#[derive(Debug, Clone)]
pub struct FixedClock {
    value: String,
}

impl FixedClock {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn offline() -> Self {
        Self::new(OFFLINE_TIMESTAMP)
    }
}

impl Clock for FixedClock {
    fn timestamp(&self) -> String {
        self.value.clone()
    }
}
