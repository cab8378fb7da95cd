pub mod abstractions;
pub mod config;
pub mod error;
pub mod logging;
pub mod probes;
pub mod report;
pub mod reporter;
pub mod types;

pub use config::{Config, ConfigBuilder};
pub use error::{ClusterbotError, ClusterbotResult};
pub use report::{Overall, Report, ReportEntry};
pub use reporter::Reporter;
pub use types::{ProbeResult, Status, Subsystem};
