pub mod runner;

pub use runner::{run, RunOptions};

// Re-export commonly used types
pub use clusterbot_core::{
    ClusterbotError, ClusterbotResult, Config, Overall, Report, Reporter, Subsystem,
};
