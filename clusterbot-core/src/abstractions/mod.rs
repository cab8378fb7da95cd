//! Capabilities injected into the reporter
//!
//! Live and offline runs differ only in which implementations of these
//! traits are wired in, so no probe or reporter method branches on mode.

pub mod command;
pub mod notifier;
pub mod time;

pub use command::*;
pub use notifier::*;
pub use time::*;
