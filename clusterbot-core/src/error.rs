use thiserror::Error;

use crate::types::Subsystem;

#[derive(Error, Debug)]
pub enum ClusterbotError {
    #[error("Probe for {subsystem} failed to execute `{command}`: {details}")]
    ProbeExecution {
        subsystem: Subsystem,
        command: String,
        details: String,
    },

    #[error("Unexpected diagnostic output for {subsystem}: {details}")]
    ParseAnomaly { subsystem: Subsystem, details: String },

    #[error("Failed to deliver report to {endpoint}: {details}")]
    Delivery { endpoint: String, details: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input for {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("Probes failed to execute: {subsystems}")]
    ProbesFailed { subsystems: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type ClusterbotResult<T> = std::result::Result<T, ClusterbotError>;

impl ClusterbotError {
    /// True when the report was built but could not reach the webhook
    pub fn is_delivery_failure(&self) -> bool {
        matches!(self, ClusterbotError::Delivery { .. })
    }

    /// Subsystem the error is attributed to, if any
    pub fn subsystem(&self) -> Option<Subsystem> {
        match self {
            ClusterbotError::ProbeExecution { subsystem, .. }
            | ClusterbotError::ParseAnomaly { subsystem, .. } => Some(*subsystem),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ClusterbotError {
    fn from(err: toml::de::Error) -> Self {
        ClusterbotError::ConfigError(format!("Failed to parse TOML: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_execution_message_names_command() {
        let err = ClusterbotError::ProbeExecution {
            subsystem: Subsystem::ResourceManager,
            command: "yarn node -list -all".to_string(),
            details: "exit status 127 with no output".to_string(),
        };

        let message = err.to_string();
        assert!(message.contains("yarn"));
        assert!(message.contains("yarn node -list -all"));
        assert_eq!(err.subsystem(), Some(Subsystem::ResourceManager));
        assert!(!err.is_delivery_failure());
    }

    #[test]
    fn test_delivery_failure_detection() {
        let err = ClusterbotError::Delivery {
            endpoint: "https://hooks.example.com/T000".to_string(),
            details: "connection refused".to_string(),
        };
        assert!(err.is_delivery_failure());
        assert_eq!(err.subsystem(), None);
    }
}
