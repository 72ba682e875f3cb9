use gitea_sonarqube_bot_core::errors::BotError;
use std::process::{ExitCode, Termination};
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that stop the server from starting or serving
#[derive(Error, Debug)]
pub enum ServerError {
    /// The configuration file or a referenced secret file cannot be loaded
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The configuration was loaded but describes an unusable bot
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] BotError),

    /// Telemetry could not be set up
    #[error("Telemetry error: {0}")]
    TelemetryError(String),

    /// The listener could not be bound or the server stopped unexpectedly
    #[error("Network error: {0}")]
    NetworkError(String),
}

impl Termination for ServerError {
    fn report(self) -> ExitCode {
        match self {
            ServerError::ConfigError(_) => ExitCode::from(2),
            ServerError::InvalidConfiguration(_) => ExitCode::from(2),
            ServerError::TelemetryError(_) => ExitCode::from(3),
            ServerError::NetworkError(_) => ExitCode::from(4),
        }
    }
}
