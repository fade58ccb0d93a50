//! Startup errors.
//!
//! Anything here ends the process with status 1. Failures while the console
//! runs are [`AgentError`]s, printed and survived by the shell.

use thiserror::Error;

use crate::subsystems::agents::AgentError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    /// The agent could not be built, or its generation provider did not
    /// answer the startup ping.
    #[error("cannot start: {0}")]
    Startup(#[from] AgentError),

    /// Console I/O.
    #[error("console io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_provider_is_a_startup_error() {
        let e: AppError = AgentError::ProviderUnavailable("ollama: connection refused".into()).into();
        assert!(matches!(e, AppError::Startup(_)));
        assert_eq!(e.to_string(), "cannot start: provider unavailable: ollama: connection refused");
    }

    #[test]
    fn console_write_failure_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed");
        let e: AppError = io_err.into();
        assert_eq!(e.to_string(), "console io error: stdout closed");
    }
}
