//! Log setup for the console app.
//!
//! stdout belongs to the REPL, so log lines go to stderr or, when
//! `agent.log_file` is set, to that file. The level comes from
//! [`LogLevel::resolve`]: a command-line flag is forced and ignores
//! `RUST_LOG`; otherwise `RUST_LOG` wins over the configured level.

use std::fs::OpenOptions;
use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::AppError;

/// Effective log level and whether it came from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLevel {
    pub level: String,
    pub forced: bool,
}

impl LogLevel {
    /// `--debug` beats `-v…`, which beats `configured`.
    ///
    /// Each `-v` raises one tier: `-v` warn, `-vv` info, `-vvv` debug,
    /// `-vvvv` and beyond trace.
    pub fn resolve(debug: bool, verbosity: u8, configured: &str) -> Self {
        let flag = if debug {
            Some("debug")
        } else {
            match verbosity {
                0 => None,
                1 => Some("warn"),
                2 => Some("info"),
                3 => Some("debug"),
                _ => Some("trace"),
            }
        };
        match flag {
            Some(level) => Self { level: level.to_string(), forced: true },
            None => Self { level: configured.to_string(), forced: false },
        }
    }

    fn filter(&self) -> Result<EnvFilter, AppError> {
        let invalid = |e: ParseError| AppError::Logger(format!("invalid log level '{}': {e}", self.level));
        if self.forced {
            EnvFilter::try_new(&self.level).map_err(invalid)
        } else {
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&self.level))
                .map_err(invalid)
        }
    }
}

/// Log destination: the file when given (appended, created if missing),
/// stderr otherwise. ANSI colour only makes sense on the terminal.
fn writer(log_file: Option<&Path>) -> Result<(BoxMakeWriter, bool), AppError> {
    let Some(path) = log_file else {
        return Ok((BoxMakeWriter::new(std::io::stderr), true));
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::Logger(format!("cannot open log file {}: {e}", path.display())))?;
    Ok((BoxMakeWriter::new(file), false))
}

/// Install the global subscriber. Call once, after config is resolved.
pub fn init(level: &LogLevel, log_file: Option<&Path>) -> Result<(), AppError> {
    let filter = level.filter()?;
    let (writer, ansi) = writer(log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn flags_override_configured_level() {
        assert_eq!(LogLevel::resolve(false, 0, "info"), LogLevel { level: "info".into(), forced: false });
        assert_eq!(LogLevel::resolve(false, 1, "info").level, "warn");
        assert_eq!(LogLevel::resolve(false, 3, "info").level, "debug");
        assert_eq!(LogLevel::resolve(false, 9, "info").level, "trace");
        assert!(LogLevel::resolve(false, 2, "warn").forced);
    }

    #[test]
    fn debug_flag_beats_verbosity() {
        let level = LogLevel::resolve(true, 4, "error");
        assert_eq!(level.level, "debug");
        assert!(level.forced);
    }

    #[test]
    fn forced_level_must_parse() {
        let bad = LogLevel { level: "agent=loudest".into(), forced: true };
        assert!(matches!(bad.filter(), Err(AppError::Logger(_))));
        assert!(LogLevel::resolve(false, 4, "info").filter().is_ok());
    }

    #[test]
    fn log_file_is_created_without_colour() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent.log");
        let (_, ansi) = writer(Some(&path)).unwrap();
        assert!(!ansi);
        assert!(path.exists());
    }

    #[test]
    fn unwritable_log_file_is_a_logger_error() {
        let err = writer(Some(Path::new("/nonexistent/dir/agent.log"))).err().unwrap();
        assert!(err.to_string().contains("cannot open log file"));
    }

    #[test]
    fn stderr_keeps_colour() {
        let (_, ansi) = writer(None).unwrap();
        assert!(ansi);
    }
}
