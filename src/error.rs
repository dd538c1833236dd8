//! Error types for the GC individual tests wrapper

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for wrapper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the wrapper
#[derive(Error, Debug)]
pub enum Error {
    /// A command line or CLI input was malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A process exited outside its success set after all retries.
    #[error("Command '{cmdline}' failed with exit code {}", display_code(.exit_code))]
    ProcessFailed {
        /// Exit code of the last attempt (None if the child was killed by a signal)
        exit_code: Option<i32>,
        /// Quoted command line that was executed
        cmdline: String,
    },

    /// A process could not be started at all.
    #[error("Failed to start '{cmdline}': {source}")]
    Spawn {
        cmdline: String,
        #[source]
        source: io::Error,
    },

    /// A test result file could not be parsed.
    #[error("Malformed test report {path}: {reason}")]
    MalformedReport { path: PathBuf, reason: String },

    /// An expected test result file does not exist.
    #[error("Test result file not found: {0}")]
    MissingResultFile(PathBuf),

    /// Configuration file error or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The logging backend could not be set up.
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Other error with custom message.
    #[error("{0}")]
    Other(String),
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "<terminated by signal>".to_string(),
    }
}

impl Error {
    /// Whether this error describes a test binary that ran (or tried to run) and did not pass.
    ///
    /// Re-run stages record these as reproducibility data instead of aborting.
    pub fn is_test_failure(&self) -> bool {
        matches!(self, Error::ProcessFailed { .. } | Error::Spawn { .. })
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingResultFile(PathBuf::from("/tmp/GC.testResults.xml"));
        assert_eq!(
            err.to_string(),
            "Test result file not found: /tmp/GC.testResults.xml"
        );
    }

    #[test]
    fn test_process_failed_display() {
        let err = Error::ProcessFailed {
            exit_code: Some(3),
            cmdline: "git pull".to_string(),
        };
        assert_eq!(err.to_string(), "Command 'git pull' failed with exit code 3");

        let err = Error::ProcessFailed {
            exit_code: None,
            cmdline: "git pull".to_string(),
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_error_from_string() {
        let err: Error = "custom error".into();
        assert_eq!(err.to_string(), "custom error");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_test_failure());
    }

    #[test]
    fn test_is_test_failure() {
        let err = Error::Spawn {
            cmdline: "missing.cmd".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.is_test_failure());
        assert!(!Error::InvalidArgument("empty".to_string()).is_test_failure());
    }
}
