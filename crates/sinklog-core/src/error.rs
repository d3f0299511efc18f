//! Error types for sinklog

use std::path::PathBuf;

use crate::constants::FATAL_EXIT_CODE;

/// sinklog error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    #[error("Error creating log directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error opening log file {path}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error getting file info for {path}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error closing log file {path}")]
    Close {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error truncating log file {path}")]
    Truncate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Log file already closed: {0}")]
    FileClosed(PathBuf),

    #[error("IO error")]
    IoError(#[from] std::io::Error),

    #[error("JSON error")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parse error")]
    YamlError(#[from] serde_yaml::Error),
}

/// Result type alias for sinklog
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::ConfigError(msg.into())
    }
}

/// `err` followed by each of its sources, joined with `": "`
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// An unrecoverable logging failure.
///
/// Raised when the subsystem cannot establish or re-establish its file sink.
/// The embedding program decides how to terminate; the process-wide facade
/// calls [`FatalError::exit`].
#[derive(Debug, thiserror::Error)]
#[error("{context}")]
pub struct FatalError {
    context: String,
    #[source]
    source: Error,
}

impl FatalError {
    pub fn new<S: Into<String>>(context: S, source: Error) -> Self {
        Self {
            context: context.into(),
            source,
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn error(&self) -> &Error {
        &self.source
    }

    pub fn exit_code(&self) -> i32 {
        FATAL_EXIT_CODE
    }

    /// Print to stderr and terminate the process.
    pub fn exit(&self) -> ! {
        eprintln!("sinklog: fatal: {}", error_chain(self));
        std::process::exit(self.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::FileClosed(PathBuf::from("/tmp/app.log"));
        assert_eq!(err.to_string(), "Log file already closed: /tmp/app.log");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::IoError(_)));
    }

    #[test]
    fn test_fatal_error_wraps_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let fatal = FatalError::new(
            "Error opening log file",
            Error::OpenFile {
                path: PathBuf::from("/root/x.log"),
                source: io_err,
            },
        );

        assert_eq!(fatal.exit_code(), 1);
        assert_eq!(fatal.to_string(), "Error opening log file");
        assert!(matches!(fatal.error(), Error::OpenFile { .. }));
        assert!(std::error::Error::source(&fatal).is_some());
    }

    #[test]
    fn test_error_chain_names_each_cause_once() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "Not a directory");
        let fatal = FatalError::new(
            "Error opening log file",
            Error::OpenFile {
                path: PathBuf::from("/tmp/blocker/app.log"),
                source: io_err,
            },
        );

        let chain = error_chain(&fatal);
        assert_eq!(
            chain,
            "Error opening log file: Error opening log file /tmp/blocker/app.log: Not a directory"
        );
        assert_eq!(chain.matches("Not a directory").count(), 1);
    }
}
