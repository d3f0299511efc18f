//! Constants and default values for sinklog

/// Default key under which the project name is attached to every record
pub const DEFAULT_PROJECT_KEY: &str = "project";

/// Default log file path, relative to the working directory
pub const DEFAULT_LOG_PATH: &str = "logs/app.log";

/// Default maximum log file size in bytes (10MB)
pub const DEFAULT_MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Default interval between log size checks in milliseconds
pub const DEFAULT_MONITOR_INTERVAL_MS: u64 = 60_000;

/// Timestamp layout of the `time` field
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp layout used by the console sink
pub const CONSOLE_TIME_FORMAT: &str = "%H:%M:%S";

/// Record field names
pub const LEVEL_FIELD: &str = "level";
pub const TIME_FIELD: &str = "time";
pub const MESSAGE_FIELD: &str = "message";
pub const ERROR_FIELD: &str = "error";

/// Field names every record carries or may carry on its own
pub const RESERVED_FIELDS: [&str; 4] = [LEVEL_FIELD, TIME_FIELD, MESSAGE_FIELD, ERROR_FIELD];

/// Exit code used when the logging subsystem cannot establish its sinks
pub const FATAL_EXIT_CODE: i32 = 1;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "SINKLOG_CONFIG";

/// Default config file names to search for (in priority order)
pub const CONFIG_FILES: &[&str] = &[
    "sinklog.toml",
    "sinklog.yaml",
    "sinklog.yml",
    "sinklog.json",
];
