//! sinklog - Structured logging to console and file with size-based truncation
//!
//! Embedders that want their own lifecycle start a [`LogService`] and log
//! through its [`LoggerHandle`]. The free functions in this module drive one
//! process-wide handle that starts out as a console-only logger and is
//! reconfigured by [`init`].
//!
//! ```no_run
//! use sinklog::{fields, Config};
//!
//! sinklog::init(Config::file("logs/app.log").with_project("project", "billing"));
//! sinklog::set_field(fields! { "user" => "alice" });
//! sinklog::info("request handled", fields! { "status" => 200 });
//! sinklog::shutdown();
//! ```

pub mod buffer;
pub mod format;
pub mod handle;
pub mod logger;
pub mod monitor;
pub mod service;
pub mod sink;

pub use buffer::LogBuffer;
pub use format::Record;
pub use handle::LoggerHandle;
pub use logger::Logger;
pub use monitor::{FatalHook, MonitorState, TickOutcome};
pub use service::{exit_on_fatal, LogService, LogServiceBuilder};
pub use sink::{ConsoleSink, LogFile, MemorySink, Sink, SinkSet};

pub use sinklog_core::{
    fields, Config, Error, FatalError, Fields, Level, LogEntry, Result, RotationErrorPolicy,
    Value,
};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

static GLOBAL: Lazy<Arc<LoggerHandle>> = Lazy::new(|| Arc::new(LoggerHandle::default()));

static SERVICE: Lazy<Mutex<Option<LogService>>> = Lazy::new(|| Mutex::new(None));

static BUFFER: Lazy<LogBuffer> = Lazy::new(|| LogBuffer::new(Arc::clone(&GLOBAL)));

/// The process-wide handle
pub fn global() -> &'static Arc<LoggerHandle> {
    &GLOBAL
}

/// The process-wide buffer, writing through [`global`]
pub fn buffer() -> &'static LogBuffer {
    &BUFFER
}

/// Configure the process-wide logger, exiting with code 1 on failure
pub fn init(config: Config) {
    if let Err(fatal) = try_init(config) {
        fatal.exit();
    }
}

/// Configure the process-wide logger, replacing any earlier configuration.
///
/// The previous service is shut down first, so its file is closed and its
/// monitor stopped before the new file is opened.
pub fn try_init(config: Config) -> std::result::Result<(), FatalError> {
    let mut service = SERVICE.lock();
    if let Some(previous) = service.take() {
        previous.shutdown();
    }

    *service = Some(
        LogService::builder(config)
            .handle(Arc::clone(&GLOBAL))
            .start()?,
    );
    Ok(())
}

/// Shut down the process-wide service, if one was started
pub fn shutdown() {
    let previous = SERVICE.lock().take();
    if let Some(previous) = previous {
        previous.shutdown();
    }
}

/// Attach fields to every later record from the process-wide logger
pub fn set_field<F: Into<Fields>>(fields: F) {
    GLOBAL.set_fields(fields);
}

pub fn log<F: Into<Fields>>(level: Level, message: &str, fields: F) -> io::Result<()> {
    GLOBAL.log(level, message, fields)
}

pub fn trace<F: Into<Fields>>(message: &str, fields: F) {
    GLOBAL.trace(message, fields);
}

pub fn debug<F: Into<Fields>>(message: &str, fields: F) {
    GLOBAL.debug(message, fields);
}

pub fn info<F: Into<Fields>>(message: &str, fields: F) {
    GLOBAL.info(message, fields);
}

pub fn warn<F: Into<Fields>>(message: &str, fields: F) {
    GLOBAL.warn(message, fields);
}

pub fn error<F: Into<Fields>>(message: &str, fields: F) {
    GLOBAL.error(message, fields);
}

pub fn warn_with_err<F: Into<Fields>>(err: &dyn std::error::Error, message: &str, fields: F) {
    GLOBAL.warn_with_err(err, message, fields);
}

pub fn error_with_err<F: Into<Fields>>(err: &dyn std::error::Error, message: &str, fields: F) {
    GLOBAL.error_with_err(err, message, fields);
}

/// Write a fatal record and exit the process with `exit_code`
pub fn fatal<F: Into<Fields>>(message: &str, exit_code: i32, fields: F) -> ! {
    GLOBAL.fatal(message, exit_code, fields)
}
