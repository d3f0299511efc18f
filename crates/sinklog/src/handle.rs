//! The swappable logger handle
//!
//! Every log call reads the handle once and writes through the logger it
//! got. Replacement installs a complete new [`Logger`]; readers see either
//! the old value or the new one, never a mix.

use parking_lot::RwLock;
use sinklog_core::{Fields, Level};
use std::io;
use std::sync::Arc;

use crate::logger::Logger;

#[derive(Debug)]
pub struct LoggerHandle {
    current: RwLock<Arc<Logger>>,
}

impl LoggerHandle {
    pub fn new(logger: Logger) -> Self {
        Self {
            current: RwLock::new(Arc::new(logger)),
        }
    }

    /// The logger installed right now
    pub fn load(&self) -> Arc<Logger> {
        Arc::clone(&self.current.read())
    }

    /// Replace the logger wholesale
    pub fn store(&self, logger: Logger) {
        *self.current.write() = Arc::new(logger);
    }

    /// Read-modify-replace under the write lock.
    ///
    /// `f` must not log through this handle.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&Logger) -> Logger,
    {
        let mut current = self.current.write();
        let next = f(&current);
        *current = Arc::new(next);
    }

    /// Attach fields to every later record; supplied values win on collision
    pub fn set_fields<F: Into<Fields>>(&self, fields: F) {
        let fields = fields.into();
        self.update(|logger| logger.with_fields(&fields));
    }

    pub fn log<F: Into<Fields>>(&self, level: Level, message: &str, fields: F) -> io::Result<()> {
        self.load().log(level, message, &fields.into())
    }

    pub fn log_err<F: Into<Fields>>(
        &self,
        level: Level,
        err: &dyn std::error::Error,
        message: &str,
        fields: F,
    ) -> io::Result<()> {
        self.load().log_err(level, err, message, &fields.into())
    }

    pub fn trace<F: Into<Fields>>(&self, message: &str, fields: F) {
        let _ = self.log(Level::Trace, message, fields);
    }

    pub fn debug<F: Into<Fields>>(&self, message: &str, fields: F) {
        let _ = self.log(Level::Debug, message, fields);
    }

    pub fn info<F: Into<Fields>>(&self, message: &str, fields: F) {
        let _ = self.log(Level::Info, message, fields);
    }

    pub fn warn<F: Into<Fields>>(&self, message: &str, fields: F) {
        let _ = self.log(Level::Warn, message, fields);
    }

    pub fn error<F: Into<Fields>>(&self, message: &str, fields: F) {
        let _ = self.log(Level::Error, message, fields);
    }

    pub fn warn_with_err<F: Into<Fields>>(
        &self,
        err: &dyn std::error::Error,
        message: &str,
        fields: F,
    ) {
        let _ = self.log_err(Level::Warn, err, message, fields);
    }

    pub fn error_with_err<F: Into<Fields>>(
        &self,
        err: &dyn std::error::Error,
        message: &str,
        fields: F,
    ) {
        let _ = self.log_err(Level::Error, err, message, fields);
    }

    /// Write a fatal record and exit with `exit_code`, whether or not the write succeeded
    pub fn fatal<F: Into<Fields>>(&self, message: &str, exit_code: i32, fields: F) -> ! {
        let _ = self.log(Level::Fatal, message, fields);
        std::process::exit(exit_code)
    }
}

impl Default for LoggerHandle {
    fn default() -> Self {
        Self::new(Logger::console())
    }
}
