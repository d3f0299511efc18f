//! Immutable logger values
//!
//! A `Logger` pairs a [`SinkSet`] with the fields attached to every record.
//! It is never mutated once built: attaching fields or swapping the file
//! produces a new value that the [`LoggerHandle`](crate::LoggerHandle)
//! installs as a whole.

use sinklog_core::{error_chain, Fields, Level};
use std::io;

use crate::format::Record;
use crate::sink::{ConsoleSink, SinkSet};

#[derive(Debug, Clone, Default)]
pub struct Logger {
    sinks: SinkSet,
    fields: Fields,
    min_level: Level,
}

impl Logger {
    pub fn new(sinks: SinkSet) -> Self {
        Self {
            sinks,
            fields: Fields::new(),
            min_level: Level::Trace,
        }
    }

    /// Console-only logger used before initialization
    pub fn console() -> Self {
        Self::new(SinkSet::new().with_console(ConsoleSink::default()))
    }

    /// A copy carrying the union of the current and supplied fields
    pub fn with_fields(&self, fields: &Fields) -> Logger {
        Logger {
            sinks: self.sinks.clone(),
            fields: self.fields.merged(fields),
            min_level: self.min_level,
        }
    }

    /// A copy writing to `sinks`, keeping attached fields
    pub fn with_sinks(&self, sinks: SinkSet) -> Logger {
        Logger {
            sinks,
            fields: self.fields.clone(),
            min_level: self.min_level,
        }
    }

    pub fn with_min_level(&self, min_level: Level) -> Logger {
        Logger {
            sinks: self.sinks.clone(),
            fields: self.fields.clone(),
            min_level,
        }
    }

    pub fn sinks(&self) -> &SinkSet {
        &self.sinks
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    /// Write one record; call-site `fields` win over attached ones
    pub fn log(&self, level: Level, message: &str, fields: &Fields) -> io::Result<()> {
        if !self.enabled(level) {
            return Ok(());
        }
        let record = Record::new(level, message, &self.fields, fields);
        self.sinks.write_record(&record)
    }

    /// Write one record with `err` and its causes attached as the `error` field
    pub fn log_err(
        &self,
        level: Level,
        err: &dyn std::error::Error,
        message: &str,
        fields: &Fields,
    ) -> io::Result<()> {
        if !self.enabled(level) {
            return Ok(());
        }
        let record =
            Record::new(level, message, &self.fields, fields).with_error(&error_chain(err));
        self.sinks.write_record(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use sinklog_core::fields;
    use std::sync::Arc;

    fn memory_logger() -> (Logger, Arc<MemorySink>) {
        let memory = Arc::new(MemorySink::new());
        let logger = Logger::new(SinkSet::new().with_sink(memory.clone()));
        (logger, memory)
    }

    #[test]
    fn test_with_fields_is_a_new_value() {
        let (base, memory) = memory_logger();
        let base = base.with_fields(&fields! { "project" => "billing" });
        let child = base.with_fields(&fields! { "user" => "alice" });

        assert_eq!(base.fields().len(), 1);
        assert_eq!(child.fields().len(), 2);

        child.log(Level::Info, "hi", &Fields::new()).unwrap();
        let record = &memory.records()[0];
        assert_eq!(record["project"], "billing");
        assert_eq!(record["user"], "alice");
    }

    #[test]
    fn test_min_level_filters() {
        let (logger, memory) = memory_logger();
        let logger = logger.with_min_level(Level::Warn);

        logger.log(Level::Info, "dropped", &Fields::new()).unwrap();
        logger.log(Level::Error, "kept", &Fields::new()).unwrap();

        let records = memory.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["message"], "kept");
    }

    #[test]
    fn test_log_err_attaches_error() {
        let (logger, memory) = memory_logger();
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");

        logger
            .log_err(Level::Warn, &err, "lookup failed", &fields! { "path" => "/x" })
            .unwrap();

        let record = &memory.records()[0];
        assert_eq!(record["level"], "warn");
        assert_eq!(record["error"], "no such file");
        assert_eq!(record["path"], "/x");
        assert_eq!(record["message"], "lookup failed");
    }

    #[test]
    fn test_log_err_includes_causes() {
        let (logger, memory) = memory_logger();
        let err = sinklog_core::Error::Truncate {
            path: "/var/log/app.log".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        logger
            .log_err(Level::Error, &err, "truncate failed", &Fields::new())
            .unwrap();

        assert_eq!(
            memory.records()[0]["error"],
            "Error truncating log file /var/log/app.log: denied"
        );
    }

    #[test]
    fn test_with_sinks_keeps_fields() {
        let (logger, _) = memory_logger();
        let logger = logger.with_fields(&fields! { "k" => "v" });
        let (other, memory) = memory_logger();

        let moved = logger.with_sinks(other.sinks().clone());
        moved.log(Level::Debug, "moved", &Fields::new()).unwrap();
        assert_eq!(memory.records()[0]["k"], "v");
    }
}
