//! Log service lifecycle
//!
//! A [`LogService`] owns one logger handle, the slot holding the active log
//! file, and the size monitor. Starting it installs a fresh logger into the
//! handle; shutting it down stops the monitor and closes the file.

use parking_lot::Mutex;
use sinklog_core::{Config, Error, FatalError, Fields};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::handle::LoggerHandle;
use crate::logger::Logger;
use crate::monitor::{FatalHook, FileSlot, Monitor, MonitorState, Rotator, TickOutcome};
use crate::sink::{self, ConsoleSink, LogFile, Sink, SinkSet};

/// Hook installed when none is given: print and exit with the error's code
pub fn exit_on_fatal() -> FatalHook {
    Arc::new(|fatal: FatalError| fatal.exit())
}

/// Options for [`LogService::start`] beyond the config itself
pub struct LogServiceBuilder {
    config: Config,
    handle: Option<Arc<LoggerHandle>>,
    sinks: Vec<Arc<dyn Sink>>,
    on_fatal: Option<FatalHook>,
}

impl LogServiceBuilder {
    /// Install into an existing handle instead of a new one
    pub fn handle(mut self, handle: Arc<LoggerHandle>) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Write every record to `sink` as well, after console and file
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Called with fatal errors raised on the monitor thread
    pub fn on_fatal(mut self, hook: FatalHook) -> Self {
        self.on_fatal = Some(hook);
        self
    }

    pub fn start(self) -> Result<LogService, FatalError> {
        let config = self.config;
        config
            .validate()
            .map_err(|e| FatalError::new("Invalid logger configuration", e))?;

        let mut sinks = SinkSet::new();
        if config.enable_console_output {
            sinks = sinks.with_console(ConsoleSink::new(config.console_color));
        }

        let mut file = None;
        if config.enable_file_output {
            sink::ensure_parent_dir(&config.log_path)
                .map_err(|e| FatalError::new("Failed to validate log path", e))?;
            let opened = LogFile::open(&config.log_path)
                .map_err(|e| FatalError::new("Error opening log file", e))?;
            let opened = Arc::new(opened);
            sinks = sinks.with_file(Arc::clone(&opened));
            file = Some(opened);
        }

        for extra in self.sinks {
            sinks = sinks.with_sink(extra);
        }

        let logger = Logger::new(sinks)
            .with_min_level(config.level)
            .with_fields(&Fields::new().with(
                config.project_key.clone(),
                config.project_name.clone(),
            ));

        let handle = self.handle.unwrap_or_default();
        let config = Arc::new(config);
        let slot: FileSlot = Arc::new(Mutex::new(file));
        let rotator = Arc::new(Rotator::new(
            Arc::clone(&config),
            Arc::clone(&handle),
            Arc::clone(&slot),
        ));

        let on_fatal = self.on_fatal.unwrap_or_else(exit_on_fatal);
        let monitor = install(&handle, &slot, logger, || {
            if !config.monitor_enabled() {
                return Ok(None);
            }
            Monitor::spawn(Arc::clone(&rotator), config.monitor_interval(), on_fatal).map(Some)
        })?;

        info!(
            "Logger started (console: {}, file: {})",
            config.enable_console_output,
            if config.enable_file_output {
                config.log_path.display().to_string()
            } else {
                "off".to_string()
            }
        );

        Ok(LogService {
            config,
            handle,
            slot,
            rotator,
            monitor: Mutex::new(monitor),
            shut_down: AtomicBool::new(false),
        })
    }
}

/// Spawn the monitor, then install `logger` into `handle`.
///
/// The slot stays locked throughout, so the monitor's first check waits for
/// the new logger. If the spawn fails, the handle is left as it was and the
/// newly opened file is closed.
fn install<F>(
    handle: &LoggerHandle,
    slot: &FileSlot,
    logger: Logger,
    spawn: F,
) -> Result<Option<Monitor>, FatalError>
where
    F: FnOnce() -> std::io::Result<Option<Monitor>>,
{
    let mut guard = slot.lock();
    match spawn() {
        Ok(monitor) => {
            handle.store(logger);
            Ok(monitor)
        }
        Err(e) => {
            if let Some(file) = guard.take() {
                let _ = file.close();
            }
            Err(FatalError::new(
                "Failed to start log size monitor",
                Error::IoError(e),
            ))
        }
    }
}

/// A running logger: handle, active file and size monitor
pub struct LogService {
    config: Arc<Config>,
    handle: Arc<LoggerHandle>,
    slot: FileSlot,
    rotator: Arc<Rotator>,
    monitor: Mutex<Option<Monitor>>,
    shut_down: AtomicBool,
}

impl LogService {
    pub fn builder(config: Config) -> LogServiceBuilder {
        LogServiceBuilder {
            config,
            handle: None,
            sinks: Vec::new(),
            on_fatal: None,
        }
    }

    /// Start with a new handle and the exiting fatal hook
    pub fn start(config: Config) -> Result<Self, FatalError> {
        Self::builder(config).start()
    }

    pub fn handle(&self) -> &Arc<LoggerHandle> {
        &self.handle
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn monitor_state(&self) -> MonitorState {
        self.rotator.state()
    }

    /// The file records currently go to, if any
    pub fn log_file(&self) -> Option<Arc<LogFile>> {
        self.slot.lock().as_ref().cloned()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Run one size check now, on the calling thread
    pub fn check_now(&self) -> Result<TickOutcome, FatalError> {
        self.rotator.tick()
    }

    /// Stop the monitor and close the log file. Only the first call does anything.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(mut monitor) = self.monitor.lock().take() {
            monitor.stop();
        }

        let file = self.slot.lock().take();
        if let Some(file) = file {
            if let Err(e) = file.close() {
                self.handle
                    .error_with_err(&e, "Error closing log file", Fields::new());
            }
        }
        debug!("Logger shut down");
    }
}

impl Drop for LogService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for LogService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogService")
            .field("config", &self.config)
            .field("monitor_state", &self.monitor_state())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
