//! Log size monitor
//!
//! A background thread wakes every `monitor_interval`, checks the size of
//! the active log file and, once it is over `max_log_size`, truncates it:
//! close the current descriptor, truncate the file, reopen it and install a
//! logger whose sink set points at the new descriptor.
//!
//! ```text
//! Idle -> Checking -> Idle
//!                  -> Rotating -> Idle
//! ```

use crossbeam_channel::{bounded, select, tick, Sender};
use parking_lot::Mutex;
use sinklog_core::{error_chain, Config, Error, FatalError, Fields, RotationErrorPolicy};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;
use tracing::{debug, warn};

use crate::handle::LoggerHandle;
use crate::sink::{self, LogFile};

/// The active log file, shared by the service and the monitor
pub(crate) type FileSlot = Arc<Mutex<Option<Arc<LogFile>>>>;

/// Called with errors the monitor cannot recover from
pub type FatalHook = Arc<dyn Fn(FatalError) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Checking,
    Rotating,
    Stopped,
}

/// Result of one size check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No file is open
    NoFile,
    /// The file is at or below the limit, or the limit is disabled
    WithinLimit { size: u64 },
    /// The file could not be inspected; retried next tick
    StatFailed,
    /// The file was truncated and reopened
    Rotated { previous_size: u64 },
    /// Close or truncate failed; the current sinks were kept
    Aborted,
}

type Opener = fn(&Path) -> sinklog_core::Result<LogFile>;

/// Performs size checks and the truncate-and-reopen cycle
pub(crate) struct Rotator {
    config: Arc<Config>,
    handle: Arc<LoggerHandle>,
    slot: FileSlot,
    state: Mutex<MonitorState>,
    reopen: Opener,
}

impl Rotator {
    pub(crate) fn new(config: Arc<Config>, handle: Arc<LoggerHandle>, slot: FileSlot) -> Self {
        Self {
            config,
            handle,
            slot,
            state: Mutex::new(MonitorState::Idle),
            reopen: LogFile::open,
        }
    }

    #[cfg(test)]
    fn with_reopen(mut self, reopen: Opener) -> Self {
        self.reopen = reopen;
        self
    }

    pub(crate) fn state(&self) -> MonitorState {
        *self.state.lock()
    }

    fn set_state(&self, state: MonitorState) {
        *self.state.lock() = state;
    }

    /// Run one check. The slot stays locked for the whole cycle.
    pub(crate) fn tick(&self) -> Result<TickOutcome, FatalError> {
        let mut slot = self.slot.lock();
        let Some(file) = slot.as_ref().cloned() else {
            return Ok(TickOutcome::NoFile);
        };

        self.set_state(MonitorState::Checking);
        let size = match file.size() {
            Ok(size) => size,
            Err(e) => {
                self.handle
                    .error_with_err(&e, "Error getting file info", Fields::new());
                self.set_state(MonitorState::Idle);
                return Ok(TickOutcome::StatFailed);
            }
        };

        if !self.config.rotation_enabled() || size <= self.config.max_log_size {
            self.set_state(MonitorState::Idle);
            return Ok(TickOutcome::WithinLimit { size });
        }

        self.set_state(MonitorState::Rotating);
        debug!(
            "Rotating log file {} at {} bytes",
            file.path().display(),
            size
        );
        self.handle.info(
            "Log file size exceeds limit. Clearing log file.",
            Fields::new(),
        );

        if let Err(e) = file.close() {
            self.handle.error_with_err(
                &e,
                "Error closing log file before truncation",
                Fields::new(),
            );
            return self.abort(e);
        }

        if let Err(e) = sink::truncate(file.path()) {
            self.handle
                .error_with_err(&e, "Error truncating log file", Fields::new());
            return self.abort(e);
        }

        let reopened = match (self.reopen)(file.path()) {
            Ok(f) => Arc::new(f),
            Err(e) => {
                self.set_state(MonitorState::Idle);
                return Err(FatalError::new(
                    "Error reopening log file after truncation",
                    e,
                ));
            }
        };

        *slot = Some(Arc::clone(&reopened));
        self.handle
            .update(|logger| logger.with_sinks(logger.sinks().replace_file(reopened)));
        drop(slot);

        self.handle
            .info("Log file cleared successfully.", Fields::new());
        self.set_state(MonitorState::Idle);

        Ok(TickOutcome::Rotated {
            previous_size: size,
        })
    }

    fn abort(&self, e: Error) -> Result<TickOutcome, FatalError> {
        self.set_state(MonitorState::Idle);
        match self.config.on_rotation_error {
            RotationErrorPolicy::Continue => {
                warn!(
                    "Log rotation aborted, keeping current sinks: {}",
                    error_chain(&e)
                );
                Ok(TickOutcome::Aborted)
            }
            RotationErrorPolicy::Fatal => Err(FatalError::new("Log rotation failed", e)),
        }
    }
}

/// Handle to the running monitor thread
#[derive(Debug)]
pub(crate) struct Monitor {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

impl Monitor {
    pub(crate) fn spawn(
        rotator: Arc<Rotator>,
        interval: Duration,
        on_fatal: FatalHook,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let ticker = tick(interval);

        let thread = thread::Builder::new()
            .name("sinklog-monitor".to_string())
            .spawn(move || {
                debug!("Log size monitor started, interval {:?}", interval);
                loop {
                    select! {
                        recv(ticker) -> _ => match rotator.tick() {
                            Ok(outcome) => debug!("Log size check: {:?}", outcome),
                            Err(fatal) => {
                                rotator.set_state(MonitorState::Stopped);
                                on_fatal(fatal);
                                break;
                            }
                        },
                        recv(stop_rx) -> _ => break,
                    }
                }
                rotator.set_state(MonitorState::Stopped);
                debug!("Log size monitor stopped");
            })?;

        let thread_id = thread.thread().id();
        Ok(Self {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
            thread_id,
        })
    }

    /// Stop the thread and wait for it, unless called from the thread itself
    pub(crate) fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.try_send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread::current().id() != self.thread_id {
                let _ = thread.join();
            }
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::Logger;
    use crate::sink::{MemorySink, SinkSet};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        rotator: Rotator,
        handle: Arc<LoggerHandle>,
        slot: FileSlot,
        memory: Arc<MemorySink>,
    }

    fn fixture(max_log_size: u64, policy: RotationErrorPolicy) -> Fixture {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut config = Config::file(&path).with_max_log_size(max_log_size);
        config.on_rotation_error = policy;

        let file = Arc::new(LogFile::open(&path).unwrap());
        let memory = Arc::new(MemorySink::new());
        let logger = Logger::new(
            SinkSet::new()
                .with_file(Arc::clone(&file))
                .with_sink(memory.clone()),
        );
        let handle = Arc::new(LoggerHandle::new(logger));
        let slot: FileSlot = Arc::new(Mutex::new(Some(file)));
        let rotator = Rotator::new(Arc::new(config), Arc::clone(&handle), Arc::clone(&slot));

        Fixture {
            _dir: dir,
            rotator,
            handle,
            slot,
            memory,
        }
    }

    fn path_of(fx: &Fixture) -> std::path::PathBuf {
        fx.slot.lock().as_ref().unwrap().path().to_path_buf()
    }

    fn fill(handle: &LoggerHandle, path: &Path, over: u64) {
        while fs::metadata(path).unwrap().len() <= over {
            handle.info("filler line for the size monitor", ());
        }
    }

    #[test]
    fn test_within_limit_is_idle() {
        let fx = fixture(1024, RotationErrorPolicy::Continue);
        fx.handle.info("small", ());

        let outcome = fx.rotator.tick().unwrap();
        assert!(matches!(outcome, TickOutcome::WithinLimit { size } if size > 0));
        assert_eq!(fx.rotator.state(), MonitorState::Idle);
    }

    #[test]
    fn test_zero_max_size_disables_rotation() {
        let fx = fixture(0, RotationErrorPolicy::Continue);
        let path = path_of(&fx);
        fill(&fx.handle, &path, 512);

        assert!(matches!(
            fx.rotator.tick().unwrap(),
            TickOutcome::WithinLimit { .. }
        ));
    }

    #[test]
    fn test_rotation_truncates_and_swaps_file() {
        let fx = fixture(200, RotationErrorPolicy::Continue);
        let path = path_of(&fx);
        let old = fx.slot.lock().as_ref().cloned().unwrap();
        fill(&fx.handle, &path, 200);
        let before = fs::metadata(&path).unwrap().len();

        let outcome = fx.rotator.tick().unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Rotated {
                previous_size: before
            }
        );

        let new = fx.slot.lock().as_ref().cloned().unwrap();
        assert!(old.is_closed());
        assert!(!Arc::ptr_eq(&old, &new));
        assert!(Arc::ptr_eq(fx.handle.load().sinks().file().unwrap(), &new));

        fx.handle.info("after rotation", ());
        let content = fs::read_to_string(&path).unwrap();
        assert!((content.len() as u64) < before);
        assert!(!content.contains("filler line"));
        assert!(content.contains("Log file cleared successfully."));
        assert!(content.contains("after rotation"));

        let messages: Vec<_> = fx
            .memory
            .records()
            .into_iter()
            .map(|r| r["message"].as_str().unwrap().to_string())
            .collect();
        assert!(messages
            .iter()
            .any(|m| m == "Log file size exceeds limit. Clearing log file."));
    }

    #[test]
    fn test_rotation_keeps_attached_fields() {
        let fx = fixture(100, RotationErrorPolicy::Continue);
        let path = path_of(&fx);
        fx.handle.set_fields([("project", "billing")]);
        fill(&fx.handle, &path, 100);

        fx.rotator.tick().unwrap();
        fx.handle.info("after", ());

        let last = fx.memory.records().pop().unwrap();
        assert_eq!(last["project"], "billing");
    }

    #[test]
    fn test_no_file_after_slot_cleared() {
        let fx = fixture(100, RotationErrorPolicy::Continue);
        fx.slot.lock().take();
        assert_eq!(fx.rotator.tick().unwrap(), TickOutcome::NoFile);
    }

    #[test]
    fn test_stat_failure_is_skipped() {
        let fx = fixture(100, RotationErrorPolicy::Continue);
        fx.slot.lock().as_ref().unwrap().close().unwrap();

        assert_eq!(fx.rotator.tick().unwrap(), TickOutcome::StatFailed);
        let last = fx.memory.records().pop().unwrap();
        assert_eq!(last["message"], "Error getting file info");
        assert_eq!(last["level"], "error");
    }

    #[cfg(unix)]
    #[test]
    fn test_truncate_failure_keeps_sinks() {
        let fx = fixture(100, RotationErrorPolicy::Continue);
        let path = path_of(&fx);
        let before = fx.handle.load();
        fill(&fx.handle, &path, 100);
        fs::remove_file(&path).unwrap();

        assert_eq!(fx.rotator.tick().unwrap(), TickOutcome::Aborted);
        assert!(Arc::ptr_eq(
            before.sinks().file().unwrap(),
            fx.handle.load().sinks().file().unwrap()
        ));

        let last = fx.memory.records().pop().unwrap();
        assert_eq!(last["message"], "Error truncating log file");

        // The stale descriptor is closed, so later checks cannot stat it.
        assert_eq!(fx.rotator.tick().unwrap(), TickOutcome::StatFailed);
    }

    #[cfg(unix)]
    #[test]
    fn test_truncate_failure_fatal_policy() {
        let fx = fixture(100, RotationErrorPolicy::Fatal);
        let path = path_of(&fx);
        fill(&fx.handle, &path, 100);
        fs::remove_file(&path).unwrap();

        let fatal = fx.rotator.tick().unwrap_err();
        assert!(matches!(fatal.error(), Error::Truncate { .. }));
        assert_eq!(fatal.exit_code(), 1);
    }

    #[test]
    fn test_reopen_failure_is_fatal() {
        let fx = fixture(100, RotationErrorPolicy::Continue);
        let path = path_of(&fx);
        let old = fx.slot.lock().as_ref().cloned().unwrap();
        fill(&fx.handle, &path, 100);

        let rotator = fx.rotator.with_reopen(|path| {
            Err(Error::OpenFile {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "gone"),
            })
        });

        let fatal = rotator.tick().unwrap_err();
        assert_eq!(fatal.context(), "Error reopening log file after truncation");
        assert!(matches!(fatal.error(), Error::OpenFile { .. }));
        assert_eq!(rotator.state(), MonitorState::Idle);

        // Truncated, but the old descriptor is still the installed one.
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        assert!(old.is_closed());
        assert!(Arc::ptr_eq(fx.slot.lock().as_ref().unwrap(), &old));
    }

    #[test]
    fn test_monitor_thread_rotates_and_stops() {
        let fx = fixture(200, RotationErrorPolicy::Continue);
        let path = path_of(&fx);
        fill(&fx.handle, &path, 200);
        let before = fs::metadata(&path).unwrap().len();

        let rotator = Arc::new(fx.rotator);
        let hook: FatalHook = Arc::new(|_| {});
        let mut monitor =
            Monitor::spawn(Arc::clone(&rotator), Duration::from_millis(20), hook).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while fs::metadata(&path).unwrap().len() >= before {
            assert!(std::time::Instant::now() < deadline, "monitor never rotated");
            thread::sleep(Duration::from_millis(10));
        }

        monitor.stop();
        monitor.stop();
        assert_eq!(rotator.state(), MonitorState::Stopped);
    }

    #[cfg(unix)]
    #[test]
    fn test_monitor_thread_reports_fatal() {
        let fx = fixture(100, RotationErrorPolicy::Fatal);
        let path = path_of(&fx);
        fill(&fx.handle, &path, 100);
        fs::remove_file(&path).unwrap();

        let (tx, rx) = crossbeam_channel::unbounded();
        let hook: FatalHook = Arc::new(move |fatal| {
            let _ = tx.send(fatal.context().to_string());
        });
        let rotator = Arc::new(fx.rotator);
        let _monitor =
            Monitor::spawn(Arc::clone(&rotator), Duration::from_millis(20), hook).unwrap();

        let context = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(context, "Log rotation failed");
    }
}
