//! Deferred, level-filtered emission

use parking_lot::Mutex;
use sinklog_core::{Level, LogEntry};
use std::sync::Arc;

use crate::handle::LoggerHandle;

struct BufferState {
    entries: Vec<LogEntry>,
    active: bool,
}

/// Staging area for log entries
///
/// While active, [`add_entry`](LogBuffer::add_entry) holds entries back until
/// [`flush`](LogBuffer::flush); while inactive, entries are written at once.
/// All three operations run under one lock, including the writes they do.
pub struct LogBuffer {
    state: Mutex<BufferState>,
    target: Arc<LoggerHandle>,
}

impl LogBuffer {
    /// A buffer that starts out active and writes through `target`
    pub fn new(target: Arc<LoggerHandle>) -> Self {
        Self {
            state: Mutex::new(BufferState {
                entries: Vec::new(),
                active: true,
            }),
            target,
        }
    }

    pub fn add_entry(&self, entry: LogEntry) {
        let mut state = self.state.lock();
        if state.active {
            state.entries.push(entry);
        } else {
            self.emit(&entry);
        }
    }

    /// Write every held entry at or above `min_level`, then drop all of them.
    ///
    /// Returns how many entries were written.
    pub fn flush(&self, min_level: Level) -> usize {
        let mut state = self.state.lock();
        let entries = std::mem::take(&mut state.entries);

        let mut emitted = 0;
        for entry in entries.iter().filter(|e| e.level >= min_level) {
            self.emit(entry);
            emitted += 1;
        }
        emitted
    }

    /// Switch buffering on or off; held entries stay until the next flush
    pub fn set_active(&self, active: bool) {
        self.state.lock().active = active;
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Fatal entries are written like any other level; they never exit.
    fn emit(&self, entry: &LogEntry) {
        let _ = self
            .target
            .load()
            .log(entry.level, &entry.message, &entry.fields);
    }
}
