//! Output destinations
//!
//! A [`SinkSet`] is the ordered collection of sinks a logger writes to:
//! an optional console sink, an optional log file and any extra sinks.
//! Sink sets are immutable; replacing the log file builds a new set.

use parking_lot::Mutex;
use sinklog_core::{Error, Result};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::format::Record;

/// A destination for rendered records
pub trait Sink: Send + Sync {
    fn write_record(&self, record: &Record<'_>) -> io::Result<()>;
}

/// Human-readable output on stderr
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    color: bool,
}

impl ConsoleSink {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Sink for ConsoleSink {
    fn write_record(&self, record: &Record<'_>) -> io::Result<()> {
        let line = record.to_console_line(self.color);
        io::stderr().lock().write_all(line.as_bytes())
    }
}

/// One open descriptor of the active log file
///
/// Closing takes the descriptor out; writes after that fail with
/// `BrokenPipe` instead of panicking.
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl LogFile {
    /// Open `path` read-write in append mode, creating it if needed
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(|source| Error::OpenFile {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(Some(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the open file
    pub fn size(&self) -> Result<u64> {
        let guard = self.file.lock();
        let file = guard
            .as_ref()
            .ok_or_else(|| Error::FileClosed(self.path.clone()))?;
        let metadata = file.metadata().map_err(|source| Error::Stat {
            path: self.path.clone(),
            source,
        })?;
        Ok(metadata.len())
    }

    pub fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        let mut guard = self.file.lock();
        match guard.as_mut() {
            Some(file) => file.write_all(buf),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("log file closed: {}", self.path.display()),
            )),
        }
    }

    /// Sync and release the descriptor
    pub fn close(&self) -> Result<()> {
        let file = self
            .file
            .lock()
            .take()
            .ok_or_else(|| Error::FileClosed(self.path.clone()))?;
        file.sync_all().map_err(|source| Error::Close {
            path: self.path.clone(),
            source,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.file.lock().is_none()
    }
}

impl Sink for LogFile {
    fn write_record(&self, record: &Record<'_>) -> io::Result<()> {
        let line = record.to_json_line()?;
        self.write_all(&line)
    }
}

/// Create the parent directory of a log file if it does not exist.
///
/// An existing parent that is not a directory is an error.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => return Ok(()),
    };

    if dir.is_dir() {
        return Ok(());
    }
    if dir.exists() {
        return Err(Error::CreateDir {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, "not a directory"),
        });
    }
    fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Truncate the file at `path` to zero length
pub fn truncate(path: &Path) -> Result<()> {
    OpenOptions::new()
        .write(true)
        .open(path)
        .and_then(|file| file.set_len(0))
        .map_err(|source| Error::Truncate {
            path: path.to_path_buf(),
            source,
        })
}

/// JSON records collected in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    buf: Mutex<Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    /// Every record written so far, parsed back from JSON
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.contents()
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn clear(&self) {
        self.buf.lock().clear();
    }
}

impl Sink for MemorySink {
    fn write_record(&self, record: &Record<'_>) -> io::Result<()> {
        let line = record.to_json_line()?;
        self.buf.lock().extend_from_slice(&line);
        Ok(())
    }
}

/// The sinks a logger writes to, in order: console, file, extras
#[derive(Clone, Default)]
pub struct SinkSet {
    console: Option<ConsoleSink>,
    file: Option<Arc<LogFile>>,
    extra: Vec<Arc<dyn Sink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_console(mut self, console: ConsoleSink) -> Self {
        self.console = Some(console);
        self
    }

    pub fn with_file(mut self, file: Arc<LogFile>) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.extra.push(sink);
        self
    }

    pub fn console(&self) -> Option<&ConsoleSink> {
        self.console.as_ref()
    }

    pub fn file(&self) -> Option<&Arc<LogFile>> {
        self.file.as_ref()
    }

    /// A copy of this set with the file sink swapped for `file`
    pub fn replace_file(&self, file: Arc<LogFile>) -> SinkSet {
        SinkSet {
            console: self.console,
            file: Some(file),
            extra: self.extra.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.console.is_some() as usize + self.file.is_some() as usize + self.extra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write to every sink; returns the first error after trying all of them
    pub fn write_record(&self, record: &Record<'_>) -> io::Result<()> {
        let mut first_err = None;

        let sinks = self
            .console
            .iter()
            .map(|console| console as &dyn Sink)
            .chain(self.file.iter().map(|file| file.as_ref() as &dyn Sink))
            .chain(self.extra.iter().map(|sink| sink.as_ref() as &dyn Sink));

        for sink in sinks {
            if let Err(e) = sink.write_record(record) {
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkSet")
            .field("console", &self.console)
            .field("file", &self.file.as_ref().map(|file| file.path()))
            .field("extra", &self.extra.len())
            .finish()
    }
}
