//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use sinklog_core::{Config, Level, Value, CONFIG_ENV};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sinklog")]
#[command(version, about = "Structured logging to console and file with size-based truncation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (TOML, YAML or JSON); defaults to sinklog.* in the current directory
    #[arg(short, long, env = CONFIG_ENV, global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity of sinklog's own diagnostics (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print command results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a log record
    Emit(EmitArgs),

    /// Write a fatal record and exit with the given code
    Fatal(FatalArgs),

    /// Validate the config and print the effective values
    Check(CheckArgs),

    /// Write records at an interval while the size monitor runs
    Watch(WatchArgs),
}

/// Overrides applied on top of the loaded config
#[derive(Args, Debug, Default, Clone)]
pub struct OutputArgs {
    /// Write records to this file (enables file output)
    #[arg(long = "file", value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Disable console output
    #[arg(long)]
    pub no_console: bool,

    /// Disable colour on the console
    #[arg(long)]
    pub no_color: bool,

    /// Project name attached to every record
    #[arg(long)]
    pub project: Option<String>,

    /// Maximum log file size in bytes before truncation (0 disables)
    #[arg(long)]
    pub max_size: Option<u64>,

    /// Interval between size checks, e.g. "500ms", "2s" (0 disables)
    #[arg(long, value_parser = parse_duration)]
    pub check_every: Option<Duration>,

    /// Discard records below this level
    #[arg(long, value_parser = parse_level)]
    pub min_level: Option<Level>,
}

impl OutputArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.log_path {
            config.log_path = path.clone();
            config.enable_file_output = true;
        }
        if self.no_console {
            config.enable_console_output = false;
        }
        if self.no_color {
            config.console_color = false;
        }
        if let Some(project) = &self.project {
            config.project_name = project.clone();
        }
        if let Some(max_size) = self.max_size {
            config.max_log_size = max_size;
        }
        if let Some(every) = self.check_every {
            config.set_monitor_interval(every);
        }
        if let Some(level) = self.min_level {
            config.level = level;
        }
    }
}

#[derive(Args)]
pub struct EmitArgs {
    /// Record message
    pub message: String,

    /// Record level
    #[arg(short, long, default_value = "info", value_parser = parse_level)]
    pub level: Level,

    /// Field as KEY=VALUE; JSON values are kept typed (repeatable)
    #[arg(short, long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, Value)>,

    /// Number of copies to write
    #[arg(short = 'n', long, default_value = "1")]
    pub count: u64,

    /// Hold records in the buffer and flush at or above this level
    #[arg(long, value_parser = parse_level)]
    pub buffer_min: Option<Level>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args)]
pub struct FatalArgs {
    /// Record message
    pub message: String,

    /// Process exit code
    #[arg(long, default_value = "1")]
    pub code: i32,

    /// Field as KEY=VALUE (repeatable)
    #[arg(short, long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, Value)>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Record message
    #[arg(default_value = "watch tick")]
    pub message: String,

    /// Delay between records, e.g. "100ms"
    #[arg(long, default_value = "100ms", value_parser = parse_duration)]
    pub every: Duration,

    /// How long to keep writing, e.g. "5s", "1m"
    #[arg(long = "for", default_value = "5s", value_parser = parse_duration)]
    pub duration: Duration,

    #[command(flatten)]
    pub output: OutputArgs,
}

fn parse_level(s: &str) -> Result<Level, String> {
    s.parse().map_err(|e: sinklog_core::Error| e.to_string())
}

fn parse_field(s: &str) -> Result<(String, Value), String> {
    let pos = s.find('=').ok_or("Expected KEY=VALUE format")?;
    let key = s[..pos].trim();
    if key.is_empty() {
        return Err("Field key must not be empty".to_string());
    }
    let raw = &s[pos + 1..];
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Parse duration strings like "250ms", "30s", "2m", "1h" or "1m30s".
/// Plain numbers are milliseconds; "0" is allowed and disables the interval.
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_lowercase();
    if s.is_empty() {
        return Err("Empty duration string".to_string());
    }

    let mut total_ms: u64 = 0;
    let mut current_num = String::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            current_num.push(c);
            continue;
        }
        if current_num.is_empty() {
            return Err(format!("Invalid duration format: {}", s));
        }
        let num: u64 = current_num
            .parse()
            .map_err(|_| format!("Invalid number in duration: {}", current_num))?;
        current_num.clear();

        let multiplier = match c {
            'm' if chars.peek() == Some(&'s') => {
                chars.next();
                1
            }
            's' => 1_000,
            'm' => 60_000,
            'h' => 3_600_000,
            _ => return Err(format!("Unknown duration unit: {}", c)),
        };
        total_ms += num * multiplier;
    }

    if !current_num.is_empty() {
        let num: u64 = current_num
            .parse()
            .map_err(|_| format!("Invalid number in duration: {}", current_num))?;
        total_ms += num;
    }

    Ok(Duration::from_millis(total_ms))
}
