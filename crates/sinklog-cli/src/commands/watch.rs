//! Watch command implementation - writes records while the size monitor runs

use anyhow::Result;
use serde::Serialize;
use sinklog::LogService;
use sinklog_core::fields;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::debug;

use crate::cli::WatchArgs;
use crate::output::{format_bytes, print_info, print_result};

use super::load_config;

#[derive(Debug, Serialize)]
struct WatchSummary {
    records: u64,
    truncations: u64,
    final_size: Option<u64>,
}

pub fn execute(config_path: Option<&Path>, args: WatchArgs) -> Result<()> {
    let (config, _) = load_config(config_path, &args.output)?;
    if !config.monitor_enabled() {
        print_info("Size monitor is off; the log file will not be truncated");
    }

    let service = LogService::start(config)?;
    let handle = Arc::clone(service.handle());

    let mut current = service.log_file();
    let mut summary = WatchSummary {
        records: 0,
        truncations: 0,
        final_size: None,
    };

    let deadline = Instant::now() + args.duration;
    while Instant::now() < deadline {
        handle.info(&args.message, fields! { "seq" => summary.records });
        summary.records += 1;

        let latest = service.log_file();
        let swapped = match (&current, &latest) {
            (Some(old), Some(new)) => !Arc::ptr_eq(old, new),
            _ => false,
        };
        if swapped {
            summary.truncations += 1;
            debug!("Log file reopened after truncation");
        }
        current = latest;

        thread::sleep(args.every);
    }

    summary.final_size = service.log_file().and_then(|file| file.size().ok());
    debug!("Monitor state at exit: {:?}", service.monitor_state());
    service.shutdown();

    let size = summary
        .final_size
        .map(format_bytes)
        .unwrap_or_else(|| "-".to_string());
    print_result(
        &format!(
            "Wrote {} record(s), {} truncation(s), final size {}",
            summary.records, summary.truncations, size
        ),
        summary,
    );
    Ok(())
}
