//! Check command implementation - validates a config and prints the effective values

use anyhow::{Context, Result};
use colored::Colorize;
use sinklog_core::Config;
use std::path::Path;

use crate::cli::CheckArgs;
use crate::output::{format_bytes, is_json_mode, print_info, print_result};

use super::load_config;

pub fn execute(config_path: Option<&Path>, args: CheckArgs) -> Result<()> {
    let (config, source) = load_config(config_path, &args.output)?;
    config.validate().context("Invalid configuration")?;

    let source = source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());

    if is_json_mode() {
        print_result(&format!("Config OK ({})", source), &config);
        return Ok(());
    }

    print_info(&format!("Config source: {}", source));
    print_summary(&config);
    println!();
    let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;
    print!("{}", rendered);
    println!();
    print_result("Config OK", ());
    Ok(())
}

fn print_summary(config: &Config) {
    let on_off = |enabled: bool| {
        if enabled {
            "on".green()
        } else {
            "off".dimmed()
        }
    };

    println!("  {:<14} {}", "console:".bold(), on_off(config.enable_console_output));
    println!(
        "  {:<14} {} {}",
        "file:".bold(),
        on_off(config.enable_file_output),
        config.log_path.display()
    );
    println!(
        "  {:<14} {}={}",
        "project:".bold(),
        config.project_key,
        config.project_name
    );
    println!("  {:<14} {}", "level:".bold(), config.level);

    let truncation = if !config.rotation_enabled() {
        "disabled".to_string()
    } else if !config.monitor_enabled() {
        format!("over {} (monitor off)", format_bytes(config.max_log_size))
    } else {
        format!(
            "over {}, checked every {:?}",
            format_bytes(config.max_log_size),
            config.monitor_interval()
        )
    };
    println!("  {:<14} {}", "truncate:".bold(), truncation);
    println!(
        "  {:<14} {}",
        "on failure:".bold(),
        config.on_rotation_error.as_str()
    );
}
