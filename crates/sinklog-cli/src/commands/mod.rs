//! Command implementations

pub mod check;
pub mod emit;
pub mod fatal;
pub mod watch;

use anyhow::{Context, Result};
use sinklog_core::{Config, Error, Fields, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::OutputArgs;

/// Load the config named on the command line, or discover one in the
/// current directory, then apply the command-line overrides.
///
/// With neither, defaults are used. Returns the file the config came from.
pub fn load_config(
    path: Option<&Path>,
    overrides: &OutputArgs,
) -> Result<(Config, Option<PathBuf>)> {
    let (mut config, source) = match path {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            (config, Some(path.to_path_buf()))
        }
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            match Config::find_and_load(&cwd) {
                Ok((config, found)) => (config, Some(found)),
                Err(Error::ConfigNotFound(_)) => (Config::default(), None),
                Err(e) => return Err(e).context("Failed to load config"),
            }
        }
    };

    match &source {
        Some(path) => debug!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    overrides.apply(&mut config);
    Ok((config, source))
}

pub fn to_fields(pairs: Vec<(String, Value)>) -> Fields {
    pairs.into_iter().collect()
}
