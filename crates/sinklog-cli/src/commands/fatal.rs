//! Fatal command implementation

use anyhow::Result;
use std::path::Path;

use crate::cli::FatalArgs;

use super::{load_config, to_fields};

/// Write one fatal record and exit with `--code`. Never returns on success.
pub fn execute(config_path: Option<&Path>, args: FatalArgs) -> Result<()> {
    let (config, _) = load_config(config_path, &args.output)?;
    sinklog::try_init(config)?;

    sinklog::fatal(&args.message, args.code, to_fields(args.fields))
}
