//! Emit command implementation

use anyhow::Result;
use std::path::Path;

use crate::cli::EmitArgs;
use crate::output::print_result;

use super::{load_config, to_fields};

pub fn execute(config_path: Option<&Path>, args: EmitArgs) -> Result<()> {
    let (config, _) = load_config(config_path, &args.output)?;
    sinklog::try_init(config)?;

    let fields = to_fields(args.fields);
    let mut written = 0u64;

    match args.buffer_min {
        Some(min_level) => {
            let buffer = sinklog::buffer();
            buffer.set_active(true);
            for _ in 0..args.count {
                buffer.add_entry(
                    sinklog::LogEntry::new(args.level, args.message.as_str())
                        .with_fields(fields.clone()),
                );
            }
            written = buffer.flush(min_level) as u64;
        }
        None => {
            for _ in 0..args.count {
                if sinklog::log(args.level, &args.message, fields.clone()).is_ok() {
                    written += 1;
                }
            }
        }
    }

    sinklog::shutdown();

    print_result(
        &format!("Wrote {} of {} record(s)", written, args.count),
        serde_json::json!({ "written": written, "requested": args.count }),
    );
    Ok(())
}
