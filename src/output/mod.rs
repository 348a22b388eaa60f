mod json;
mod table;

pub use json::{print_json, write_json};
pub use table::{Renderer, NO_MANAGERS_MESSAGE, NO_UPDATES_MESSAGE};

use crate::model::Batch;
use anyhow::Result;

/// Output format for scan results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON format for programmatic use
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'table' or 'json'", s)),
        }
    }
}

/// Prints one batch to stdout. `compact` keeps JSON on a single line, one
/// batch per line, for watch mode.
pub fn print_batch(batch: &Batch, format: OutputFormat, renderer: &Renderer, compact: bool) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            renderer.render(batch, &mut out)?;
            Ok(())
        }
        OutputFormat::Json => print_json(batch, compact),
    }
}
