use crate::model::Batch;
use anyhow::Result;
use std::io::Write;

pub fn write_json(batch: &Batch, compact: bool, out: &mut dyn Write) -> Result<()> {
    let json = if compact {
        serde_json::to_string(batch)?
    } else {
        serde_json::to_string_pretty(batch)?
    };
    writeln!(out, "{}", json)?;
    Ok(())
}

pub fn print_json(batch: &Batch, compact: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_json(batch, compact, &mut out)
}
