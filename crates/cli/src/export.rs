//! Writing report tables and payloads to disk or stdout.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::exit_codes::EXIT_RECON_RUNTIME;
use crate::CliError;

fn write_err(path: &Path, e: impl std::fmt::Display) -> CliError {
    CliError {
        code: EXIT_RECON_RUNTIME,
        message: format!("cannot write {}: {e}", path.display()),
        hint: None,
    }
}

fn write_csv<W: io::Write>(writer: W, records: &[Vec<String>]) -> Result<(), csv::Error> {
    // Rows differ in width (info block, side-by-side listings).
    let mut out = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    for record in records {
        out.write_record(record)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_records(path: &Path, records: &[Vec<String>]) -> Result<(), CliError> {
    let file = std::fs::File::create(path).map_err(|e| write_err(path, e))?;
    write_csv(file, records).map_err(|e| write_err(path, e))?;
    tracing::debug!(path = %path.display(), rows = records.len(), "wrote table");
    Ok(())
}

pub fn print_records(records: &[Vec<String>]) -> Result<(), CliError> {
    write_csv(io::stdout().lock(), records).map_err(|e| CliError {
        code: EXIT_RECON_RUNTIME,
        message: format!("cannot write to stdout: {e}"),
        hint: None,
    })
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError {
        code: EXIT_RECON_RUNTIME,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let json = to_json(value)?;
    std::fs::write(path, json).map_err(|e| write_err(path, e))?;
    tracing::debug!(path = %path.display(), "wrote json");
    Ok(())
}

/// `<dir>/<stem>.<ext>`
pub fn output_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    dir.join(format!("{stem}.{ext}"))
}
