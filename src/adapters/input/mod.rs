//! Delimited input files
//!
//! Builds `csv` readers from the `[input]` settings. Reading is left to the
//! coordinator so that each row is resolved before the next one is read.

use crate::config::InputConfig;
use crate::domain::{Result, SyncError};
use csv::{Reader, ReaderBuilder};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Reader builder configured for the input settings
///
/// The first line is a header and is skipped. Rows are read flexibly so a row
/// with the wrong column count reaches the parser, which reports it.
///
/// # Errors
///
/// Returns an error if the delimiter is not a single ASCII character
pub fn reader_builder(config: &InputConfig) -> Result<ReaderBuilder> {
    let delimiter = config
        .delimiter_byte()
        .map_err(SyncError::Configuration)?;

    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true);
    Ok(builder)
}

/// Opens the configured input file
///
/// # Errors
///
/// Returns an error if the file cannot be opened
pub fn open_reader(config: &InputConfig) -> Result<Reader<File>> {
    open_path(config, &config.path)
}

/// Opens `path` with the reader settings of `config`
///
/// # Errors
///
/// Returns an error if the file cannot be opened
pub fn open_path(config: &InputConfig, path: impl AsRef<Path>) -> Result<Reader<File>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        SyncError::Input(format!("Failed to open input file {}: {}", path.display(), e))
    })?;
    Ok(reader_builder(config)?.from_reader(file))
}

/// Wraps any byte source, used for in-memory input
///
/// # Errors
///
/// Returns an error if the delimiter is invalid
pub fn from_reader<R: Read>(config: &InputConfig, source: R) -> Result<Reader<R>> {
    Ok(reader_builder(config)?.from_reader(source))
}
