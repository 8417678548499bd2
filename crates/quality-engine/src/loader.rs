//! CSV loading with fallbacks for badly quoted files.

use crate::error::{QualityError, Result};
use polars::prelude::*;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, error, info};

fn read_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
}

fn parse_options() -> CsvParseOptions {
    CsvParseOptions::default().with_truncate_ragged_lines(true)
}

/// Load a CSV file into a table with trimmed, unique column names.
///
/// Tries standard quote handling first, then no quote handling, then a
/// pre-cleaned in-memory copy of the file.
pub fn load_table(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();

    // Strategy 1: Standard loading with quote handling
    match read_options()
        .with_parse_options(parse_options().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return finish_table(df, path),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    // Strategy 2: Without quote handling
    match read_options()
        .with_parse_options(parse_options().with_quote_char(None))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return finish_table(df, path),
        Err(e) => {
            debug!("Loading without quotes failed: {}", e);
        }
    }

    // Strategy 3: Pre-clean content
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let df = parse_table(&clean_csv_content(&content))?;
            finish_table(df, path)
        }
        Err(e) => {
            error!("Could not read file: {}", e);
            Err(e.into())
        }
    }
}

/// Parse CSV text held in memory.
pub fn parse_table(content: &str) -> Result<DataFrame> {
    let df = read_options()
        .with_parse_options(parse_options())
        .into_reader_with_file_handle(Cursor::new(content.as_bytes().to_vec()))
        .finish()?;
    normalize_column_names(df)
}

fn finish_table(df: DataFrame, path: &Path) -> Result<DataFrame> {
    let df = normalize_column_names(df)?;
    info!(
        "Loaded {}: {} rows x {} columns",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Trim surrounding whitespace from every column label.
///
/// Fails with [`QualityError::DuplicateColumn`] when two labels collide
/// after trimming.
pub fn normalize_column_names(mut df: DataFrame) -> Result<DataFrame> {
    let trimmed: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.trim().to_string())
        .collect();

    let mut seen = HashSet::new();
    if let Some(duplicate) = trimmed.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(QualityError::DuplicateColumn(duplicate.clone()));
    }

    df.set_column_names(trimmed.iter().map(String::as_str))?;
    Ok(df)
}

/// Clean CSV content
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
