// CSV reading and writing for data frames.
//
// Every field is read as text. Blank fields and the usual spreadsheet NA
// markers become null; numeric coercion is left to the stages that know
// which columns are numeric.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;

use polars::prelude::*;
use tracing::warn;

use crate::table::TableError;

/// Field values read as null. Matches what pandas treats as NA by default.
pub const NA_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CsvTableError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("malformed table in {path}: {source}")]
    Table { path: String, source: TableError },
}

/// Failure from `read_table_from_reader`, before a path is attached.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Csv(csv::Error),

    #[error(transparent)]
    Table(TableError),
}

impl ReadError {
    fn at(self, path: &Path) -> CsvTableError {
        let path = path.display().to_string();
        match self {
            ReadError::Csv(source) => CsvTableError::Csv { path, source },
            ReadError::Table(source) => CsvTableError::Table { path, source },
        }
    }
}

// ---------------------------------------------------------------------------
// Reader/writer-based helpers (enable testing without temp files)
// ---------------------------------------------------------------------------

/// A raw field as a nullable value.
pub fn parse_field(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || NA_MARKERS.contains(&trimmed) {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Parse a CSV stream into a frame of String columns. Rows whose field
/// count does not match the header are skipped with a warning.
pub fn read_table_from_reader<R: Read>(rdr: R) -> Result<DataFrame, ReadError> {
    let mut reader = csv::Reader::from_reader(rdr);
    let headers: Vec<String> = reader
        .headers()
        .map_err(ReadError::Csv)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        match result {
            Ok(record) => rows.push(record.iter().map(str::to_string).collect()),
            Err(e) => {
                warn!("skipping malformed CSV row {}: {}", line + 1, e);
            }
        }
    }
    frame_from_rows(&headers, rows).map_err(ReadError::Table)
}

/// Build a frame of nullable String columns from a header and text rows,
/// the shape every raw source produces. Rows of the wrong width are skipped
/// with a warning.
pub fn frame_from_rows<I>(headers: &[String], rows: I) -> Result<DataFrame, TableError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let names = dedupe_headers(headers.iter().map(String::as_str));
    let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];

    for (line, row) in rows.into_iter().enumerate() {
        if row.len() != names.len() {
            warn!(
                "skipping row {}: {} fields, expected {}",
                line + 1,
                row.len(),
                names.len()
            );
            continue;
        }
        for (column, field) in values.iter_mut().zip(&row) {
            column.push(parse_field(field));
        }
    }

    let columns: Vec<Column> = names
        .iter()
        .zip(values)
        .map(|(name, column)| Column::new(name.as_str().into(), column))
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Write a frame as CSV with a header row. Nulls print empty.
pub fn write_table_to_writer<W: Write>(df: &DataFrame, wtr: W) -> Result<(), TableError> {
    let mut out = df.clone();
    CsvWriter::new(wtr).include_header(true).finish(&mut out)?;
    Ok(())
}

/// Repeated header names get a `.1`, `.2`, ... suffix so every column stays
/// addressable (e.g. a second `REC_R_G` becomes `REC_R_G.1`).
fn dedupe_headers<'a, I>(headers: I) -> Vec<String>
where
    I: Iterator<Item = &'a str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();
    for header in headers {
        let header = header.trim();
        let count = seen.entry(header.to_string()).or_insert(0);
        if *count == 0 {
            out.push(header.to_string());
        } else {
            out.push(format!("{header}.{count}"));
        }
        *count += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// Public path-based helpers
// ---------------------------------------------------------------------------

/// Load a frame from a CSV file.
pub fn read_table(path: &Path) -> Result<DataFrame, CsvTableError> {
    let file = std::fs::File::open(path).map_err(|e| CsvTableError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    read_table_from_reader(file).map_err(|e| e.at(path))
}

/// Write a frame to a CSV file, creating parent directories as needed.
pub fn write_table(path: &Path, df: &DataFrame) -> Result<(), CsvTableError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CsvTableError::Io {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    let file = std::fs::File::create(path).map_err(|e| CsvTableError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    write_table_to_writer(df, file).map_err(|source| CsvTableError::Table {
        path: path.display().to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
