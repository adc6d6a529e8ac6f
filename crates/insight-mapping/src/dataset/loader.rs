//! File loading for the command-line front end.
//!
//! The loader only turns a file into a `DataFrame`; sentinel normalization
//! and kind inference happen when the [`DatasetView`](super::DatasetView)
//! is built.

use crate::error::{AnalysisError, Result, ResultExt};
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rows sampled by the CSV reader to infer the schema.
const INFER_SCHEMA_ROWS: usize = 100;

/// Input formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Csv,
    Tsv,
    Json,
    JsonLines,
    Parquet,
}

impl FileFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "txt" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "parquet" => Ok(Self::Parquet),
            "xlsx" | "xls" => Err(AnalysisError::UnsupportedFormat(format!(
                "Excel workbooks are not supported; export '{}' to CSV first",
                path.display()
            ))),
            other => Err(AnalysisError::UnsupportedFormat(format!(
                "unknown extension '{}'",
                other
            ))),
        }
    }
}

/// Load a dataset file into a DataFrame.
///
/// # Errors
///
/// Returns [`AnalysisError::Io`] when the file does not exist and
/// [`AnalysisError::UnsupportedFormat`] for unknown extensions.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<(DataFrame, FileFormat)> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AnalysisError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input file not found: {}", path.display()),
        )));
    }

    let format = FileFormat::from_path(path)?;
    debug!("Loading {} as {:?}", path.display(), format);

    let df = match format {
        FileFormat::Csv => read_delimited(path, b',')?,
        FileFormat::Tsv => read_delimited(path, b'\t')?,
        FileFormat::Json => read_json(path, JsonFormat::Json)?,
        FileFormat::JsonLines => read_json(path, JsonFormat::JsonLines)?,
        FileFormat::Parquet => {
            let file = File::open(path)?;
            ParquetReader::new(file)
                .finish()
                .context(format!("Reading parquet file {}", path.display()))?
        }
    };

    info!("Loaded {} rows x {} columns", df.height(), df.width());
    Ok((df, format))
}

fn read_delimited(path: &Path, separator: u8) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator)
                .with_quote_char(Some(b'"')),
        )
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))
        .context(format!("Opening {}", path.display()))?
        .finish()
        .context(format!("Parsing {}", path.display()))
}

fn read_json(path: &Path, format: JsonFormat) -> Result<DataFrame> {
    let file = File::open(path)?;
    JsonReader::new(file)
        .with_json_format(format)
        .finish()
        .context(format!("Parsing {}", path.display()))
}
