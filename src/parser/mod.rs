//! Parser layer for reading uploaded tabular files

mod csv;
mod excel;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::model::Table;

pub use self::csv::CsvParser;
pub use self::excel::ExcelParser;

/// A file as received from the user: its name and raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// File name including extension
    pub name: String,
    /// Raw file content
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk, keeping only its file name
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self { name, content })
    }

    /// Lowercase text after the last `.`, empty when there is none
    pub fn extension(&self) -> String {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }

    /// Name without its final extension
    pub fn stem(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.name)
    }
}

/// Trait for parsing uploaded files
pub trait Parser: Send + Sync {
    /// Parse a file and return a Table
    fn parse(&self, file: &UploadedFile) -> Result<Table>;

    /// Check if this parser can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Factory for choosing a parser based on file extension
pub struct ParserFactory {
    parsers: Vec<Box<dyn Parser>>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    /// Create a new parser factory with all supported parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![Box::new(CsvParser), Box::new(ExcelParser)],
        }
    }

    /// Get a parser for the given file
    pub fn get_parser(&self, file: &UploadedFile) -> Result<&dyn Parser> {
        let ext = file.extension();

        self.parsers
            .iter()
            .find(|parser| parser.supports_extension(&ext))
            .map(|parser| parser.as_ref())
            .ok_or_else(|| {
                PipelineError::UnsupportedFormat(if ext.is_empty() {
                    "unknown".to_string()
                } else {
                    ext
                })
            })
    }

    /// Parse a file using the appropriate parser
    pub fn parse(&self, file: &UploadedFile) -> Result<Table> {
        let parser = self.get_parser(file)?;
        debug!(file = %file.name, bytes = file.content.len(), "parsing upload");
        let table = parser.parse(file)?;
        info!(
            file = %file.name,
            rows = table.row_count(),
            columns = table.column_count(),
            "ingested table"
        );
        Ok(table)
    }
}

/// Parse a file with the default parsers
pub fn ingest(file: &UploadedFile) -> Result<Table> {
    ParserFactory::new().parse(file)
}

/// Spellings that spreadsheet and dataframe tools write for a missing value
const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a text cell stands for a missing value
pub(crate) fn is_missing_marker(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || MISSING_MARKERS.contains(&trimmed)
}

/// Make header names unique: a repeated `a` becomes `a.1`, then `a.2`, skipping
/// names already taken
pub(crate) fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut unique = Vec::with_capacity(names.len());

    for name in names {
        let count = seen.entry(name.clone()).or_insert(0);
        if *count == 0 {
            *count = 1;
            unique.push(name);
            continue;
        }
        let renamed = loop {
            let candidate = format!("{}.{}", name, count);
            *count += 1;
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        taken.insert(renamed.clone());
        unique.push(renamed);
    }
    unique
}
