//! CSV export

use crate::error::{PipelineError, Result};
use crate::model::Table;

use super::Exporter;

/// Comma-separated export: header row, every data row, no index column
pub struct CsvOutput;

impl Exporter for CsvOutput {
    fn render(&self, table: &Table) -> Result<Vec<u8>> {
        // A zero-column table still has one (empty) line per row
        if table.column_count() == 0 {
            return Ok(b"\n".repeat(table.row_count() + 1));
        }

        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(table.columns.iter().map(|c| c.name.as_str()))
            .map_err(|e| PipelineError::export("CSV", e))?;

        for row in &table.rows {
            writer
                .write_record(row.cells.iter().map(|c| c.to_field().into_owned()))
                .map_err(|e| PipelineError::export("CSV", e))?;
        }

        writer
            .into_inner()
            .map_err(|e| PipelineError::export("CSV", e.error()))
    }
}
