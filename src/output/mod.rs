//! Export encodings for transformed tables

mod csv;
mod excel;
mod pdf;
mod terminal;

use tracing::{info, warn};

use crate::capability::Capabilities;
use crate::config::ExportFormat;
use crate::error::{PipelineError, Result};
use crate::model::Table;

pub use self::csv::CsvOutput;
pub use self::excel::ExcelOutput;
pub use self::pdf::PdfOutput;
pub use self::terminal::render_preview;

/// Trait for export encoders
pub trait Exporter {
    /// Serialize the table into the encoded file bytes
    fn render(&self, table: &Table) -> Result<Vec<u8>>;
}

/// A finished export, ready to hand to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Output name: the source name without its last extension, plus the format's extension
pub fn export_filename(source_name: &str, format: ExportFormat) -> String {
    let stem = source_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(source_name);
    format!("{}.{}", stem, format.extension())
}

pub(crate) fn missing_xlsx() -> PipelineError {
    PipelineError::MissingDependency {
        operation: "Excel export",
        capability: "xlsx",
    }
}

/// Factory for export encoders, aware of which capabilities are available
pub struct ExportFactory {
    capabilities: Capabilities,
    pdf_row_limit: usize,
}

impl ExportFactory {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            pdf_row_limit: 20,
        }
    }

    pub fn with_pdf_row_limit(mut self, rows: usize) -> Self {
        self.pdf_row_limit = rows;
        self
    }

    /// Create an encoder for the format, or report the missing capability
    pub fn create(&self, format: ExportFormat) -> Result<Box<dyn Exporter>> {
        match format {
            ExportFormat::Csv => Ok(Box::new(CsvOutput)),
            ExportFormat::Excel if self.capabilities.xlsx_export => Ok(Box::new(ExcelOutput)),
            ExportFormat::Excel => Err(missing_xlsx()),
            ExportFormat::Pdf => Ok(Box::new(PdfOutput::with_row_limit(self.pdf_row_limit))),
        }
    }

    /// Encode a table into a named, typed artifact
    pub fn export(&self, table: &Table, source_name: &str, format: ExportFormat) -> Result<ExportArtifact> {
        let exporter = self.create(format).inspect_err(|e| {
            warn!(file = %source_name, %format, error = %e, "export unavailable");
        })?;
        let bytes = exporter.render(table)?;
        let artifact = ExportArtifact {
            filename: export_filename(source_name, format),
            mime_type: format.mime_type(),
            bytes,
        };
        info!(
            file = %source_name,
            output = %artifact.filename,
            bytes = artifact.bytes.len(),
            "exported table"
        );
        Ok(artifact)
    }
}
