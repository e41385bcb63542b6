//! Error taxonomy for the dataset pipeline

use thiserror::Error;

/// Errors raised while ingesting, transforming or exporting a table
#[derive(Debug, Error)]
pub enum PipelineError {
    /// File extension is neither `csv` nor `xlsx`
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// File content could not be read as the format its extension claims
    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    /// Column projection named a column the table does not have
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// An optional capability this operation needs is not available
    #[error("{operation} requires the '{capability}' capability, which is not available in this build")]
    MissingDependency {
        operation: &'static str,
        capability: &'static str,
    },

    /// Serializing the table failed
    #[error("Failed to export {format}: {message}")]
    Export { format: &'static str, message: String },

    /// Rendering the chart failed
    #[error("Failed to render chart: {0}")]
    Chart(String),
}

impl PipelineError {
    pub fn parse(file: impl Into<String>, message: impl std::fmt::Display) -> Self {
        PipelineError::Parse {
            file: file.into(),
            message: message.to_string(),
        }
    }

    pub fn export(format: &'static str, message: impl std::fmt::Display) -> Self {
        PipelineError::Export {
            format,
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
