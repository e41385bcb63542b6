//! Configuration handling for datawash

use serde::{Deserialize, Serialize};

/// Output encoding for an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Excel, ExportFormat::Pdf];

    /// Lowercase file extension for exported files
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// Label shown in the UI
    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Excel => "Excel",
            ExportFormat::Pdf => "PDF",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// Runtime configuration for the server and the pipeline
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub host: String,
    /// Port to bind the HTTP server to
    pub port: u16,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
    /// Sessions kept in memory before the oldest is evicted
    pub max_sessions: usize,
    /// Rows shown in each preview
    pub preview_rows: usize,
    /// Data rows written to a PDF export
    pub pdf_row_limit: usize,
    /// Rows plotted in the chart
    pub chart_row_limit: usize,
    /// Turn off charts even when compiled in
    pub disable_charts: bool,
    /// Turn off Excel export even when compiled in
    pub disable_xlsx: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_upload_bytes: 200 * 1024 * 1024,
            max_sessions: 64,
            preview_rows: 5,
            pdf_row_limit: 20,
            chart_row_limit: 10,
            disable_charts: false,
            disable_xlsx: false,
        }
    }
}

impl Config {
    /// Set the bind address
    pub fn with_bind(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Set the upload size limit in megabytes
    pub fn with_max_upload_mb(mut self, megabytes: usize) -> Self {
        self.max_upload_bytes = megabytes.saturating_mul(1024 * 1024);
        self
    }

    /// Set the in-memory session cap
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// Disable chart rendering
    pub fn with_disable_charts(mut self, disable: bool) -> Self {
        self.disable_charts = disable;
        self
    }

    /// Disable Excel export
    pub fn with_disable_xlsx(mut self, disable: bool) -> Self {
        self.disable_xlsx = disable;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
