//! datawash - Upload, clean and convert tabular data
//!
//! Reads CSV and Excel tables, fills missing numeric values with column means,
//! selects columns and exports the result as CSV, Excel or PDF. The same
//! pipeline backs a small browser application and a command line.

pub mod app;
pub mod capability;
pub mod chart;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod output;
pub mod parser;
pub mod transform;

pub use capability::Capabilities;
pub use config::{Config, ExportFormat};
pub use error::{PipelineError, Result};
pub use model::Table;
pub use parser::UploadedFile;
