//! In-place cleaning and column projection

mod fill;
mod project;

use tracing::debug;

use crate::error::Result;
use crate::model::Table;

pub use fill::{column_means, fill_missing, FillReport};
pub use project::project;

/// Transform steps requested for one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// Replace nulls in numeric columns with the column mean
    pub fill_missing: bool,
    /// Columns to keep, in output order; `None` keeps every column
    pub columns: Option<Vec<String>>,
}

impl TransformOptions {
    pub fn with_fill_missing(mut self, fill: bool) -> Self {
        self.fill_missing = fill;
        self
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }
}

/// Apply the requested steps. Filling always runs before projection,
/// so means are computed over the full table.
pub fn apply(table: &mut Table, options: &TransformOptions) -> Result<()> {
    if options.fill_missing {
        let report = fill_missing(table);
        debug!(filled = report.cells_filled, columns = report.columns_filled.len(), "filled missing values");
    }

    if let Some(ref columns) = options.columns {
        project(table, columns)?;
        debug!(columns = table.column_count(), "projected columns");
    }

    Ok(())
}
