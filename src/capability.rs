//! Optional capabilities, detected once at startup

use serde::Serialize;

use crate::config::Config;

/// Which optional pieces of the pipeline are usable in this process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// Grouped bar chart rendering
    pub charts: bool,
    /// Excel (.xlsx) export
    pub xlsx_export: bool,
}

impl Capabilities {
    /// Everything compiled into this build
    pub fn detect() -> Self {
        Self {
            charts: cfg!(feature = "charts"),
            xlsx_export: cfg!(feature = "xlsx"),
        }
    }

    /// Compiled capabilities narrowed by configuration
    pub fn from_config(config: &Config) -> Self {
        let detected = Self::detect();
        Self {
            charts: detected.charts && !config.disable_charts,
            xlsx_export: detected.xlsx_export && !config.disable_xlsx,
        }
    }

    /// No optional capability at all
    pub fn none() -> Self {
        Self {
            charts: false,
            xlsx_export: false,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}
