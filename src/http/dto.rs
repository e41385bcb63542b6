//! Data Transfer Objects for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::capability::Capabilities;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Crate version
    pub version: String,
    pub capabilities: CapabilitiesDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitiesDto {
    pub charts: bool,
    pub xlsx_export: bool,
}

impl From<Capabilities> for CapabilitiesDto {
    fn from(caps: Capabilities) -> Self {
        Self {
            charts: caps.charts,
            xlsx_export: caps.xlsx_export,
        }
    }
}
