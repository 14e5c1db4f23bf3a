//! Request documents for the CDS global reanalysis retrieval service.
//!
//! Only the request body is built; submitting it is left to the CDS client.

use std::path::Path;

use anyhow::{Context, Result};
use reanalysis_common::BoundingBox;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const SINGLE_LEVELS_DATASET: &str = "reanalysis-era5-single-levels";

/// Body of a CDS retrieve call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub product_type: String,
    pub format: String,
    pub variable: String,
    pub year: Vec<String>,
    pub month: Vec<String>,
    pub day: Vec<String>,
    pub time: Vec<String>,
    /// `[north, west, south, east]`.
    pub area: [f64; 4],
}

/// A dataset name plus the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    pub dataset: String,
    pub request: RequestBody,
}

impl RetrievalRequest {
    /// Hourly single-level reanalysis of `param` for every day of `years`
    /// over `area`, as NetCDF.
    pub fn era5_single_levels(param: &str, years: &[i32], area: &BoundingBox) -> Self {
        Self {
            dataset: SINGLE_LEVELS_DATASET.to_string(),
            request: RequestBody {
                product_type: "reanalysis".to_string(),
                format: "netcdf".to_string(),
                variable: param.to_string(),
                year: years.iter().map(|y| y.to_string()).collect(),
                month: (1..=12).map(|m| format!("{:02}", m)).collect(),
                day: (1..=31).map(|d| format!("{:02}", d)).collect(),
                time: (0..24).map(|h| format!("{:02}:00", h)).collect(),
                area: area.to_north_west_south_east(),
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self)
    }

    /// Write the request as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write request to {}", path.display()))?;
        info!(
            path = %path.display(),
            dataset = %self.dataset,
            variable = %self.request.variable,
            years = self.request.year.len(),
            "Wrote retrieval request"
        );
        Ok(())
    }
}
