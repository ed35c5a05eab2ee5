use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{MapError, Result};
use crate::markers::PlacedCity;
use crate::projection::CanvasSize;
use crate::render::RenderSummary;
use crate::table::{CityTable, RowIssue};
use crate::utils::ensure_parent_dir;

// Structure for the JSON placement report
#[derive(Serialize, Debug)]
pub struct PlacementReport<'a> {
    pub template: &'a str,
    pub output: String,
    pub canvas: CanvasSize,
    pub encoding: Option<&'static str>,
    pub max_magnitude: f64,
    pub cities: &'a [PlacedCity],
    pub skipped: &'a [RowIssue],
}

impl<'a> PlacementReport<'a> {
    pub fn new(table: &'a CityTable, summary: &'a RenderSummary) -> Self {
        PlacementReport {
            template: &summary.template,
            output: summary.output.display().to_string(),
            canvas: summary.canvas,
            encoding: table.encoding(),
            max_magnitude: table.max_magnitude(),
            cities: &summary.cities,
            skipped: table.skipped(),
        }
    }
}

/// Writes the pixel placement of every city as pretty-printed JSON.
pub fn write_report(path: &Path, table: &CityTable, summary: &RenderSummary) -> Result<()> {
    let to_error = |source| MapError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_vec_pretty(&PlacementReport::new(table, summary))
        .map_err(|e| to_error(std::io::Error::other(e)))?;
    ensure_parent_dir(path).map_err(to_error)?;
    fs::write(path, json).map_err(to_error)
}
