//! The marker compositor: projects a city table onto a template and writes the result.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::markers::{legend_group, markers_group, place_cities, LegendStyle, MarkerStyle, PlacedCity};
use crate::projection::{CanvasSize, ProjectionFrame};
use crate::svg_template::SvgTemplate;
use crate::table::CityTable;

/// Everything the compositor needs besides its inputs. Defaults are the calibrated values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub projection: ProjectionFrame,
    pub marker: MarkerStyle,
    pub legend: LegendStyle,
}

/// What was written by one compositor run.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSummary {
    pub template: String,
    pub output: PathBuf,
    pub canvas: CanvasSize,
    pub cities: Vec<PlacedCity>,
}

/// Loads the template at `template`, overlays the table and writes `output`.
pub fn render_map(
    template: impl AsRef<Path>,
    output: impl AsRef<Path>,
    table: &CityTable,
    config: &RenderConfig,
) -> Result<RenderSummary> {
    let template = SvgTemplate::load(template.as_ref())?;
    composite(&template, output.as_ref(), table, config)
}

/// Same as [`render_map`] for template text already in memory.
pub fn render_map_from_str(
    template_text: &str,
    template_name: &str,
    output: impl AsRef<Path>,
    table: &CityTable,
    config: &RenderConfig,
) -> Result<RenderSummary> {
    let template = SvgTemplate::parse(template_text, template_name)?;
    composite(&template, output.as_ref(), table, config)
}

/// Appends the legend and the city markers to `template` and writes the document to `output`.
///
/// An empty table is fine and produces a legend-only map.
pub fn composite(
    template: &SvgTemplate,
    output: &Path,
    table: &CityTable,
    config: &RenderConfig,
) -> Result<RenderSummary> {
    let canvas = template.canvas();
    let cities = place_cities(table, &config.projection, canvas);

    let groups = [
        legend_group(canvas, &config.marker, &config.legend),
        markers_group(&cities, &config.marker),
    ];
    template.write_to(&groups, output)?;

    info!(
        "wrote {} city markers onto {} ({}x{}) -> {}",
        cities.len(),
        template.name(),
        canvas.width,
        canvas.height,
        output.display()
    );

    Ok(RenderSummary {
        template: template.name().to_string(),
        output: output.to_path_buf(),
        canvas,
        cities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="1000px" height="500px"><rect width="1000" height="500"/></svg>"#;

    #[test]
    fn summary_lists_cities_in_table_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("map.svg");
        let table = CityTable::from_entries([("Tokyo", 139.69, 35.69, 100.0), ("Lagos", 3.39, 6.45, 50.0)]);

        let summary = render_map_from_str(TEMPLATE, "t.svg", &out, &table, &RenderConfig::default()).unwrap();

        let names: Vec<&str> = summary.cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Tokyo", "Lagos"]);
        assert_eq!(summary.canvas.width, 1000.0);
        assert!(out.is_file());

        // Tokyo lies east of Lagos and further north
        let (tokyo, lagos) = (&summary.cities[0], &summary.cities[1]);
        assert!(tokyo.x > lagos.x);
        assert!(tokyo.y < lagos.y);
    }

    #[test]
    fn custom_style_flows_into_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("map.svg");
        let table = CityTable::from_entries([("Lima", -77.04, -12.05, 3.0)]);
        let mut config = RenderConfig::default();
        config.marker.stroke_color = "#0000FF".to_string();
        config.legend.label = "Peak".to_string();

        render_map_from_str(TEMPLATE, "t.svg", &out, &table, &config).unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert!(written.contains(r##"stroke="#0000FF""##));
        assert!(written.contains(">Peak</text>"));
        assert!(!written.contains("#EF0000"));
    }
}
