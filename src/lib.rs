//! Overlay a tab-delimited table of cities onto a Robinson world map SVG.
//!
//! The pipeline has two steps: [`load_table`] reads and normalizes the table, and
//! [`render_map`] projects each city onto the template canvas, appends the markers and a
//! legend to the document, and writes it out.

pub mod constants;
pub mod error;
pub mod markers;
pub mod projection;
pub mod render;
pub mod report;
pub mod settings;
pub mod svg_template;
pub mod table;
pub mod utils;

pub use error::{MapError, Result};
pub use render::{composite, render_map, render_map_from_str, RenderConfig, RenderSummary};
pub use settings::Settings;
pub use svg_template::SvgTemplate;
pub use table::{load_table, CityRecord, CityTable, RowIssue, SkipReason};
