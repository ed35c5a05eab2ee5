// Canvas size used when the template root does not declare a usable width/height
pub const DEFAULT_CANVAS_WIDTH: f64 = 1000.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 500.0;

// Robinson planar extent in projection units (meters on the WGS84 sphere)
pub const ROBINSON_X_RANGE: f64 = 52_200_000.0;
pub const ROBINSON_Y_RANGE: f64 = 25_000_000.0;

// Re-centering offsets calibrated against the bundled world template.
// CRITICAL: OFFSET_Y is NOT half of ROBINSON_Y_RANGE. Both offsets are independent literals.
pub const ROBINSON_OFFSET_X: f64 = 23_200_000.0;
pub const ROBINSON_OFFSET_Y: f64 = 11_000_000.0;

// WGS84 semi-major axis, the sphere radius the projection is scaled by
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;

// Largest displayed marker radius; the biggest magnitude in a table maps to this
pub const MAX_MARKER_RADIUS: f64 = 10.0;

// Marker styling
pub const MARKER_STROKE_COLOR: &str = "#EF0000";
pub const MARKER_FILL_COLOR: &str = "rgba(255,179,179,0.5)";
pub const MARKER_STROKE_WIDTH: f64 = 0.5;
pub const CENTER_DOT_RADIUS: f64 = 1.5;
pub const CENTER_DOT_COLOR: &str = "black";
pub const LABEL_OFFSET_X: f64 = 8.0;
pub const LABEL_FONT_SIZE: &str = "10px";
pub const LABEL_FONT_FAMILY: &str = "Arial, sans-serif";
pub const LABEL_COLOR: &str = "black";

// Legend placement, measured from the bottom-left corner of the canvas
pub const LEGEND_MARGIN: f64 = 50.0;
pub const LEGEND_LABEL_OFFSET_X: f64 = 15.0;
pub const LEGEND_LABEL_OFFSET_Y: f64 = 5.0;
pub const LEGEND_FONT_SIZE: &str = "12px";
pub const LEGEND_LABEL: &str = "Max value";

// Element ids of the two injected groups
pub const MARKERS_GROUP_ID: &str = "city_markers";
pub const LEGEND_GROUP_ID: &str = "legend";

// Built-in template shipped inside the binary
pub const BUILTIN_TEMPLATE_NAME: &str = "world_template.svg";

// Text encodings tried in order when reading a city table
pub const TABLE_ENCODINGS: &[&str] = &["utf-8", "gbk", "iso-8859-1"];

pub const SETTINGS_FILE_NAME: &str = "citymap.ini";
