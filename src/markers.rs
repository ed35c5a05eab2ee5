//! Synthesis of the city marker group and the legend group.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::projection::{CanvasSize, ProjectionFrame};
use crate::table::CityTable;

/// A generated SVG element, written after the template content.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgElement {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub text: Option<String>,
    pub children: Vec<SvgElement>,
}

impl SvgElement {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl ToString) -> Self {
        self.attrs.push((name, value.to_string()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: SvgElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub stroke_color: String,
    pub fill_color: String,
    pub stroke_width: f64,
    pub dot_radius: f64,
    pub dot_color: String,
    pub label_offset: f64,
    pub font_size: String,
    pub font_family: String,
    pub label_color: String,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            stroke_color: MARKER_STROKE_COLOR.to_string(),
            fill_color: MARKER_FILL_COLOR.to_string(),
            stroke_width: MARKER_STROKE_WIDTH,
            dot_radius: CENTER_DOT_RADIUS,
            dot_color: CENTER_DOT_COLOR.to_string(),
            label_offset: LABEL_OFFSET_X,
            font_size: LABEL_FONT_SIZE.to_string(),
            font_family: LABEL_FONT_FAMILY.to_string(),
            label_color: LABEL_COLOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendStyle {
    pub label: String,
    pub margin: f64,
    pub font_size: String,
}

impl Default for LegendStyle {
    fn default() -> Self {
        Self {
            label: LEGEND_LABEL.to_string(),
            margin: LEGEND_MARGIN,
            font_size: LEGEND_FONT_SIZE.to_string(),
        }
    }
}

/// A city resolved to canvas pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedCity {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub magnitude: f64,
    pub scaled_radius: f64,
    pub x: f64,
    pub y: f64,
}

/// Projects every city of the table onto the canvas, in table order.
pub fn place_cities(table: &CityTable, frame: &ProjectionFrame, canvas: CanvasSize) -> Vec<PlacedCity> {
    table
        .iter()
        .map(|(name, record)| {
            let (x, y) = frame.place(record.longitude, record.latitude, canvas);
            PlacedCity {
                name: name.to_string(),
                longitude: record.longitude,
                latitude: record.latitude,
                magnitude: record.magnitude,
                scaled_radius: record.scaled_radius,
                x,
                y,
            }
        })
        .collect()
}

fn scaled_disc(cx: f64, cy: f64, r: f64, style: &MarkerStyle) -> SvgElement {
    SvgElement::new("circle")
        .attr("cx", cx)
        .attr("cy", cy)
        .attr("r", r)
        .attr("stroke", &style.stroke_color)
        .attr("fill", &style.fill_color)
        .attr("stroke-width", style.stroke_width)
}

/// Disc, center dot and name label for each city, under one `<g id="city_markers">`.
pub fn markers_group(cities: &[PlacedCity], style: &MarkerStyle) -> SvgElement {
    let mut group = SvgElement::new("g").attr("id", MARKERS_GROUP_ID);

    for city in cities {
        group = group
            .child(scaled_disc(city.x, city.y, city.scaled_radius, style))
            .child(
                SvgElement::new("circle")
                    .attr("cx", city.x)
                    .attr("cy", city.y)
                    .attr("r", style.dot_radius)
                    .attr("fill", &style.dot_color),
            )
            .child(
                SvgElement::new("text")
                    .attr("x", city.x + style.label_offset)
                    .attr("y", city.y)
                    .attr("font-size", &style.font_size)
                    .attr("fill", &style.label_color)
                    .attr("font-family", &style.font_family)
                    .text(city.name.as_str()),
            );
    }

    group
}

/// Reference disc of the maximum radius near the bottom-left corner, with its label.
pub fn legend_group(canvas: CanvasSize, marker: &MarkerStyle, legend: &LegendStyle) -> SvgElement {
    let x = legend.margin;
    let y = canvas.height - legend.margin;

    SvgElement::new("g")
        .attr("id", LEGEND_GROUP_ID)
        .child(scaled_disc(x, y, MAX_MARKER_RADIUS, marker))
        .child(
            SvgElement::new("text")
                .attr("x", x + LEGEND_LABEL_OFFSET_X)
                .attr("y", y + LEGEND_LABEL_OFFSET_Y)
                .attr("font-size", &legend.font_size)
                .attr("fill", &marker.label_color)
                .attr("font-family", &marker.font_family)
                .text(legend.label.as_str()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: CanvasSize = CanvasSize {
        width: 1000.0,
        height: 500.0,
    };

    #[test]
    fn three_elements_per_city_in_table_order() {
        let table = CityTable::from_entries([("Tokyo", 139.69, 35.69, 100.0), ("Lagos", 3.39, 6.45, 50.0)]);
        let cities = place_cities(&table, &ProjectionFrame::default(), CANVAS);
        let group = markers_group(&cities, &MarkerStyle::default());

        assert_eq!(group.get_attr("id"), Some("city_markers"));
        let tags: Vec<&str> = group.children.iter().map(|c| c.tag).collect();
        assert_eq!(tags, vec!["circle", "circle", "text", "circle", "circle", "text"]);

        assert_eq!(group.children[0].get_attr("r"), Some("10"));
        assert_eq!(group.children[3].get_attr("r"), Some("5"));
        assert_eq!(group.children[1].get_attr("r"), Some("1.5"));
        assert_eq!(group.children[2].text.as_deref(), Some("Tokyo"));
        assert_eq!(group.children[5].text.as_deref(), Some("Lagos"));
    }

    #[test]
    fn label_sits_to_the_right_of_the_center() {
        let table = CityTable::from_entries([("Quito", -78.47, -0.18, 1.0)]);
        let cities = place_cities(&table, &ProjectionFrame::default(), CANVAS);
        let group = markers_group(&cities, &MarkerStyle::default());

        let cx: f64 = group.children[0].get_attr("cx").unwrap().parse().unwrap();
        let tx: f64 = group.children[2].get_attr("x").unwrap().parse().unwrap();
        assert_eq!(tx, cx + 8.0);
        assert_eq!(group.children[0].get_attr("cy"), group.children[2].get_attr("y"));
    }

    #[test]
    fn empty_table_gives_an_empty_marker_group() {
        let group = markers_group(&[], &MarkerStyle::default());
        assert!(group.children.is_empty());
    }

    #[test]
    fn legend_is_anchored_bottom_left() {
        let legend = legend_group(CANVAS, &MarkerStyle::default(), &LegendStyle::default());

        assert_eq!(legend.get_attr("id"), Some("legend"));
        let disc = &legend.children[0];
        assert_eq!(disc.get_attr("cx"), Some("50"));
        assert_eq!(disc.get_attr("cy"), Some("450"));
        assert_eq!(disc.get_attr("r"), Some("10"));
        assert_eq!(disc.get_attr("stroke"), Some("#EF0000"));

        let label = &legend.children[1];
        assert_eq!(label.get_attr("x"), Some("65"));
        assert_eq!(label.get_attr("y"), Some("455"));
        assert_eq!(label.get_attr("font-size"), Some("12px"));
        assert_eq!(label.text.as_deref(), Some("Max value"));
    }
}
