use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::SETTINGS_FILE_NAME;
use crate::error::{MapError, Result};
use crate::markers::{LegendStyle, MarkerStyle};
use crate::render::RenderConfig;
use crate::utils::{ensure_parent_dir, get_app_dir};

/// User-editable settings from `citymap.ini`. The projection calibration is not configurable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub template: Option<String>,
    pub marker: MarkerStyle,
    pub legend: LegendStyle,
}

impl Settings {
    /// Loads the settings file next to the executable, or defaults if there is none.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut settings = Settings::default();
        if !config_path.exists() {
            return Ok(settings);
        }

        let to_error = |e: std::io::Error| MapError::Settings {
            path: config_path.to_path_buf(),
            reason: e.to_string(),
        };

        let file = File::open(config_path).map_err(to_error)?;
        let reader = BufReader::new(file);
        let mut config_map = HashMap::new();

        for line in reader.lines() {
            let line = line.map_err(to_error)?;
            if line.trim_start().starts_with('#') || line.trim().is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                config_map.insert(key.trim().to_string(), value.trim().trim_matches('"').to_string());
            }
        }

        if let Some(template) = config_map.get("template") {
            settings.template = Some(template.clone());
        }

        let marker = &mut settings.marker;
        set_string(&config_map, "stroke_color", &mut marker.stroke_color);
        set_string(&config_map, "fill_color", &mut marker.fill_color);
        set_number(&config_map, "stroke_width", &mut marker.stroke_width);
        set_number(&config_map, "dot_radius", &mut marker.dot_radius);
        set_string(&config_map, "dot_color", &mut marker.dot_color);
        set_number(&config_map, "label_offset", &mut marker.label_offset);
        set_string(&config_map, "font_size", &mut marker.font_size);
        set_string(&config_map, "font_family", &mut marker.font_family);
        set_string(&config_map, "label_color", &mut marker.label_color);

        let legend = &mut settings.legend;
        set_string(&config_map, "legend_label", &mut legend.label);
        set_number(&config_map, "legend_margin", &mut legend.margin);
        set_string(&config_map, "legend_font_size", &mut legend.font_size);

        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        let to_error = |e: std::io::Error| MapError::Settings {
            path: config_path.to_path_buf(),
            reason: e.to_string(),
        };
        ensure_parent_dir(config_path).map_err(to_error)?;

        let mut content = String::new();
        content.push_str("# CityMap Configuration File\n");

        if let Some(ref template) = self.template {
            content.push_str(&format!("template = \"{}\"\n", template));
        }
        let m = &self.marker;
        content.push_str(&format!("stroke_color = {}\n", m.stroke_color));
        content.push_str(&format!("fill_color = {}\n", m.fill_color));
        content.push_str(&format!("stroke_width = {}\n", m.stroke_width));
        content.push_str(&format!("dot_radius = {}\n", m.dot_radius));
        content.push_str(&format!("dot_color = {}\n", m.dot_color));
        content.push_str(&format!("label_offset = {}\n", m.label_offset));
        content.push_str(&format!("font_size = {}\n", m.font_size));
        content.push_str(&format!("font_family = {}\n", m.font_family));
        content.push_str(&format!("label_color = {}\n", m.label_color));
        let l = &self.legend;
        content.push_str(&format!("legend_label = \"{}\"\n", l.label));
        content.push_str(&format!("legend_margin = {}\n", l.margin));
        content.push_str(&format!("legend_font_size = {}\n", l.font_size));

        std::fs::write(config_path, content).map_err(to_error)
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            marker: self.marker.clone(),
            legend: self.legend.clone(),
            ..RenderConfig::default()
        }
    }

    pub fn config_path() -> PathBuf {
        get_app_dir().join(SETTINGS_FILE_NAME)
    }
}

fn set_string(config_map: &HashMap<String, String>, key: &str, target: &mut String) {
    if let Some(value) = config_map.get(key) {
        *target = value.clone();
    }
}

fn set_number(config_map: &HashMap<String, String>, key: &str, target: &mut f64) {
    if let Some(value) = config_map.get(key) {
        match value.parse::<f64>() {
            Ok(number) if number.is_finite() => *target = number,
            _ => tracing::warn!("ignoring {} = {:?}: not a number", key, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("nope.ini")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn overrides_known_keys_and_ignores_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("citymap.ini");
        std::fs::write(
            &path,
            "# comment\n\
             template = \"maps/robinson.svg\"\n\
             stroke_color = #123456\n\
             stroke_width = 1.25\n\
             dot_radius = big\n\
             legend_label = \"最大值\"\n\
             colour = purple\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.template.as_deref(), Some("maps/robinson.svg"));
        assert_eq!(settings.marker.stroke_color, "#123456");
        assert_eq!(settings.marker.stroke_width, 1.25);
        assert_eq!(settings.marker.dot_radius, 1.5);
        assert_eq!(settings.legend.label, "最大值");

        let config = settings.render_config();
        assert_eq!(config.marker.stroke_color, "#123456");
        assert_eq!(config.projection, Default::default());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("citymap.ini");

        let mut settings = Settings::default();
        settings.template = Some("world.svg".to_string());
        settings.marker.font_family = "Noto Sans, sans-serif".to_string();
        settings.legend.margin = 30.0;
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }
}
