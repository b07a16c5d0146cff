//! Helper configuration.
//!
//! Everything here has a default matching the stock pipeline, so
//! `HelperConfig::default()` is a complete setup. Configs can also be read
//! from JSON, where any omitted field keeps its default.

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::deferred::{PassKind, DEFAULT_MAX_POINT_LIGHTS};
use crate::params_io::ParamsIoResult;

/// Where parameter documents live under the config root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamsLayout {
    /// `<root>/<name>.json`
    #[default]
    Flat,
    /// `<root>/renderers/<name>.json`
    Renderers,
}

/// Column packing settings for the parameter GUI, in pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiLayoutConfig {
    /// Distance of the first column and of each column top from the edge.
    pub margin: f32,
    pub column_width: f32,
    pub column_gap: f32,
    /// Space below a group without color widgets.
    pub pass_padding: f32,
    /// Space below a group with color widgets, leaving room for the picker.
    pub color_offset: f32,
    pub header_height: f32,
    pub row_height: f32,
}

impl Default for GuiLayoutConfig {
    fn default() -> Self {
        Self {
            margin: 10.0,
            column_width: 240.0,
            column_gap: 10.0,
            pass_padding: 10.0,
            color_offset: 280.0,
            header_height: 20.0,
            row_height: 20.0,
        }
    }
}

/// Configuration of a [`DeferredHelper`](crate::DeferredHelper).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    /// Directory holding parameter documents.
    pub config_root: PathBuf,
    pub layout: ParamsLayout,
    /// Passes to create, in processing order.
    pub passes: Vec<PassKind>,
    /// Lights added to the point-light pass at setup.
    pub default_point_lights: usize,
    /// Lights uploaded per frame.
    pub max_point_lights: usize,
    /// Also draw point lights into the shadow map.
    pub shadow_phase_lights: bool,
    /// Clip plane handed to draw callbacks (xyz = normal, w = distance).
    pub clip_plane: [f32; 4],
    /// Linear RGBA fill of the background pass.
    pub background_color: [f32; 4],
    pub gui: GuiLayoutConfig,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            config_root: PathBuf::from("json"),
            layout: ParamsLayout::Flat,
            passes: PassKind::ALL.to_vec(),
            default_point_lights: DEFAULT_MAX_POINT_LIGHTS,
            max_point_lights: DEFAULT_MAX_POINT_LIGHTS,
            shadow_phase_lights: false,
            clip_plane: [0.0; 4],
            background_color: [10.0 / 255.0, 12.0 / 255.0, 24.0 / 255.0, 1.0],
            gui: GuiLayoutConfig::default(),
        }
    }
}

impl HelperConfig {
    /// Read a config from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ParamsIoResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Parameter document path for a helper called `name`.
    pub fn params_path(&self, name: &str) -> PathBuf {
        let file = format!("{}.json", name);
        match self.layout {
            ParamsLayout::Renderers => self.config_root.join("renderers").join(file),
            ParamsLayout::Flat => self.config_root.join(file),
        }
    }

    pub fn background_color(&self) -> LinearRgba {
        let [r, g, b, a] = self.background_color;
        LinearRgba::new(r, g, b, a)
    }

    pub fn clip_plane(&self) -> Vec4 {
        Vec4::from_array(self.clip_plane)
    }

    pub fn with_config_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config_root = root.into();
        self
    }

    pub fn with_layout(mut self, layout: ParamsLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_passes(mut self, passes: impl Into<Vec<PassKind>>) -> Self {
        self.passes = passes.into();
        self
    }

    pub fn with_default_point_lights(mut self, count: usize) -> Self {
        self.default_point_lights = count;
        self
    }

    pub fn with_max_point_lights(mut self, count: usize) -> Self {
        self.max_point_lights = count;
        self
    }

    pub fn with_shadow_phase_lights(mut self, enabled: bool) -> Self {
        self.shadow_phase_lights = enabled;
        self
    }

    pub fn with_clip_plane(mut self, plane: Vec4) -> Self {
        self.clip_plane = plane.to_array();
        self
    }

    pub fn with_background_color(mut self, color: LinearRgba) -> Self {
        self.background_color = [color.red, color.green, color.blue, color.alpha];
        self
    }

    pub fn with_gui(mut self, gui: GuiLayoutConfig) -> Self {
        self.gui = gui;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_params_path() {
        let config = HelperConfig::default();
        assert_eq!(
            config.params_path("scene"),
            PathBuf::from("json").join("scene.json")
        );
        let nested = config.with_layout(ParamsLayout::Renderers);
        assert_eq!(
            nested.params_path("scene"),
            PathBuf::from("json").join("renderers").join("scene.json")
        );
    }

    #[test]
    fn test_passes_accept_every_pass_name() {
        let names: Vec<_> = PassKind::ALL.iter().map(|kind| kind.name()).collect();
        let config: HelperConfig = serde_json::from_value(serde_json::json!({ "passes": names })).unwrap();
        assert_eq!(config.passes, PassKind::ALL.to_vec());
    }

    #[test]
    fn test_default_background_color() {
        let color = HelperConfig::default().background_color();
        assert!((color.red - 10.0 / 255.0).abs() < 1e-6);
        assert!((color.blue - 24.0 / 255.0).abs() < 1e-6);
        assert_eq!(color.alpha, 1.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "max_point_lights": 12, "passes": ["Fog", "Bloom"], "layout": "renderers" }}"#
        )
        .unwrap();

        let config = HelperConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.max_point_lights, 12);
        assert_eq!(config.passes, vec![PassKind::Fog, PassKind::Bloom]);
        assert_eq!(config.layout, ParamsLayout::Renderers);
        assert_eq!(config.default_point_lights, DEFAULT_MAX_POINT_LIGHTS);
        assert_eq!(config.gui, GuiLayoutConfig::default());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(HelperConfig::from_json_file(dir.path().join("nope.json")).is_err());
    }
}
