use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::object_types::ObjectTypeRegistry;
use crate::object_types::ObjectTypeConfig;

/// Frame range and playback rate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub start_frame: u32,
    pub end_frame: u32,
    /// Frames per second while playing.
    pub frame_rate: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { start_frame: 1, end_frame: 689, frame_rate: 10.0 }
    }
}

impl PlaybackConfig {
    /// Timer period, `1000 / frame_rate` milliseconds.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_nanos((1e9 / self.frame_rate).round() as u64)
    }
}

/// Canvas layout knobs, all in screen pixels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    pub margin: f32,
    pub point_radius: f32,
    pub grid_size: f32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self { margin: 50.0, point_radius: 6.0, grid_size: 40.0 }
    }
}

/// Where frame records come from. Records are addressed as
/// `<base_path>/<sequence_name>_<frame>.txt`; a `base_path` starting with
/// `http://` or `https://` is fetched over HTTP, anything else is a directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_path: String,
    pub sequence_name: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { base_path: "labels".to_string(), sequence_name: "Sequence 02".to_string() }
    }
}

impl SourceConfig {
    pub fn is_remote(&self) -> bool {
        self.base_path.starts_with("http://") || self.base_path.starts_with("https://")
    }
}

/// Class ids that receive the overlays.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClassConfig {
    /// Objects of this class get animated radar rings.
    pub agent: i32,
    /// Centers of objects of this class are joined by a convex hull.
    pub resource: i32,
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self { agent: 0, resource: 4 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub playback: PlaybackConfig,
    pub visual: VisualConfig,
    pub source: SourceConfig,
    pub classes: ClassConfig,
    pub object_types: Vec<ObjectTypeConfig>,
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let playback = &self.playback;
        if playback.start_frame > playback.end_frame {
            return Err(ConfigError::Invalid(format!(
                "start_frame ({}) must not exceed end_frame ({})",
                playback.start_frame, playback.end_frame
            )));
        }
        if !(playback.frame_rate.is_finite() && playback.frame_rate > 0.0) {
            return Err(ConfigError::Invalid(format!("frame_rate must be positive, got {}", playback.frame_rate)));
        }
        if !(self.visual.grid_size.is_finite() && self.visual.grid_size > 0.0) {
            return Err(ConfigError::Invalid(format!("grid_size must be positive, got {}", self.visual.grid_size)));
        }
        if !(self.visual.margin.is_finite() && self.visual.margin >= 0.0) {
            return Err(ConfigError::Invalid(format!("margin must not be negative, got {}", self.visual.margin)));
        }
        if !(self.visual.point_radius.is_finite() && self.visual.point_radius >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "point_radius must not be negative, got {}",
                self.visual.point_radius
            )));
        }
        Ok(())
    }

    pub fn registry(&self) -> Result<ObjectTypeRegistry, ConfigError> {
        ObjectTypeRegistry::with_overrides(&self.object_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config.playback, PlaybackConfig::default());
        assert_eq!(config.visual.margin, 50.0);
        assert_eq!(config.source.sequence_name, "Sequence 02");
        assert_eq!(config.classes, ClassConfig { agent: 0, resource: 4 });
        assert_eq!(config.playback.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ViewerConfig::from_toml_str(
            r##"
            [playback]
            end_frame = 20
            frame_rate = 25

            [source]
            base_path = "https://example.com/labels"

            [[object_types]]
            class_id = 5
            name = "vehicle"
            preset = "BLUE"

            [[object_types]]
            class_id = 6
            name = "building"
            primary = "#8B4513"
            secondary = "#DEB887"
            prefix = "BLD"
            "##,
        )
        .unwrap();

        assert_eq!(config.playback.start_frame, 1);
        assert_eq!(config.playback.end_frame, 20);
        assert_eq!(config.playback.tick_interval(), Duration::from_millis(40));
        assert!(config.source.is_remote());
        assert_eq!(config.source.sequence_name, "Sequence 02");

        let registry = config.registry().unwrap();
        assert_eq!(registry.lookup(5).name, "VEHICLE");
        assert_eq!(registry.lookup(6).colors.primary, Rgba::rgb(0x8b, 0x45, 0x13));
        assert_eq!(registry.object_id(6, 0), "BLD_001");
        assert_eq!(registry.lookup(4).name, "RESOURCE");
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert!(matches!(
            ViewerConfig::from_toml_str("[playback]\nstart_frame = 10\nend_frame = 2"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(ViewerConfig::from_toml_str("[playback]\nframe_rate = 0"), Err(ConfigError::Invalid(_))));
        assert!(matches!(ViewerConfig::from_toml_str("[visual]\ngrid_size = -1"), Err(ConfigError::Invalid(_))));
        assert!(matches!(ViewerConfig::from_toml_str("[visual\n"), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn bad_color_is_a_parse_error() {
        let result = ViewerConfig::from_toml_str(
            "[[object_types]]\nclass_id = 1\nname = \"x\"\nprimary = \"#12\"\nsecondary = \"#ffffff\"",
        );
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }
}
