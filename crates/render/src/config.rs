use meshview_assets::{GridParams, PLACEHOLDER_TEXEL};
use meshview_input::ViewSettings;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Viewer tuning. Every field has a default, so an empty document is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Animation time added per rendered frame.
    pub time_step: f32,
    pub clear_color: [f32; 4],
    pub placeholder_texel: [u8; 4],
    /// Eye-space light position.
    pub light_position: [f32; 3],
    pub view: ViewSettings,
    pub grid: GridParams,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 300.0,
            time_step: 0.01,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            placeholder_texel: PLACEHOLDER_TEXEL,
            light_position: [0.0, 10.0, 5.0],
            view: ViewSettings::default(),
            grid: GridParams::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid {
                field: "fov_degrees",
                reason: format!("{} is outside (0, 180)", self.fov_degrees),
            });
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(ConfigError::Invalid {
                field: "near/far",
                reason: format!("need 0 < near < far, got {} and {}", self.near, self.far),
            });
        }
        if self.view.wheel_divisor == 0.0 {
            return Err(ConfigError::Invalid {
                field: "view.wheel_divisor",
                reason: "must be nonzero".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        let config = ViewerConfig::from_yaml("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.far, 300.0);
        assert_eq!(config.placeholder_texel, [255, 0, 0, 255]);
        assert_eq!(config.grid.columns, 50);
    }

    #[test]
    fn partial_override() {
        let config = ViewerConfig::from_yaml(
            "fov_degrees: 60\nview:\n  wheel_divisor: 50\ngrid:\n  columns: 10\n",
        )
        .unwrap();
        assert_eq!(config.fov_degrees, 60.0);
        assert_eq!(config.view.wheel_divisor, 50.0);
        assert_eq!(config.view.drag_degrees_per_pixel, 0.1);
        assert_eq!(config.grid.columns, 10);
        assert_eq!(config.grid.rows, 50);
    }

    #[test]
    fn rejects_inverted_clip_planes() {
        let err = ViewerConfig::from_yaml("near: 10\nfar: 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"time_step: 0.02\n").unwrap();
        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.time_step, 0.02);
    }
}
