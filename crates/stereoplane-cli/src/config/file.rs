use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilePlaneConfig {
    pub depth_threshold_factor: Option<f64>,
    pub target_normal: Option<[f64; 3]>,
    pub up_axis: Option<[f64; 3]>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileRotationConfig {
    pub enabled: Option<bool>,
    /// Degrees per second.
    pub speed: Option<f64>,
    pub pause_duration: Option<f64>,
    pub bond_refresh_interval: Option<f64>,
    pub resume_after_inactivity: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileViewerConfig {
    pub enabled: Option<bool>,
    pub forward: Option<[f64; 3]>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSpinConfig {
    pub duration: Option<f64>,
    pub fps: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub plane: Option<FilePlaneConfig>,
    pub rotation: Option<FileRotationConfig>,
    pub viewer: Option<FileViewerConfig>,
    pub spin: Option<FileSpinConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_sections() {
        let config = FileConfig::from_toml(
            r#"
            [plane]
            depth-threshold-factor = 0.5
            target-normal = [0.0, 0.0, -1.0]

            [rotation]
            speed = 45.0
            pause-duration = 0.5

            [viewer]
            forward = [0.0, 0.0, 1.0]

            [spin]
            fps = 30.0
            "#,
        )
        .unwrap();

        let plane = config.plane.unwrap();
        assert_eq!(plane.depth_threshold_factor, Some(0.5));
        assert_eq!(plane.target_normal, Some([0.0, 0.0, -1.0]));
        assert_eq!(plane.up_axis, None);
        assert_eq!(config.rotation.unwrap().speed, Some(45.0));
        assert_eq!(config.viewer.unwrap().forward, Some([0.0, 0.0, 1.0]));
        assert_eq!(config.spin.unwrap().fps, Some(30.0));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::from_toml("[rotation]\nspeeed = 10.0\n").is_err());
        assert!(FileConfig::from_toml("[camera]\nfov = 60\n").is_err());
    }

    #[test]
    fn from_file_wraps_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[plane]\ndepth-threshold-factor = \"wide\"\n").unwrap();
        match FileConfig::from_file(&path) {
            Err(CliError::FileParsing { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
