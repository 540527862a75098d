//! Viewer settings loaded from a JSON file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use usdview_math::CameraController;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "UsdView".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub pan_sensitivity: f64,
    pub orbit_sensitivity: f64,
    pub zoom_sensitivity: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            pan_sensitivity: CameraController::DEFAULT_PAN_SENSITIVITY,
            orbit_sensitivity: CameraController::DEFAULT_ORBIT_SENSITIVITY,
            zoom_sensitivity: CameraController::DEFAULT_ZOOM_SENSITIVITY,
        }
    }
}

/// Everything the viewer reads at startup. Every field is optional in the
/// file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    /// Linear RGBA behind the engine output
    pub background: [f64; 4],
    pub camera: CameraConfig,
    /// Overrides the stage's frames per second
    pub frames_per_second: Option<f64>,
    /// Stage opened when none is given on the command line
    pub stage: Option<PathBuf>,
    pub show_overlay: bool,
    /// Searched for plugInfo.json in addition to the environment
    pub plugin_paths: Vec<PathBuf>,
    /// Directory holding framework bundles
    pub bundle_root: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            background: [0.1, 0.1, 0.12, 1.0],
            camera: CameraConfig::default(),
            frames_per_second: None,
            stage: None,
            show_overlay: true,
            plugin_paths: Vec::new(),
            bundle_root: None,
        }
    }
}

impl ViewerConfig {
    /// Read `path`. A missing file yields the defaults; an unreadable or
    /// malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        if let Some(fps) = config.frames_per_second {
            anyhow::ensure!(fps > 0.0, "frames_per_second must be positive, got {}", fps);
        }
        Ok(config)
    }

    pub fn background_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.background;
        wgpu::Color { r, g, b, a }
    }

    /// Copy the sensitivities onto `camera`.
    pub fn apply_to_camera(&self, camera: &mut CameraController) {
        camera.pan_sensitivity = self.camera.pan_sensitivity;
        camera.orbit_sensitivity = self.camera.orbit_sensitivity;
        camera.zoom_sensitivity = self.camera.zoom_sensitivity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("usdview_config_does_not_exist.json");
        let _ = std::fs::remove_file(&path);

        let config = ViewerConfig::load(&path).unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
    }

    #[test]
    fn test_partial_json() {
        let config = ViewerConfig::from_json(
            r#"{ "window": { "title": "Shots" }, "frames_per_second": 30, "camera": { "zoom_sensitivity": 0.2 } }"#,
        )
        .unwrap();

        assert_eq!(config.window.title, "Shots");
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.frames_per_second, Some(30.0));
        assert_eq!(config.camera.zoom_sensitivity, 0.2);
        assert_eq!(
            config.camera.orbit_sensitivity,
            CameraController::DEFAULT_ORBIT_SENSITIVITY
        );
    }

    #[test]
    fn test_malformed_file_is_error() {
        let path = std::env::temp_dir().join(format!(
            "usdview_config_malformed_{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ not json").unwrap();

        assert!(ViewerConfig::load(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_rejects_non_positive_fps() {
        assert!(ViewerConfig::from_json(r#"{ "frames_per_second": 0 }"#).is_err());
    }

    #[test]
    fn test_apply_to_camera() {
        let config = ViewerConfig::from_json(r#"{ "camera": { "pan_sensitivity": 0.5 } }"#).unwrap();
        let mut camera = CameraController::default();
        config.apply_to_camera(&mut camera);

        assert_eq!(camera.pan_sensitivity, 0.5);
        assert_eq!(camera.zoom_sensitivity, CameraController::DEFAULT_ZOOM_SENSITIVITY);
    }

    #[test]
    fn test_background_color() {
        let mut config = ViewerConfig::default();
        config.background = [1.0, 0.5, 0.0, 1.0];
        let color = config.background_color();
        assert_eq!((color.r, color.g, color.b, color.a), (1.0, 0.5, 0.0, 1.0));
    }
}
