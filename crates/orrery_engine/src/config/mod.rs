//! Configuration system
//!
//! Every demo setting lives in [`OrreryConfig`]. Files are TOML or RON, picked by
//! extension, and every field has a default so partial files are valid.

use std::path::{Path, PathBuf};

pub use serde::{Deserialize, Serialize};

use crate::render::camera::CameraSettings;
use crate::render::scene::{LightingParams, SceneLayout};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents, ConfigFormat::from_path(path)?)
    }

    /// Load configuration from file, falling back to defaults when the file is absent
    fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            log::info!("Loading configuration from {:?}", path);
            Self::load_from_file(path)
        } else {
            log::info!("No configuration at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Parse configuration text in the given format
    fn parse(contents: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        match format {
            ConfigFormat::Toml => toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Ron => ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Window creation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Initial width in screen coordinates
    pub width: u32,
    /// Initial height in screen coordinates
    pub height: u32,
    /// Title bar text
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Orrery".to_string(),
        }
    }
}

/// Particle pool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Fixed number of particles in the pool
    pub capacity: usize,
    /// Seed for the particle random source; `None` draws one from the OS
    pub seed: Option<u64>,
    /// Position every particle starts from and respawns at
    pub spawn_position: [f32; 3],
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            seed: None,
            spawn_position: [-0.19, 0.90, 0.0],
        }
    }
}

/// Scene placement and lighting
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Object placement constants
    pub layout: SceneLayout,
    /// Light and clear colors
    pub lighting: LightingParams,
}

/// Asset file locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// OBJ mesh shared by the planet and the sun
    pub planet_mesh: PathBuf,
    /// Diffuse texture for the planet
    pub planet_texture: PathBuf,
    /// Directory holding right/left/top/bottom/front/back skybox faces
    pub skybox_directory: PathBuf,
    /// File extension of the skybox faces
    pub skybox_extension: String,
    /// Directory holding compiled `*.spv` shaders
    pub shader_directory: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            planet_mesh: PathBuf::from("resources/objects/planet/planet.obj"),
            planet_texture: PathBuf::from("resources/textures/container2.png"),
            skybox_directory: PathBuf::from("resources/textures/skybox"),
            skybox_extension: "jpg".to_string(),
            shader_directory: PathBuf::from("target/shaders"),
        }
    }
}

impl AssetConfig {
    /// Path of a compiled shader stage, e.g. `shader_path("lit", "vert")`
    pub fn shader_path(&self, program: &str, stage: &str) -> PathBuf {
        self.shader_directory.join(format!("{program}.{stage}.spv"))
    }
}

/// Vulkan renderer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Application name reported to the Vulkan driver
    pub application_name: String,
    /// Maximum frames in flight
    pub max_frames_in_flight: usize,
    /// Whether to enable Vulkan validation layers (debug builds only)
    pub enable_validation: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            application_name: "Orrery".to_string(),
            max_frames_in_flight: 2,
            enable_validation: cfg!(debug_assertions),
        }
    }
}

/// Top-level demo configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrreryConfig {
    /// Window settings
    pub window: WindowConfig,
    /// Camera start state and tuning
    pub camera: CameraSettings,
    /// Particle pool settings
    pub particles: ParticleConfig,
    /// Scene layout and lighting
    pub scene: SceneConfig,
    /// Asset paths
    pub assets: AssetConfig,
    /// Renderer settings
    pub renderer: RendererConfig,
}

impl Config for OrreryConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_demo_constants() {
        let config = OrreryConfig::default();

        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.particles.capacity, 10_000);
        assert_eq!(config.particles.spawn_position, [-0.19, 0.90, 0.0]);
        assert_eq!(config.camera.position, [0.0, 0.0, 10.0]);
        assert_eq!(config.renderer.max_frames_in_flight, 2);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = r#"
            [window]
            title = "Test"

            [particles]
            capacity = 12
            seed = 7
        "#;

        let config = OrreryConfig::parse(text, ConfigFormat::Toml).unwrap();
        assert_eq!(config.window.title, "Test");
        assert_eq!(config.window.width, 800);
        assert_eq!(config.particles.capacity, 12);
        assert_eq!(config.particles.seed, Some(7));
        assert_eq!(config.assets, AssetConfig::default());
    }

    #[test]
    fn test_ron_parse() {
        let text = "(window: (width: 1024, height: 768), particles: (capacity: 3))";
        let config = OrreryConfig::parse(text, ConfigFormat::Ron).unwrap();

        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 768);
        assert_eq!(config.particles.capacity, 3);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let result = OrreryConfig::parse("[window\nwidth = ", ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")).unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.ron")).unwrap(), ConfigFormat::Ron);
        assert!(matches!(
            ConfigFormat::from_path(Path::new("a.json")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("orrery_config_{}.toml", std::process::id()));
        let mut config = OrreryConfig::default();
        config.particles.seed = Some(42);
        config.window.title = "Saved".to_string();

        config.save_to_file(&path).unwrap();
        let loaded = OrreryConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = OrreryConfig::load_or_default("does/not/exist.toml").unwrap();
        assert_eq!(config, OrreryConfig::default());
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let text = include_str!("../../../../resources/config/orrery.toml");
        let config = OrreryConfig::parse(text, ConfigFormat::Toml).unwrap();
        let defaults = OrreryConfig::default();

        assert_eq!(config.window, defaults.window);
        assert_eq!(config.camera, defaults.camera);
        assert_eq!(config.particles, defaults.particles);
        assert_eq!(config.scene, defaults.scene);
        assert_eq!(config.assets, defaults.assets);
        assert!(config.renderer.enable_validation);
    }

    #[test]
    fn test_shader_path() {
        let assets = AssetConfig::default();
        assert_eq!(assets.shader_path("lit", "vert"), PathBuf::from("target/shaders/lit.vert.spv"));
    }
}
