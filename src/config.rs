use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::detection::HsvRange;
use crate::error::ConfigError;
use crate::game::GameRules;

/// Ball tracking settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Lower HSV bound, hue on the 0-180 scale
    pub hsv_lower: [u8; 3],

    /// Upper HSV bound, hue on the 0-180 scale
    pub hsv_upper: [u8; 3],

    /// Blobs smaller than this many pixels are ignored
    pub min_area: f32,

    /// Side of the square morphology kernel
    pub kernel_size: u32,

    /// Remove specks smaller than the kernel
    pub morph_open: bool,

    /// Fill holes smaller than the kernel
    pub morph_close: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        let range = HsvRange::default();
        Self {
            hsv_lower: range.lower,
            hsv_upper: range.upper,
            min_area: 300.0,
            kernel_size: 5,
            morph_open: true,
            morph_close: true,
        }
    }
}

/// Character display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Characters per line
    pub width: usize,

    /// Minimum time between display refreshes
    pub update_interval_ms: u64,

    /// How long the final score stays up before the display is cleared
    pub farewell_hold_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 16,
            update_interval_ms: 500,
            farewell_hold_ms: 2000,
        }
    }
}

/// Frame source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub frame_width: u32,
    pub frame_height: u32,

    /// Target frame rate of the game loop
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_width: 640,
            frame_height: 480,
            fps: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scoring rules and timing
    pub rules: GameRules,

    /// Ball color and blob filtering
    pub tracking: TrackingConfig,

    /// Character display
    pub display: DisplayConfig,

    /// Frame source
    pub capture: CaptureConfig,

    /// Log frame timing every N frames
    pub stats_interval_frames: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rules: GameRules::default(),
            tracking: TrackingConfig::default(),
            display: DisplayConfig::default(),
            capture: CaptureConfig::default(),
            stats_interval_frames: 100,
        }
    }
}

impl Config {
    /// Load configuration from `path`.
    /// Creates a default config file if it doesn't exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save(path)?;
            tracing::info!("Created default config at: {}", path.display());
            return Ok(config);
        }

        let config = Self::load(path)?;
        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Load and validate an existing configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let load_failed =
            |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::LoadFailed {
                path: path.display().to_string(),
                source,
            };

        let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        let config: Config = serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed =
            |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::SaveFailed {
                path: path.display().to_string(),
                source,
            };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| save_failed(Box::new(e)))?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| save_failed(Box::new(e)))?;
        fs::write(path, json).map_err(|e| save_failed(Box::new(e)))?;

        Ok(())
    }

    /// Default config file path (in app's base directory)
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let exe_path = env::current_exe().map_err(|_| ConfigError::NoConfigDir)?;
        let exe_dir = exe_path.parent().ok_or(ConfigError::NoConfigDir)?;

        Ok(exe_dir.join("config").join("config.json"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate()?;

        let range = HsvRange::new(self.tracking.hsv_lower, self.tracking.hsv_upper);
        if !range.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "HSV bounds {:?}..{:?} are inverted or hue exceeds 179",
                self.tracking.hsv_lower, self.tracking.hsv_upper
            )));
        }
        if !(self.tracking.min_area.is_finite() && self.tracking.min_area > 0.0) {
            return Err(ConfigError::Invalid("min_area must be > 0".to_string()));
        }
        if self.tracking.kernel_size == 0 {
            return Err(ConfigError::Invalid("kernel_size must be > 0".to_string()));
        }

        if self.display.width == 0 {
            return Err(ConfigError::Invalid("display width must be > 0".to_string()));
        }
        if self.display.update_interval_ms == 0 {
            return Err(ConfigError::Invalid("update_interval_ms must be > 0".to_string()));
        }

        let capture = &self.capture;
        if capture.frame_width < 2 || capture.frame_height == 0 || capture.fps == 0 {
            return Err(ConfigError::Invalid(format!(
                "capture {}x{} @ {} fps is not usable",
                capture.frame_width, capture.frame_height, capture.fps
            )));
        }
        if self.rules.bottom_threshold >= capture.frame_height as f32 {
            return Err(ConfigError::Invalid(format!(
                "bottom_threshold {} is below the {}px frame",
                self.rules.bottom_threshold, capture.frame_height
            )));
        }

        if self.stats_interval_frames == 0 {
            return Err(ConfigError::Invalid("stats_interval_frames must be > 0".to_string()));
        }

        Ok(())
    }
}
