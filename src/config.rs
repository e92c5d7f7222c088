//! Application configuration
//!
//! Stored as RON in the platform config directory. Missing fields take their
//! defaults, and a fresh file is written on first launch so players have
//! something to edit.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("{0}")]
    Invalid(String),
}

/// Player movement and HUD tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Speed multiplier applied to player movement
    pub speed: f32,
    /// Seconds of held input to accelerate to full speed
    pub seconds_to_full_speed: f32,
    /// Firearm id every new player starts with
    pub default_firearm: String,
    /// Seconds the firearm name stays on screen after spawning
    pub gun_popup_length: u32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            seconds_to_full_speed: 0.4,
            default_firearm: "default".to_string(),
            gun_popup_length: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language file name under `<assets>/lang` (without extension)
    pub language: String,
    pub vsync: bool,
    /// Frame cap when vsync is off
    pub fps: u32,
    pub play_sounds: bool,
    pub sound_effect_volume: f32,
    pub player: PlayerSettings,
    /// Root of the game data (firearms, lang, sounds)
    pub assets_dir: PathBuf,
    /// Where save snapshots are written and browsed
    pub saves_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "en_US".to_string(),
            vsync: true,
            fps: 60,
            play_sounds: true,
            sound_effect_volume: 1.0,
            player: PlayerSettings::default(),
            assets_dir: PathBuf::from("assets"),
            saves_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rebarbs")
                .join("saves"),
        }
    }
}

/// Frame rate assumed when vsync is on
pub const VSYNC_FPS: u32 = 60;

impl Config {
    /// Default location of the config file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rebarbs")
            .join("config.ron")
    }

    /// Load the config at `path`, writing the defaults there if it doesn't exist
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save(path)?;
            tracing::info!(path = %path.display(), "wrote default configuration");
            return Ok(config);
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = ron::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .indentor("  ".to_string());
        let contents = ron::ser::to_string_pretty(self, pretty)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.vsync && self.fps == 0 {
            return Err(ConfigError::Invalid("VSync not enabled and FPS set to 0".to_string()));
        }
        if self.player.seconds_to_full_speed < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "player.seconds_to_full_speed must not be negative (got {})",
                self.player.seconds_to_full_speed
            )));
        }
        Ok(())
    }

    /// Frames per second the simulation actually runs at
    pub fn effective_fps(&self) -> u32 {
        if self.vsync {
            VSYNC_FPS
        } else {
            self.fps
        }
    }

    pub fn firearms_dir(&self) -> PathBuf {
        self.assets_dir.join("firearms")
    }

    pub fn lang_dir(&self) -> PathBuf {
        self.assets_dir.join("lang")
    }

    pub fn sounds_dir(&self) -> PathBuf {
        self.assets_dir.join("sounds")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_launch_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rebarbs").join("config.ron");

        let config = Config::load_or_create(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        // Second launch reads the same thing back
        assert_eq!(Config::load_or_create(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "(vsync: false, fps: 144, player: (speed: 2.0))").unwrap();

        let config = Config::load_or_create(&path).unwrap();
        assert_eq!(config.effective_fps(), 144);
        assert_eq!(config.player.speed, 2.0);
        assert_eq!(config.player.default_firearm, "default");
        assert_eq!(config.language, "en_US");
    }

    #[test]
    fn test_zero_fps_without_vsync_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "(vsync: false, fps: 0)").unwrap();

        assert!(matches!(Config::load_or_create(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_effective_fps_with_vsync() {
        let config = Config {
            fps: 15,
            ..Config::default()
        };
        assert_eq!(config.effective_fps(), VSYNC_FPS);
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "not ron at all {{").unwrap();

        assert!(matches!(Config::load_or_create(&path), Err(ConfigError::Parse(_))));
    }
}
