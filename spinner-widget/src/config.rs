use anyhow::{anyhow, ensure, Result};
use serde::Deserialize;
use std::fs;
use tiny_skia::Color;
use tracing::{info, warn};

/// Immutable knobs of one spinner instance, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct SpinnerConfig {
    pub circle_color: Color,
    pub background_color: Color,
    /// Discrete rotation slots per full cycle.
    pub position_count: usize,
    pub frames_per_second: u32,
}

impl Default for SpinnerConfig {
    fn default() -> Self {
        Self {
            circle_color: Color::from_rgba8(255, 255, 255, 255),
            background_color: Color::from_rgba8(0, 0, 0, 255),
            position_count: default_position_count(),
            frames_per_second: default_frames_per_second(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub spinner: SpinnerSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowSection {
    #[serde(default = "default_side_length")]
    pub side_length: u32,
    #[serde(default = "default_offset")]
    pub x: i32,
    #[serde(default = "default_offset")]
    pub y: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpinnerSection {
    #[serde(default = "default_circle_color")]
    pub circle_color: String,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default = "default_position_count")]
    pub position_count: usize,
    #[serde(default = "default_frames_per_second")]
    pub frames_per_second: u32,
}

fn default_side_length() -> u32 {
    120
}
fn default_offset() -> i32 {
    20
}

fn default_circle_color() -> String {
    "#FFFFFF".to_string()
}
fn default_background_color() -> String {
    "#000000".to_string()
}
fn default_position_count() -> usize {
    8
}
fn default_frames_per_second() -> u32 {
    30
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            side_length: default_side_length(),
            x: default_offset(),
            y: default_offset(),
        }
    }
}

impl Default for SpinnerSection {
    fn default() -> Self {
        Self {
            circle_color: default_circle_color(),
            background_color: default_background_color(),
            position_count: default_position_count(),
            frames_per_second: default_frames_per_second(),
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            window: WindowSection::default(),
            spinner: SpinnerSection::default(),
        }
    }
}

impl SpinnerSection {
    pub fn to_spinner_config(&self) -> Result<SpinnerConfig> {
        Ok(SpinnerConfig {
            circle_color: parse_color(&self.circle_color)?,
            background_color: parse_color(&self.background_color)?,
            position_count: self.position_count,
            frames_per_second: self.frames_per_second,
        })
    }
}

/// Loads `progress-spinner/config.toml` from the user config directory,
/// falling back to defaults when missing or malformed.
pub fn load_config() -> FileConfig {
    let path = match dirs::config_dir() {
        Some(dir) => dir.join("progress-spinner/config.toml"),
        None => {
            warn!("no config directory for this user, using defaults");
            return FileConfig::default();
        }
    };

    let contents = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(_) => {
            warn!("could not read config file at {}, using defaults", path.display());
            return FileConfig::default();
        }
    };

    match toml::from_str::<FileConfig>(&contents) {
        Ok(config) => {
            info!("loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("failed to parse config: {e}, using defaults");
            FileConfig::default()
        }
    }
}

/// Parses an opaque `#RRGGBB` color.
pub fn parse_color(value: &str) -> Result<Color> {
    let hex = value.trim().trim_start_matches('#');
    ensure!(hex.len() == 6, "expected #RRGGBB color, got {value:?}");

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| anyhow!("invalid hex color {value:?}"))
    };
    let r = channel(0..2)?;
    let g = channel(2..4)?;
    let b = channel(4..6)?;

    Ok(Color::from_rgba8(r, g, b, 255))
}
