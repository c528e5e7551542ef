use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

// ==================== Defaults ====================
// Values the page gets when it passes no config (or a partial one)
mod defaults {
    pub const CONTAINER_ID: &str = "game-container";
    pub const WIDTH: u32 = 800;
    pub const HEIGHT: u32 = 600;
    pub const BACKGROUND_CENTER: (f32, f32) = (400.0, 300.0);
    pub const BACKGROUND_SCALE: f32 = 1.1;
    pub const ASSET_ROOT: &str = "/assets";
    pub const IMAGE_EXTENSION: &str = "webp";
    pub const SOUND_ROOT: &str = "/sounds";
}

/// Everything the host needs to size the canvas and find its files.
///
/// Every field is optional on the JS side : `#[serde(default)]` fills the
/// gaps, so `{ width: 1024 }` is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HostConfig {
    pub container_id: String,
    pub width: u32,
    pub height: u32,
    pub background_center: (f32, f32),
    pub background_scale: f32,
    pub assets: AssetConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetConfig {
    pub root: String,
    pub image_extension: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioConfig {
    pub root: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            container_id: defaults::CONTAINER_ID.to_string(),
            width: defaults::WIDTH,
            height: defaults::HEIGHT,
            background_center: defaults::BACKGROUND_CENTER,
            background_scale: defaults::BACKGROUND_SCALE,
            assets: AssetConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        AssetConfig {
            root: defaults::ASSET_ROOT.to_string(),
            image_extension: defaults::IMAGE_EXTENSION.to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            root: defaults::SOUND_ROOT.to_string(),
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.container_id.is_empty(),
            "container_id must name a DOM element"
        );
        ensure!(
            self.width > 0 && self.height > 0,
            "canvas size must be non zero, got {}x{}",
            self.width,
            self.height
        );
        ensure!(
            self.background_scale.is_finite() && self.background_scale > 0.0,
            "background_scale must be positive, got {}",
            self.background_scale
        );
        ensure!(
            !self.assets.image_extension.is_empty(),
            "assets.image_extension must not be empty"
        );
        Ok(())
    }
}
