use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::audio::block::DEFAULT_BLOCK_FRAMES;
use crate::output::sink::BarFormat;
use crate::spectrum::analyzer::DEFAULT_WIDTH;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub spectrum: SpectrumConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct SpectrumConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_block_frames")]
    pub block_frames: usize,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub format: BarFormat,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            block_frames: default_block_frames(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_width() -> usize { DEFAULT_WIDTH }
fn default_block_frames() -> usize { DEFAULT_BLOCK_FRAMES }
fn default_format() -> BarFormat { BarFormat::Jsonl }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}

/// `./barscope.toml`, then `~/.config/barscope/config.toml`, then the
/// platform config directory.
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from("barscope.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("barscope").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("barscope").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
