use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Frame gaps longer than this are clamped before integrating.
    pub max_dt_ms: u64,
    pub repulsion: f32,
    pub centering: f32,
    pub spring: f32,
    pub damping: f32,
    /// Position advance per unit of velocity and second.
    pub speed: f32,
    pub max_step: f32,
    /// Pairs with squared distance below this are skipped.
    pub epsilon_sq: f32,
    /// Edge length of the cube new nodes are scattered in.
    pub initial_spread: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_dt_ms: 50,
            repulsion: 0.1,
            centering: 0.01,
            spring: 0.025,
            damping: 0.9,
            speed: 10.0,
            max_step: 2.0,
            epsilon_sq: 0.001,
            initial_spread: 6.0,
        }
    }
}

impl LayoutConfig {
    pub fn max_dt_secs(&self) -> f32 {
        self.max_dt_ms as f32 / 1000.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub live_step_ms: u64,
    pub ghost_min_delay_ms: u64,
    pub ghost_tail_ms: u64,
    pub loop_live: bool,
    pub loop_ghost: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            live_step_ms: 500,
            ghost_min_delay_ms: 50,
            ghost_tail_ms: 500,
            loop_live: false,
            loop_ghost: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Fraction of a link travelled per second.
    pub speed: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self { speed: 0.8 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout: LayoutConfig,
    pub playback: PlaybackConfig,
    pub particles: ParticleConfig,
    pub audio: AudioConfig,
}

fn config_file_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "tracegraph")?;
    Some(proj.config_dir().join("engine.toml"))
}

pub fn load_or_default() -> EngineConfig {
    let Some(path) = config_file_path() else {
        return EngineConfig::default();
    };
    load_or_default_from_path(&path)
}

pub fn load_or_default_from_path(path: &Path) -> EngineConfig {
    match load_from_path(path) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "using default engine config");
            EngineConfig::default()
        }
    }
}

/// Strict variant for explicitly requested files.
pub fn load_from_path(path: &Path) -> anyhow::Result<EngineConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read engine config {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse engine config {}", path.display()))
}

pub fn save(cfg: &EngineConfig) -> anyhow::Result<()> {
    let Some(path) = config_file_path() else {
        return Err(anyhow::anyhow!("no config directory available"));
    };
    save_to_path(cfg, &path)
}

pub fn save_to_path(cfg: &EngineConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let data = toml::to_string_pretty(cfg).context("failed to serialize engine config")?;
    fs::write(path, data)
        .with_context(|| format!("failed to write engine config {}", path.display()))?;
    Ok(())
}
