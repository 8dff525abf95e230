//! Application configuration
//!
//! Startup settings for the window, the renderer and where assets and the
//! persisted program state live. Values come from built-in defaults and may be
//! overridden through `TABLETOP_*` environment variables.

use std::path::{Path, PathBuf};

/// Sample counts every wgpu backend is required to support.
const SUPPORTED_SAMPLE_COUNTS: [u32; 2] = [1, 4];

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Window width in logical pixels.
    pub window_width: u32,
    /// Window height in logical pixels.
    pub window_height: u32,
    pub title: String,
    /// Multisample count for the scene pass (1 disables MSAA).
    pub msaa_samples: u32,
    pub vsync: bool,
    /// Flat text file the program state is loaded from and saved to.
    pub state_path: PathBuf,
    /// Directory holding `objects/`, `textures/`.
    pub asset_root: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_width: 1000,
            window_height: 800,
            title: "Tabletop".to_string(),
            msaa_samples: 4,
            vsync: true,
            state_path: PathBuf::from("resources/program_state.txt"),
            asset_root: PathBuf::from("resources"),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `TABLETOP_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    ///
    /// Values that fail to parse are reported and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(width) = parse_var(&lookup, "TABLETOP_WIDTH") {
            config.window_width = width;
        }
        if let Some(height) = parse_var(&lookup, "TABLETOP_HEIGHT") {
            config.window_height = height;
        }
        if let Some(samples) = parse_var(&lookup, "TABLETOP_MSAA") {
            config.msaa_samples = samples;
        }
        if let Some(vsync) = lookup("TABLETOP_VSYNC") {
            match parse_flag(&vsync) {
                Some(flag) => config.vsync = flag,
                None => log::warn!("Ignoring TABLETOP_VSYNC={:?}: expected a boolean", vsync),
            }
        }
        if let Some(path) = lookup("TABLETOP_STATE") {
            config.state_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("TABLETOP_ASSETS") {
            config.asset_root = PathBuf::from(path);
        }

        config.normalized()
    }

    /// Clamps values into ranges the renderer can honour.
    pub fn normalized(mut self) -> Self {
        if !SUPPORTED_SAMPLE_COUNTS.contains(&self.msaa_samples) {
            let fallback = if self.msaa_samples > 1 { 4 } else { 1 };
            log::warn!(
                "MSAA sample count {} is not supported, using {}",
                self.msaa_samples,
                fallback
            );
            self.msaa_samples = fallback;
        }
        self.window_width = self.window_width.max(1);
        self.window_height = self.window_height.max(1);
        self
    }

    /// Resolves a path relative to the asset root.
    pub fn asset(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.asset_root.join(relative)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a valid number", key, raw);
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
