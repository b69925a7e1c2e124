use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

/// Knobs for the built-in demo collaborators only; the engine itself has no
/// tunables here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DemoSettings {
    pub frame_width: u32,
    pub frame_height: u32,
    pub use_microphone: bool,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            frame_width: 640,
            frame_height: 480,
            use_microphone: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub server: ServerSettings,
    pub report_dir: PathBuf,
    /// COCO class watched for on the desk; 73 is "book".
    pub target_class_id: u32,
    pub demo: DemoSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            report_dir: PathBuf::from("."),
            target_class_id: 73,
            demo: DemoSettings::default(),
        }
    }
}

/// Load settings from a JSON file. A missing file or malformed contents fall
/// back to defaults; only the fallback is logged, never fatal.
pub fn load(path: &Path) -> Settings {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => return settings,
                Err(err) => warn!(
                    "ignoring malformed settings file {}: {err}",
                    path.display()
                ),
            },
            Err(err) => warn!("failed to read settings file {}: {err}", path.display()),
        }
    }
    Settings::default()
}

pub fn persist(path: &Path, settings: &Settings) -> Result<()> {
    let serialized = serde_json::to_string_pretty(settings)?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write settings to {}", path.display()))
}
