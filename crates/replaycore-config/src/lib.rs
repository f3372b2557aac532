use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE_NAME: &str = ".wot_replay_launcher.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub executable_path: Option<PathBuf>,
    #[serde(default)]
    pub extra_roots: Vec<PathBuf>,
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(SETTINGS_FILE_NAME))
    }

    /// Missing or unreadable settings come back as defaults; a bad settings
    /// file should never keep the launcher from starting.
    pub fn load(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };

        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "settings unreadable, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let body = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        let tmp = temp_sibling(path);
        fs::write(&tmp, body)?;
        fs::rename(&tmp, path)
    }
}

/// Probes well-known wine-prefix install locations for the game executable.
/// First hit wins; the user's explicit choice always takes precedence.
pub fn detect_executable() -> Option<PathBuf> {
    candidate_executables()
        .into_iter()
        .find(|candidate| candidate.is_file())
}

fn candidate_executables() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };

    [
        ".wine/drive_c/Games/World_of_Tanks/WorldOfTanks.exe",
        ".wine/drive_c/Games/World_of_Tanks_NA/WorldOfTanks.exe",
        ".wine/drive_c/Games/World_of_Tanks_EU/WorldOfTanks.exe",
        ".wine/drive_c/Program Files (x86)/World_of_Tanks/WorldOfTanks.exe",
    ]
    .into_iter()
    .map(|suffix| home.join(suffix))
    .collect()
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| SETTINGS_FILE_NAME.into());
    name.push(".tmp");
    path.with_file_name(name)
}
