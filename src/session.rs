use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub global_volume: f32,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub previous_volume: Option<f32>,
    // sound name -> individual volume
    #[serde(default)]
    pub sounds: HashMap<String, f32>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            global_volume: 0.5,
            muted: false,
            previous_volume: None,
            sounds: HashMap::new(),
        }
    }
}

impl Session {
    pub fn load() -> Result<Self> {
        Self::load_from(&get_session_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            // Session state is disposable; a corrupted file starts fresh.
            let session: Session = toml::from_str(&content).unwrap_or_default();
            Ok(session)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&get_session_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

fn get_session_path() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "murmur", "murmur") {
        Ok(proj_dirs.config_dir().join("session.toml"))
    } else {
        Ok(PathBuf::from("session.toml"))
    }
}
