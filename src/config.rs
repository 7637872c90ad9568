use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default = "default_groups")]
    pub groups: Vec<GroupConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub server_url: String,
    /// Raw `Cookie` header value sent with every request. Its presence is what
    /// makes the client count as logged in.
    #[serde(default)]
    pub session_cookie: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".to_string(),
            session_cookie: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    pub fade_in_ms: u64,
    pub max_asset_bytes: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            fade_in_ms: 800,
            max_asset_bytes: 64 * 1024 * 1024,
        }
    }
}

/// A predefined group as shown in the playlists view. The server only sends
/// group ids on each sound, so names live here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub id: u32,
    pub name: String,
}

fn default_groups() -> Vec<GroupConfig> {
    ["Nature", "Sleep", "Focus", "Relax", "City"]
        .iter()
        .zip(1u32..)
        .map(|(name, id)| GroupConfig {
            id,
            name: name.to_string(),
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            audio: AudioConfig::default(),
            groups: default_groups(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Reads the config at `path`, writing the defaults there first if the
    /// file does not exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Could not read config file {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Could not parse config file {}", path.display()))?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn logged_in(&self) -> bool {
        self.general
            .session_cookie
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }

    pub fn group_name(&self, id: u32) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.name.as_str())
    }
}

fn get_config_path() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "murmur", "murmur") {
        Ok(proj_dirs.config_dir().join("config.toml"))
    } else {
        Ok(PathBuf::from("config.toml"))
    }
}
