use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.nasa.gov/mars-photos/api/v1";
pub const DEFAULT_API_KEY: &str = "DEMO_KEY";
/// Photo search path below the base URL. `{rover}` is replaced by the mission id.
pub const DEFAULT_PHOTOS_PATH: &str = "rovers/{rover}/photos";
pub const DEFAULT_MISSIONS: [&str; 3] = ["curiosity", "opportunity", "spirit"];

const API_URL_ENV: &str = "ROVER_API_URL";
const API_KEY_ENV: &str = "ROVER_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub api_key: Option<String>,
    /// Path template for photo searches, e.g. `rovers/{rover}/photos` or `photos`.
    pub photos_path: String,
    /// Missions whose manifests must all load before searching is allowed.
    pub missions: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            api_key: Some(DEFAULT_API_KEY.to_string()),
            photos_path: DEFAULT_PHOTOS_PATH.to_string(),
            missions: DEFAULT_MISSIONS.iter().map(|m| m.to_string()).collect(),
            timeout_secs: 60,
        }
    }
}

impl Config {
    /// `~/.rover/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".rover").join("config.toml"))
    }

    /// Loads defaults, then the config file, then environment overrides.
    ///
    /// An explicit `path` must exist; the default path is only read if present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        let config = match file {
            Some(path) => {
                debug!("loading config from {}", path.display());
                let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })?
            }
            None => Config::default(),
        };

        config
            .with_overrides(|key| std::env::var(key).ok())
            .validated()
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_URL_ENV) {
            self.api_base_url = url;
        }
        if let Some(key) = lookup(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        self
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        let mut missions: Vec<String> = Vec::new();
        for mission in &self.missions {
            let mission = mission.trim().to_lowercase();
            if !mission.is_empty() && !missions.contains(&mission) {
                missions.push(mission);
            }
        }
        if missions.is_empty() {
            return Err(ConfigError::Invalid("at least one mission is required".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        let photos_path = self.photos_path.trim().trim_matches('/');
        if photos_path.is_empty() {
            return Err(ConfigError::Invalid("photos_path must not be empty".into()));
        }
        self.photos_path = photos_path.to_string();

        self.missions = missions;
        self.api_key = self.api_key.filter(|k| !k.trim().is_empty());
        Ok(self)
    }
}
