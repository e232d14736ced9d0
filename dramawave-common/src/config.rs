//! Configuration loading and root folder resolution
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`DRAMAWAVE_*`)
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing or unreadable config file never aborts startup: a warning is
//! logged and compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5740;

/// Default bind address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "dramawave.db";

/// Primary environment variable for the root folder
pub const ROOT_FOLDER_ENV: &str = "DRAMAWAVE_ROOT_FOLDER";

/// Alternative environment variable for the root folder
pub const ROOT_ENV: &str = "DRAMAWAVE_ROOT";

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub event_capacity: Option<usize>,
    pub logging: LoggingConfig,
    pub comments: CommentsConfig,
    pub notifications: NotificationsConfig,
    pub recommendation: RecommendationConfig,
    pub chat: ChatConfig,
    pub users: UsersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing filter directive, overridden by RUST_LOG
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// Descendant levels removed along with a cancelled comment
    pub cascade_depth: usize,
    /// Nested reply levels shown below a top-level comment
    pub display_depth: usize,
    /// Largest `?depth=` a client may request
    pub max_display_depth: usize,
    /// Maximum characters in a text comment
    pub max_text_len: usize,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            cascade_depth: 2,
            display_depth: 1,
            max_display_depth: 8,
            max_text_len: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub window_hours: i64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { window_hours: 24 }
    }
}

impl NotificationsConfig {
    /// Feed window in milliseconds
    pub fn window_ms(&self) -> i64 {
        self.window_hours.max(1).saturating_mul(crate::time::HOUR_MS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Generator endpoint; the feature stays hidden when unset
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Age after which an unfinished claim may be taken over
    pub claim_ttl_secs: u64,
    pub timeout_secs: u64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            claim_ttl_secs: 120,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub history_limit: i64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { history_limit: 100 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersConfig {
    /// User ids promoted to admin at startup
    pub bootstrap_admins: Vec<String>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Load a specific file
    pub fn load_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Load the first config file found, or defaults
    ///
    /// `explicit` (from `--config`) is tried first, then the per-user and
    /// system-wide locations.
    pub fn load(explicit: Option<&Path>) -> Self {
        for path in config_file_candidates(explicit) {
            if !path.exists() {
                if explicit == Some(path.as_path()) {
                    warn!("Config file {} not found, using defaults", path.display());
                }
                continue;
            }
            match Self::load_file(&path) {
                Ok(config) => {
                    debug!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Ignoring config file {}: {}", path.display(), e);
                    return Self::default();
                }
            }
        }
        debug!("No config file found, using compiled defaults");
        Self::default()
    }
}

/// Config file locations in lookup order
pub fn config_file_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = explicit {
        candidates.push(path.to_path_buf());
    }
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("dramawave").join("config.toml"));
    }
    if cfg!(unix) {
        candidates.push(PathBuf::from("/etc/dramawave/config.toml"));
    }
    candidates
}

/// OS-dependent fallback values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = dirs::data_local_dir()
            .map(|d| d.join("dramawave"))
            .unwrap_or_else(|| PathBuf::from("./dramawave_data"));

        Self {
            root_folder,
            log_level: "info".to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Resolves the root folder holding the database
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli: Option<PathBuf>,
    toml: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cli(mut self, path: Option<PathBuf>) -> Self {
        self.cli = path;
        self
    }

    pub fn with_toml(mut self, path: Option<PathBuf>) -> Self {
        self.toml = path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli {
            return path.clone();
        }

        for var in [ROOT_FOLDER_ENV, ROOT_ENV] {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    return PathBuf::from(value);
                }
            }
        }

        if let Some(path) = &self.toml {
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates files inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root)?;
        }
        if !self.root.is_dir() {
            return Err(Error::Config(format!(
                "Root folder is not a directory: {}",
                self.root.display()
            )));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }
}
