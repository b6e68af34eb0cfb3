//! Bootstrap configuration loading and root folder resolution
//!
//! Configuration is two-tier:
//! 1. A TOML bootstrap file shared by all services (root folder, logging,
//!    plus one section per service such as `[attention]` or `[tutor]`)
//! 2. Built-in defaults compiled into each service
//!
//! A missing or malformed TOML file never prevents startup: a warning is
//! logged and defaults are used.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "LECTERN_ROOT_FOLDER";

/// SQLite database file name inside the root folder
pub const DATABASE_FILE: &str = "lectern.db";

/// Lecture cache directory name inside the root folder
pub const LECTURE_CACHE_DIR: &str = "lectures";

/// Shared bootstrap keys present in every service's view of the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder for the database and lecture cache (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Load and parse a TOML file, failing on I/O or syntax errors
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load the TOML file if present, falling back to defaults on any problem
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            debug!("No config file path available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Default configuration file path for the platform
///
/// `~/.config/lectern/config.toml` on Linux, the platform equivalent elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lectern").join("config.toml"))
}

/// Load one named section of the TOML file into a service-specific struct
///
/// Missing file, missing section, or an invalid section all yield `T::default()`.
pub fn load_section<T>(path: Option<&Path>, section: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path.filter(|p| p.exists()) else {
        return T::default();
    };

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return T::default();
        }
    };

    let value: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse {}: {}", path.display(), e);
            return T::default();
        }
    };

    match value.get(section) {
        Some(section_value) => match section_value.clone().try_into::<T>() {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Invalid [{}] section in {}: {}", section, path.display(), e);
                T::default()
            }
        },
        None => {
            debug!("No [{}] section in {}, using defaults", section, path.display());
            T::default()
        }
    }
}

/// Root folder resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. `LECTERN_ROOT_FOLDER` environment variable
/// 3. `root_folder` key in the TOML config file
/// 4. OS-dependent compiled default (fallback)
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            config_path: default_config_path(),
        }
    }

    /// Use a root folder passed on the command line
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    /// Read `root_folder` from this TOML file instead of the platform default path
    pub fn with_config_file(mut self, config_path: Option<PathBuf>) -> Self {
        self.config_path = config_path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            debug!(module = %self.module_name, "Root folder from command line");
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                debug!(module = %self.module_name, "Root folder from {}", ROOT_FOLDER_ENV);
                return PathBuf::from(path);
            }
        }

        let config = TomlConfig::load_or_default(self.config_path.as_deref());
        if let Some(path) = config.root_folder {
            debug!(module = %self.module_name, "Root folder from config file");
            return path;
        }

        default_root_folder()
    }
}

/// Creates the root folder and names the files living inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            info!("Creating root folder {}", self.root_folder.display());
            std::fs::create_dir_all(&self.root_folder)?;
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn lecture_cache_path(&self) -> PathBuf {
        self.root_folder.join(LECTURE_CACHE_DIR)
    }
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lectern"))
        .unwrap_or_else(|| PathBuf::from("./lectern_data"))
}
