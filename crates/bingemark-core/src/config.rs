//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/bingemark/config.toml)
//! 3. Environment variables (BINGEMARK_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "BINGEMARK";

/// Default bound on a single storage call
pub const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 5_000;

/// Which storage adapter backs the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(StorageBackend::Json),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(format!(
                "unknown storage backend '{}' (expected json or sqlite)",
                other
            )),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Json => f.write_str("json"),
            StorageBackend::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (JSON store, SQLite db)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Storage backend
    #[serde(default)]
    pub storage_backend: StorageBackend,

    /// Timeout for each storage call, in milliseconds
    #[serde(default = "default_storage_timeout_ms")]
    pub storage_timeout_ms: u64,

    /// Browser bookmark file used for native imports
    #[serde(default)]
    pub native_bookmarks: Option<PathBuf>,

    /// Log file path (logs go to stderr when unset)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_backend: StorageBackend::default(),
            storage_timeout_ms: DEFAULT_STORAGE_TIMEOUT_MS,
            native_bookmarks: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (BINGEMARK_DATA_DIR, BINGEMARK_STORAGE_BACKEND, ...)
    /// 2. Config file (~/.config/bingemark/config.toml or BINGEMARK_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_STORAGE_BACKEND", ENV_PREFIX)) {
            self.storage_backend = val
                .parse()
                .map_err(anyhow::Error::msg)
                .context("Invalid BINGEMARK_STORAGE_BACKEND")?;
        }

        if let Ok(val) = std::env::var(format!("{}_STORAGE_TIMEOUT_MS", ENV_PREFIX)) {
            self.storage_timeout_ms = val
                .parse()
                .with_context(|| format!("Invalid BINGEMARK_STORAGE_TIMEOUT_MS: '{}'", val))?;
        }

        if let Ok(val) = std::env::var(format!("{}_NATIVE_BOOKMARKS", ENV_PREFIX)) {
            self.native_bookmarks = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        Ok(())
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with BINGEMARK_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bingemark")
            .join("config.toml")
    }

    /// Get the path to the JSON storage file
    pub fn json_store_path(&self) -> PathBuf {
        self.data_dir.join("storage.json")
    }

    /// Get the path to the SQLite database
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("bingemark.db")
    }

    /// Storage call timeout
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    /// Browser bookmark file for native imports, falling back to the Chrome default profile
    pub fn native_bookmarks_path(&self) -> PathBuf {
        self.native_bookmarks
            .clone()
            .unwrap_or_else(default_native_bookmarks_path)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bingemark")
}

fn default_storage_timeout_ms() -> u64 {
    DEFAULT_STORAGE_TIMEOUT_MS
}

/// Bookmarks file of the default Chrome profile
fn default_native_bookmarks_path() -> PathBuf {
    let profile_root = if cfg!(target_os = "linux") {
        dirs::config_dir().map(|d| d.join("google-chrome"))
    } else {
        dirs::data_local_dir().map(|d| d.join("Google").join("Chrome").join("User Data"))
    };

    profile_root
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Default")
        .join("Bookmarks")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "BINGEMARK_DATA_DIR",
        "BINGEMARK_STORAGE_BACKEND",
        "BINGEMARK_STORAGE_TIMEOUT_MS",
        "BINGEMARK_NATIVE_BOOKMARKS",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage_backend, StorageBackend::Json);
        assert_eq!(config.storage_timeout(), Duration::from_secs(5));
        assert!(config.native_bookmarks.is_none());
        assert!(config.data_dir.ends_with("bingemark"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config::default();
        assert!(config.json_store_path().ends_with("storage.json"));
        assert!(config.sqlite_path().ends_with("bingemark.db"));
        assert!(config.native_bookmarks_path().ends_with("Bookmarks"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("BINGEMARK_DATA_DIR", "/tmp/bingemark-test");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/bingemark-test"));
    }

    #[test]
    fn test_env_override_backend_and_timeout() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("BINGEMARK_STORAGE_BACKEND", "SQLite");
        env::set_var("BINGEMARK_STORAGE_TIMEOUT_MS", "250");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.storage_backend, StorageBackend::Sqlite);
        assert_eq!(config.storage_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("BINGEMARK_STORAGE_BACKEND", "floppy");
        assert!(config.apply_env_overrides().is_err());
    }

    #[test]
    fn test_env_override_native_bookmarks() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("BINGEMARK_NATIVE_BOOKMARKS", "/tmp/Bookmarks");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.native_bookmarks_path(), PathBuf::from("/tmp/Bookmarks"));

        // Empty string clears it
        env::set_var("BINGEMARK_NATIVE_BOOKMARKS", "");
        config.apply_env_overrides().unwrap();
        assert!(config.native_bookmarks.is_none());
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/bingemark"),
            storage_backend: StorageBackend::Sqlite,
            storage_timeout_ms: 1_000,
            native_bookmarks: Some(PathBuf::from("/profiles/Bookmarks")),
            log_file: None,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("storage_backend = \"sqlite\""));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.storage_backend, config.storage_backend);
        assert_eq!(parsed.storage_timeout_ms, config.storage_timeout_ms);
        assert_eq!(parsed.native_bookmarks, config.native_bookmarks);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            storage_backend = "sqlite"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.storage_backend, StorageBackend::Sqlite);
        assert_eq!(config.storage_timeout_ms, DEFAULT_STORAGE_TIMEOUT_MS);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        env::set_var("BINGEMARK_DATA_DIR", temp_dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert_eq!(config.storage_backend, StorageBackend::Json);
        assert!(config.data_dir.exists());
    }

    #[test]
    fn test_save_to_path_round_trip() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("conf").join("config.toml");

        let mut config = Config::default();
        config.data_dir = temp_dir.path().join("data");
        config.storage_timeout_ms = 42;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.storage_timeout_ms, 42);
        assert_eq!(loaded.data_dir, config.data_dir);
    }
}
