//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/bookguide/config.toml)
//! 3. Environment variables (BOOKGUIDE_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "BOOKGUIDE";

/// Default radius for nearby library searches
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 10.0;

/// Which key-value backend holds the persisted state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per slot in `data_dir`
    #[default]
    File,
    /// A single SQLite database in `data_dir`
    Sqlite,
    /// Nothing survives the process
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageBackend::File => "file",
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::Memory => "memory",
        })
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(StorageBackend::File),
            "sqlite" | "db" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("Unknown storage backend '{}'. Use file, sqlite or memory.", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (slot files, SQLite db)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Storage backend
    #[serde(default)]
    pub storage: StorageBackend,

    /// JSON file with the book catalog used by `catalog search`
    #[serde(default)]
    pub catalog_file: Option<PathBuf>,

    /// JSON file with the library directory
    #[serde(default)]
    pub libraries_file: Option<PathBuf>,

    /// Default origin for nearby library searches
    #[serde(default)]
    pub home_latitude: Option<f64>,

    #[serde(default)]
    pub home_longitude: Option<f64>,

    /// Radius for nearby library searches
    #[serde(default = "default_search_radius")]
    pub search_radius_km: f64,

    /// Log file path (default: stderr)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage: StorageBackend::default(),
            catalog_file: None,
            libraries_file: None,
            home_latitude: None,
            home_longitude: None,
            search_radius_km: DEFAULT_SEARCH_RADIUS_KM,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (BOOKGUIDE_DATA_DIR, BOOKGUIDE_STORAGE, ...)
    /// 2. Config file (~/.config/bookguide/config.toml or BOOKGUIDE_CONFIG)
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

        if let Ok(val) = std::env::var(format!("{}_STORAGE", ENV_PREFIX)) {
            self.storage = val
                .parse()
                .with_context(|| format!("Invalid {}_STORAGE", ENV_PREFIX))?;
        }

        // Empty string clears the file settings
        if let Ok(val) = std::env::var(format!("{}_CATALOG_FILE", ENV_PREFIX)) {
            self.catalog_file = non_empty_path(val);
        }

        if let Ok(val) = std::env::var(format!("{}_LIBRARIES_FILE", ENV_PREFIX)) {
            self.libraries_file = non_empty_path(val);
        }

        Ok(())
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if self.storage != StorageBackend::Memory && !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Check that values make sense together
    pub fn validate(&self) -> Result<()> {
        if !(self.search_radius_km.is_finite() && self.search_radius_km > 0.0) {
            bail!("search_radius_km must be a positive number");
        }
        match (self.home_latitude, self.home_longitude) {
            (Some(lat), _) if !(-90.0..=90.0).contains(&lat) => {
                bail!("home_latitude must be between -90 and 90")
            }
            (_, Some(lon)) if !(-180.0..=180.0).contains(&lon) => {
                bail!("home_longitude must be between -180 and 180")
            }
            _ => Ok(()),
        }
    }

    /// Home coordinates, when both halves are configured
    pub fn home(&self) -> Option<(f64, f64)> {
        self.home_latitude.zip(self.home_longitude)
    }

    /// Set a value by key name, parsing it from a string
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let unset = value.is_empty() || value == "none";
        match key {
            "data_dir" => self.data_dir = value.into(),
            "storage" => self.storage = value.parse()?,
            "catalog_file" => self.catalog_file = (!unset).then(|| value.into()),
            "libraries_file" => self.libraries_file = (!unset).then(|| value.into()),
            "home_latitude" => self.home_latitude = parse_optional_f64(key, value, unset)?,
            "home_longitude" => self.home_longitude = parse_optional_f64(key, value, unset)?,
            "search_radius_km" => {
                self.search_radius_km = value
                    .parse()
                    .with_context(|| format!("Invalid value for {}: '{}'", key, value))?;
            }
            "log_file" => self.log_file = (!unset).then(|| value.into()),
            _ => bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: {}",
                key,
                Self::KEYS.join(", ")
            ),
        }
        self.validate()
    }

    /// Keys accepted by `set_value`
    pub const KEYS: &'static [&'static str] = &[
        "data_dir",
        "storage",
        "catalog_file",
        "libraries_file",
        "home_latitude",
        "home_longitude",
        "search_radius_km",
        "log_file",
    ];

    /// Save configuration to the default file
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
    /// Can be overridden with BOOKGUIDE_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bookguide")
            .join("config.toml")
    }

    /// Get the path to the SQLite database
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("bookguide.db")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bookguide")
}

fn default_search_radius() -> f64 {
    DEFAULT_SEARCH_RADIUS_KM
}

fn non_empty_path(val: String) -> Option<PathBuf> {
    if val.is_empty() {
        None
    } else {
        Some(PathBuf::from(val))
    }
}

fn parse_optional_f64(key: &str, value: &str, unset: bool) -> Result<Option<f64>> {
    if unset {
        return Ok(None);
    }
    let parsed = value
        .parse()
        .with_context(|| format!("Invalid value for {}: '{}'", key, value))?;
    Ok(Some(parsed))
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
        "BOOKGUIDE_DATA_DIR",
        "BOOKGUIDE_STORAGE",
        "BOOKGUIDE_CATALOG_FILE",
        "BOOKGUIDE_LIBRARIES_FILE",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage, StorageBackend::File);
        assert!(config.catalog_file.is_none());
        assert!(config.home().is_none());
        assert_eq!(config.search_radius_km, DEFAULT_SEARCH_RADIUS_KM);
        assert!(config.data_dir.ends_with("bookguide"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config::default();
        assert!(config.sqlite_path().ends_with("bookguide.db"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("BOOKGUIDE_DATA_DIR", "/tmp/bookguide-test");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/bookguide-test"));
    }

    #[test]
    fn test_env_override_storage() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("BOOKGUIDE_STORAGE", "sqlite");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.storage, StorageBackend::Sqlite);

        env::set_var("BOOKGUIDE_STORAGE", "floppy");
        assert!(config.apply_env_overrides().is_err());
    }

    #[test]
    fn test_env_override_catalog_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("BOOKGUIDE_CATALOG_FILE", "/data/catalog.json");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.catalog_file, Some(PathBuf::from("/data/catalog.json")));

        // Empty string clears it
        env::set_var("BOOKGUIDE_CATALOG_FILE", "");
        config.apply_env_overrides().unwrap();
        assert!(config.catalog_file.is_none());
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/bookguide"),
            storage: StorageBackend::Sqlite,
            catalog_file: Some(PathBuf::from("/data/catalog.json")),
            home_latitude: Some(-23.55052),
            home_longitude: Some(-46.633308),
            ..Config::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("storage = \"sqlite\""));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.storage, config.storage);
        assert_eq!(parsed.catalog_file, config.catalog_file);
        assert_eq!(parsed.home(), Some((-23.55052, -46.633308)));
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            storage = "memory"
            search_radius_km = 2.5
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.search_radius_km, 2.5);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        env::set_var("BOOKGUIDE_DATA_DIR", temp_dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.storage, StorageBackend::File);
        assert!(config.data_dir.exists());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config {
            data_dir: temp_dir.path().join("data"),
            ..Config::default()
        };
        config.set_value("libraries_file", "/srv/libraries.json").unwrap();
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.libraries_file, Some(PathBuf::from("/srv/libraries.json")));
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::default();

        config.set_value("storage", "sqlite").unwrap();
        assert_eq!(config.storage, StorageBackend::Sqlite);

        config.set_value("home_latitude", "-23.5").unwrap();
        config.set_value("home_longitude", "-46.6").unwrap();
        assert_eq!(config.home(), Some((-23.5, -46.6)));

        config.set_value("home_latitude", "none").unwrap();
        assert!(config.home().is_none());

        assert!(config.set_value("home_longitude", "500").is_err());
        assert!(config.set_value("search_radius_km", "-1").is_err());
        assert!(config.set_value("search_radius_km", "far").is_err());
        assert!(config.set_value("favorite_color", "blue").is_err());
    }
}
