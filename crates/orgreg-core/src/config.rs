//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/orgreg/config.toml)
//! 3. Environment variables (ORGREG_* prefix)
//!
//! Environment variables take precedence over config file values.
//!
//! The config is passed by value into the sync engine and backup rotator;
//! nothing in the core reads ambient global state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "ORGREG";

/// How many backup snapshots to retain
pub const DEFAULT_BACKUP_KEEP: usize = 10;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (records, trash, audit log, backups)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Resolved remote mirror key (saved by interactive sync)
    #[serde(default)]
    pub mirror: Option<String>,

    /// Base URL of the hosted sheet service backing the remote mirror
    #[serde(default = "default_mirror_base_url")]
    pub mirror_base_url: String,

    /// Path to the service-account credential file
    ///
    /// Relative paths resolve against the working directory, matching the
    /// well-known `service_account.json` convention.
    #[serde(default = "default_credential_file")]
    pub credential_file: PathBuf,

    /// Whether silent sync after mutations is enabled
    #[serde(default)]
    pub sync_enabled: bool,

    /// Number of backup snapshots to retain
    #[serde(default = "default_backup_keep")]
    pub backup_keep: usize,

    /// Access code gating protected operations (delete, purge, restore,
    /// category edits). No code means the gate is disabled.
    #[serde(default)]
    pub access_code: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            mirror: None,
            mirror_base_url: default_mirror_base_url(),
            credential_file: default_credential_file(),
            sync_enabled: false,
            backup_keep: DEFAULT_BACKUP_KEEP,
            access_code: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (ORGREG_DATA_DIR, ORGREG_MIRROR, ORGREG_SYNC_ENABLED)
    /// 2. Config file (~/.config/orgreg/config.toml or ORGREG_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_MIRROR", ENV_PREFIX)) {
            self.mirror = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_ENABLED", ENV_PREFIX)) {
            self.sync_enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
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
    /// Can be overridden with ORGREG_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("orgreg")
            .join("config.toml")
    }

    /// Path to the active records file
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join("records.json")
    }

    /// Path to the trash file
    pub fn trash_path(&self) -> PathBuf {
        self.data_dir.join("trash.json")
    }

    /// Path to the audit log file
    pub fn audit_path(&self) -> PathBuf {
        self.data_dir.join("audit.json")
    }

    /// Path to the category list file
    pub fn categories_path(&self) -> PathBuf {
        self.data_dir.join("categories.json")
    }

    /// Directory holding rotating backups of the records file
    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    /// Path to the protected-operation session file
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("orgreg")
}

fn default_mirror_base_url() -> String {
    "https://api.gridmirror.io".to_string()
}

fn default_credential_file() -> PathBuf {
    PathBuf::from("service_account.json")
}

fn default_backup_keep() -> usize {
    DEFAULT_BACKUP_KEEP
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
            let lock = ENV_MUTEX.lock().unwrap();
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

    const ENV_VARS: &[&str] = &["ORGREG_DATA_DIR", "ORGREG_MIRROR", "ORGREG_SYNC_ENABLED"];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.sync_enabled);
        assert!(config.mirror.is_none());
        assert_eq!(config.backup_keep, 10);
        assert!(config.data_dir.ends_with("orgreg"));
        assert_eq!(
            config.credential_file,
            PathBuf::from("service_account.json")
        );
    }

    #[test]
    fn test_file_paths() {
        let config = Config::default();
        assert!(config.records_path().ends_with("records.json"));
        assert!(config.trash_path().ends_with("trash.json"));
        assert!(config.audit_path().ends_with("audit.json"));
        assert!(config.categories_path().ends_with("categories.json"));
        assert!(config.backup_dir().ends_with("backups"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("ORGREG_DATA_DIR", "/tmp/orgreg-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/orgreg-test"));
    }

    #[test]
    fn test_env_override_sync_enabled() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        assert!(!config.sync_enabled);

        env::set_var("ORGREG_SYNC_ENABLED", "true");
        config.apply_env_overrides();
        assert!(config.sync_enabled);

        env::set_var("ORGREG_SYNC_ENABLED", "1");
        config.sync_enabled = false;
        config.apply_env_overrides();
        assert!(config.sync_enabled);

        env::set_var("ORGREG_SYNC_ENABLED", "false");
        config.apply_env_overrides();
        assert!(!config.sync_enabled);
    }

    #[test]
    fn test_env_override_mirror() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        assert!(config.mirror.is_none());

        env::set_var("ORGREG_MIRROR", "1cljWdPNFUtkLeMXzsyRP8dMAOapl");
        config.apply_env_overrides();
        assert_eq!(
            config.mirror,
            Some("1cljWdPNFUtkLeMXzsyRP8dMAOapl".to_string())
        );

        // Empty string clears it
        env::set_var("ORGREG_MIRROR", "");
        config.apply_env_overrides();
        assert!(config.mirror.is_none());
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/orgreg"),
            mirror: Some("ABC123".to_string()),
            sync_enabled: true,
            ..Config::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("mirror"));
        assert!(toml_str.contains("sync_enabled"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.mirror, config.mirror);
        assert_eq!(parsed.sync_enabled, config.sync_enabled);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            mirror = "ABC123"
            sync_enabled = true
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.mirror, Some("ABC123".to_string()));
        assert!(config.sync_enabled);
        // Defaults fill in the rest
        assert_eq!(config.backup_keep, 10);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let temp_dir = tempfile::TempDir::new().unwrap();
        env::set_var("ORGREG_DATA_DIR", temp_dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(!config.sync_enabled);
        assert!(config.mirror.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);

        let temp_dir = tempfile::TempDir::new().unwrap();
        env::set_var("ORGREG_DATA_DIR", temp_dir.path().join("data"));
        let path = temp_dir.path().join("config.toml");

        let config = Config {
            mirror: Some("XYZ789".to_string()),
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.mirror, Some("XYZ789".to_string()));
    }
}
