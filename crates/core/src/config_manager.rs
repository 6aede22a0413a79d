//! Config Manager
//!
//! Owns the process-wide `AppConfig` and its file on disk.
//!
//! Load order: user file -> bundled default -> built-in default. Whenever the
//! user file could not be used, the resulting config is written back so the
//! next start finds a valid user file; an unreadable user file is first moved
//! aside to `config.json.bak`. Saves go through a temp file that is
//! renamed over the target, so a crash never leaves a half-written document.

use crate::config::{AppConfig, AppSettings, PageConfig};
use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// File name of the user config inside the data directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Bundled default, relative to the executable directory
pub const BUNDLED_DEFAULT_PATH: &str = "config/default_config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to determine user data directory")]
    NoDataDirectory,

    #[error("Failed to read config file at {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write config file at {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Get the application's data directory (%APPDATA%/SoftDeck on Windows)
pub fn get_data_directory() -> Result<PathBuf, ConfigError> {
    let project_dirs =
        ProjectDirs::from("", "", "SoftDeck").ok_or(ConfigError::NoDataDirectory)?;
    Ok(project_dirs.config_dir().to_path_buf())
}

/// Location of the bundled default next to the running executable
pub fn bundled_default_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(BUNDLED_DEFAULT_PATH))
}

/// Read and parse one config file
pub fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    AppConfig::from_value(value).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `config` to `path` via `<path>.tmp` + rename
pub fn write_config_atomic(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(config)?;
    let tmp_path = path.with_extension("tmp");

    let result = fs::write(&tmp_path, json).and_then(|_| fs::rename(&tmp_path, path));
    if let Err(source) = result {
        if tmp_path.exists() {
            let _ = fs::remove_file(&tmp_path);
        }
        return Err(ConfigError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

/// Holder of the live configuration
pub struct ConfigManager {
    config: AppConfig,
    path: PathBuf,
    default_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Manager for an explicit user file and optional bundled default
    pub fn new(path: impl Into<PathBuf>, default_path: Option<PathBuf>) -> Self {
        Self {
            config: AppConfig::default(),
            path: path.into(),
            default_path,
        }
    }

    /// Manager for the per-user data directory and the bundled default
    pub fn for_current_user() -> Result<Self, ConfigError> {
        let path = get_data_directory()?.join(CONFIG_FILE_NAME);
        Ok(Self::new(path, bundled_default_path()))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn settings(&self) -> &AppSettings {
        &self.config.settings
    }

    pub fn pages(&self) -> &[PageConfig] {
        &self.config.pages
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration, falling back as needed; never fails
    pub fn load(&mut self) -> &AppConfig {
        if self.path.exists() {
            match read_config_file(&self.path) {
                Ok(config) => {
                    info!("Loaded user config from {}", self.path.display());
                    self.config = config;
                    return &self.config;
                }
                Err(e) => {
                    error!("Failed to load user config, falling back to default: {}", e);
                    self.back_up_user_file();
                }
            }
        }

        self.config = match self.default_path.as_deref().filter(|p| p.exists()) {
            Some(default_path) => match read_config_file(default_path) {
                Ok(config) => {
                    info!("Loaded default config from {}", default_path.display());
                    config
                }
                Err(e) => {
                    error!("Failed to load default config, using built-in defaults: {}", e);
                    AppConfig::builtin()
                }
            },
            None => AppConfig::builtin(),
        };

        if let Err(e) = self.save() {
            error!("Failed to save config: {}", e);
        }
        &self.config
    }

    /// Persist the current configuration
    pub fn save(&self) -> Result<(), ConfigError> {
        write_config_atomic(&self.config, &self.path)?;
        info!("Config saved to {}", self.path.display());
        Ok(())
    }

    /// Path the unreadable user file is moved to
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".bak");
        PathBuf::from(name)
    }

    fn back_up_user_file(&self) {
        let backup = self.backup_path();
        match fs::rename(&self.path, &backup) {
            Ok(()) => warn!("Moved unreadable config to {}", backup.display()),
            Err(e) => error!("Failed to back up {}: {}", self.path.display(), e),
        }
    }

    fn save_logged(&self) {
        if let Err(e) = self.save() {
            error!("Failed to save config: {}", e);
        }
    }

    pub fn get_page_by_id(&self, page_id: &str) -> Option<&PageConfig> {
        self.config.page_by_id(page_id)
    }

    /// Page mapped to `exe_name`, compared case-insensitively
    pub fn find_page_for_app(&self, exe_name: &str) -> Option<&PageConfig> {
        self.config.page_for_app(exe_name)
    }

    /// Append a new empty page with a generated id and persist
    pub fn add_page(&mut self, name: &str) -> &PageConfig {
        self.config.pages.push(PageConfig::new(name));
        self.save_logged();
        let index = self.config.pages.len() - 1;
        &self.config.pages[index]
    }

    /// Replace the page at `index` and persist
    pub fn replace_page(&mut self, index: usize, page: PageConfig) -> bool {
        let Some(slot) = self.config.pages.get_mut(index) else {
            warn!("replace_page: index {} out of range", index);
            return false;
        };
        *slot = page;
        self.save_logged();
        true
    }

    /// Remove the page at `index`; the last remaining page is never removed
    pub fn delete_page(&mut self, index: usize) -> bool {
        if self.config.pages.len() <= 1 || index >= self.config.pages.len() {
            return false;
        }
        let removed = self.config.pages.remove(index);
        info!("Deleted page '{}' ({})", removed.name, removed.id);
        self.save_logged();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_falls_back_to_builtin_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut manager = ConfigManager::new(&path, None);

        let config = manager.load().clone();
        assert_eq!(config, AppConfig::builtin());
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_load_prefers_user_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, json!({"pages": [{"id": "user", "name": "User"}]}).to_string()).unwrap();

        let mut manager = ConfigManager::new(&path, None);
        assert_eq!(manager.load().pages[0].id, "user");
    }

    #[test]
    fn test_malformed_user_file_falls_back_to_bundled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let bundled = dir.path().join("default_config.json");
        fs::write(&path, "{ not json").unwrap();
        fs::write(&bundled, json!({"pages": [{"id": "bundled"}]}).to_string()).unwrap();

        let mut manager = ConfigManager::new(&path, Some(bundled));
        assert_eq!(manager.load().pages[0].id, "bundled");

        // The fallback was written back, and the broken file kept aside
        assert_eq!(read_config_file(&path).unwrap().pages[0].id, "bundled");
        assert_eq!(fs::read_to_string(manager.backup_path()).unwrap(), "{ not json");
        assert_eq!(manager.backup_path(), dir.path().join("config.json.bak"));
    }

    #[test]
    fn test_slightly_off_user_file_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let user = json!({
            "settings": {"theme": null},
            "pages": [{
                "id": "p_user",
                "buttons": [
                    {"position": [0, 0], "icon": null},
                    {"position": [1, 2, 0], "label": "extra"}
                ]
            }]
        });
        fs::write(&path, user.to_string()).unwrap();

        let mut manager = ConfigManager::new(&path, None);
        let config = manager.load();
        assert_eq!(config.pages[0].id, "p_user");
        assert_eq!(config.pages[0].buttons[1].position, (1, 2));
        assert!(!manager.backup_path().exists());
    }

    #[test]
    fn test_replace_page_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut manager = ConfigManager::new(&path, None);
        manager.load();

        let mut page = manager.pages()[0].clone();
        page.name = "Renamed".into();
        page.mapped_apps = vec!["Code.exe".into()];
        assert!(manager.replace_page(0, page));
        assert!(!manager.replace_page(5, PageConfig::new("nowhere")));
        assert_eq!(manager.pages().len(), 1);

        let saved = read_config_file(&path).unwrap();
        assert_eq!(saved.pages[0].name, "Renamed");
        assert_eq!(saved.pages[0].mapped_apps, vec!["Code.exe"]);
    }

    #[test]
    fn test_malformed_bundled_file_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let bundled = dir.path().join("default_config.json");
        fs::write(&bundled, "42").unwrap();

        let mut manager = ConfigManager::new(&path, Some(bundled));
        assert_eq!(*manager.load(), AppConfig::builtin());
    }

    #[test]
    fn test_save_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut manager = ConfigManager::new(&path, None);
        manager.load();
        manager.config_mut().settings.theme = "light".into();
        manager.config_mut().pages[0].mapped_apps = vec!["b.exe".into(), "a.exe".into()];
        manager.save().unwrap();

        let mut reloaded = ConfigManager::new(&path, None);
        assert_eq!(reloaded.load(), manager.config());
    }

    #[test]
    fn test_delete_last_page_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join(CONFIG_FILE_NAME), None);
        manager.load();
        assert!(!manager.delete_page(0));
        assert_eq!(manager.pages().len(), 1);

        let new_id = manager.add_page("Second").id.clone();
        assert!(new_id.starts_with("page_"));
        assert!(manager.delete_page(0));
        assert_eq!(manager.pages()[0].id, new_id);
    }

    #[test]
    fn test_find_page_for_app() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join(CONFIG_FILE_NAME), None);
        manager.load();
        manager.config_mut().pages[0].mapped_apps = vec!["Game.exe".into()];
        assert_eq!(manager.find_page_for_app("game.EXE").unwrap().id, "page_main");
        assert!(manager.get_page_by_id("missing").is_none());
    }
}
