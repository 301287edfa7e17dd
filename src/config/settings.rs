use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use super::AppConfig;

const APP_NAME: &str = "LazyTree";
const CONFIG_FILE: &str = "config.json";

/// Overrides the config file location when set.
pub const CONFIG_ENV_VAR: &str = "LAZY_TREE_CONFIG";

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("com", "lazytree", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

/// Returns the full path to the configuration file, honoring `LAZY_TREE_CONFIG`.
pub fn get_config_file_path() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => get_config_directory().map(|dir| dir.join(CONFIG_FILE)),
    }
}

/// Loads the application configuration from the default location.
/// If the file doesn't exist, it creates a default one.
pub fn load_config() -> Result<AppConfig> {
    let config_path = get_config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    load_config_from(&config_path)
}

/// Loads the configuration stored at `config_path`.
///
/// A missing file is created with defaults. A file that cannot be parsed is left alone and
/// the defaults are used instead.
pub fn load_config_from(config_path: &Path) -> Result<AppConfig> {
    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = AppConfig::default();
        save_config_to(&default_config, config_path)?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

    match serde_json::from_str::<AppConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Falling back to default config.",
                config_path,
                e
            );
            Ok(AppConfig::default())
        }
    }
}

/// Saves the provided configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<()> {
    let config_path = get_config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    save_config_to(config, &config_path)
}

/// Writes `config` as pretty JSON, creating parent directories as needed.
pub fn save_config_to(config: &AppConfig, config_path: &Path) -> Result<()> {
    if let Some(config_dir) = config_path.parent() {
        if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
            fs::create_dir_all(config_dir).with_context(|| {
                format!("Failed to create config directory {}", config_dir.display())
            })?;
            tracing::info!("Created config directory: {:?}", config_dir);
        }
    }

    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(config_path, config_json)
        .with_context(|| format!("Failed to write config file {}", config_path.display()))?;
    tracing::info!("Saved config to {:?}", config_path);

    Ok(())
}

// Platform-specific configuration paths for reference:
// macOS:   ~/Library/Application Support/com.lazytree.LazyTree/
// Linux:   ~/.config/lazytree/
// Windows: %APPDATA%/lazytree/LazyTree/config/

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = load_config_from(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn saved_config_is_loaded_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = AppConfig {
            show_hidden: true,
            min_search_length: 5,
            last_directory: Some(PathBuf::from("/tmp/project")),
            ..AppConfig::default()
        };

        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
    }

    #[test]
    fn corrupted_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        // The broken file is left for the user to inspect.
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    #[serial]
    fn env_var_overrides_config_location() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::env::set_var(CONFIG_ENV_VAR, &path);

        assert_eq!(get_config_file_path(), Some(path.clone()));
        let config = AppConfig {
            follow_symlinks: true,
            ..AppConfig::default()
        };
        save_config(&config).unwrap();
        let loaded = load_config().unwrap();

        std::env::remove_var(CONFIG_ENV_VAR);
        assert_eq!(loaded, config);
        assert!(path.exists());
    }
}
