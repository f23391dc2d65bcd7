use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR: &str = "perforce-tools";

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the main configuration directory path following platform conventions:
    /// - Linux: $XDG_CONFIG_HOME/perforce-tools or ~/.config/perforce-tools
    /// - macOS: ~/Library/Application Support/perforce-tools
    /// - Windows: %APPDATA%\perforce-tools
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            // Follow XDG Base Directory Specification
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join(APP_DIR))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join(APP_DIR))
            }
        }

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join("Library").join("Application Support").join(APP_DIR))
        }

        #[cfg(target_os = "windows")]
        {
            Ok(dirs::config_dir()
                .context("Failed to get Windows config directory")?
                .join(APP_DIR))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join(format!(".{APP_DIR}")))
        }
    }

    /// Get the profile store path (profiles.toml)
    pub fn profiles_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("profiles.toml"))
    }

    /// Get the log file path
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("perforce-tools.log"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;
        Ok(config_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_paths() {
        let config_dir = ConfigManager::config_dir().unwrap();
        assert!(config_dir.to_string_lossy().contains("perforce-tools"));

        let profiles = ConfigManager::profiles_path().unwrap();
        assert!(profiles.to_string_lossy().ends_with("profiles.toml"));

        let log = ConfigManager::log_file_path().unwrap();
        assert!(log.to_string_lossy().ends_with("perforce-tools.log"));
    }

    #[test]
    #[serial]
    #[cfg(target_os = "linux")]
    fn test_xdg_config_home_respected() {
        let previous = std::env::var("XDG_CONFIG_HOME").ok();
        std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-xdg-config");

        let config_dir = ConfigManager::config_dir().unwrap();
        assert_eq!(config_dir, PathBuf::from("/tmp/test-xdg-config/perforce-tools"));

        match previous {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }
}
