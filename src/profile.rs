//! Named connection profiles persisted in `profiles.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::ConfigManager;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Profile '{0}' does not exist")]
    NotFound(String),

    #[error("Failed to access profile store {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse profile store: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize profile store: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to locate config directory: {0}")]
    Location(String),
}

/// Connection details for one Perforce server account
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Server address, e.g. `ssl:perforce.example.com:1666`
    pub host: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profiles: BTreeMap<String, Profile>,
}

/// File-backed profile store
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    /// Store at the default location in the config directory
    pub fn open_default() -> Result<Self, ProfileError> {
        let path =
            ConfigManager::profiles_path().map_err(|e| ProfileError::Location(e.to_string()))?;
        Ok(Self::at(path))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All profiles, ordered by name
    pub fn list(&self) -> Result<BTreeMap<String, Profile>, ProfileError> {
        Ok(self.load()?.profiles)
    }

    pub fn get(&self, name: &str) -> Result<Profile, ProfileError> {
        self.load()?
            .profiles
            .remove(name)
            .ok_or_else(|| ProfileError::NotFound(name.to_string()))
    }

    /// Insert or replace a profile
    pub fn save(&self, name: &str, profile: Profile) -> Result<(), ProfileError> {
        let mut file = self.load()?;
        file.profiles.insert(name.to_string(), profile);
        self.write(&file)
    }

    pub fn delete(&self, name: &str) -> Result<Profile, ProfileError> {
        let mut file = self.load()?;
        let removed = file
            .profiles
            .remove(name)
            .ok_or_else(|| ProfileError::NotFound(name.to_string()))?;
        self.write(&file)?;
        Ok(removed)
    }

    fn load(&self) -> Result<ProfileFile, ProfileError> {
        if !self.path.exists() {
            return Ok(ProfileFile::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| ProfileError::Io {
            path: self.path.clone(),
            source,
        })?;

        Ok(toml::from_str(&content)?)
    }

    fn write(&self, file: &ProfileFile) -> Result<(), ProfileError> {
        let io_err = |source: std::io::Error| ProfileError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = toml::to_string_pretty(file)?;
        fs::write(&self.path, content).map_err(io_err)?;

        // Passwords are stored in clear text
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).map_err(io_err)?;
        }

        Ok(())
    }
}
