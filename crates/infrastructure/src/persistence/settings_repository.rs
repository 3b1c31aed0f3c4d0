//! Session settings loading.
//!
//! Reads settings from the platform-specific config directory:
//! - Linux/macOS: ~/.config/warden/settings.json
//! - Windows: %APPDATA%/warden/settings.json
//!
//! Environment variables override individual fields afterwards.

use std::path::PathBuf;

use tokio::fs;
use tracing::{debug, info};
use warden_domain::{DomainError, SessionSettings};

/// Overrides `api_base_url`.
pub const ENV_API_URL: &str = "WARDEN_API_URL";

/// Overrides `enforce_authentication`.
pub const ENV_ENFORCE_AUTH: &str = "WARDEN_ENFORCE_AUTH";

/// Overrides `storage_path`.
pub const ENV_STORAGE_PATH: &str = "WARDEN_STORAGE_PATH";

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid JSON for `SessionSettings`.
    #[error("Invalid settings file {path}: {message}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// An environment override could not be interpreted.
    #[error("Invalid value for {name}: {value}")]
    InvalidOverride {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },

    /// The resulting settings are unusable.
    #[error(transparent)]
    Invalid(#[from] DomainError),

    /// Could not determine config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Repository for session settings.
#[derive(Debug, Clone, Default)]
pub struct SettingsRepository {
    path: Option<PathBuf>,
}

impl SettingsRepository {
    /// Creates a repository reading from the platform config directory.
    #[must_use]
    pub const fn new() -> Self {
        Self { path: None }
    }

    /// Creates a repository reading from an explicit file.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Returns the path to the Warden config directory.
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("warden"))
    }

    /// Returns the path to the settings file.
    #[must_use]
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| Self::config_dir().map(|p| p.join("settings.json")))
    }

    /// Loads settings from disk and applies environment overrides.
    ///
    /// Returns default settings if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, an override is
    /// malformed, or the result fails validation.
    pub async fn load(&self) -> Result<SessionSettings, SettingsError> {
        let settings = self.load_file().await?;
        let settings = apply_overrides(settings, |name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from disk without overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load_file(&self) -> Result<SessionSettings, SettingsError> {
        let Some(path) = self.settings_path() else {
            return Ok(SessionSettings::default());
        };

        if !fs::try_exists(&path).await? {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(SessionSettings::default());
        }

        let content = fs::read(&path).await?;
        let settings = serde_json::from_slice(&content).map_err(|e| SettingsError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if no location is known or the file cannot be written.
    pub async fn save(&self, settings: &SessionSettings) -> Result<(), SettingsError> {
        let Some(path) = self.settings_path() else {
            return Err(SettingsError::NoConfigDir);
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_vec_pretty(settings).map_err(|e| SettingsError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&path, content).await?;
        Ok(())
    }
}

/// Applies environment overrides read through `lookup`.
///
/// # Errors
///
/// Returns `InvalidOverride` when `WARDEN_ENFORCE_AUTH` is not a boolean.
pub fn apply_overrides<F>(
    mut settings: SessionSettings,
    lookup: F,
) -> Result<SessionSettings, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
        settings.api_base_url = url;
    }
    if let Some(value) = lookup(ENV_ENFORCE_AUTH) {
        settings.enforce_authentication = match parse_flag(&value) {
            Some(flag) => flag,
            None => {
                return Err(SettingsError::InvalidOverride {
                    name: ENV_ENFORCE_AUTH,
                    value,
                });
            }
        };
    }
    if let Some(path) = lookup(ENV_STORAGE_PATH).filter(|v| !v.trim().is_empty()) {
        settings.storage_path = Some(PathBuf::from(path));
    }
    Ok(settings)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Resolves the storage file: the configured path, else the platform default.
#[must_use]
pub fn storage_path(settings: &SessionSettings) -> Option<PathBuf> {
    settings
        .storage_path
        .clone()
        .or_else(crate::persistence::FileKeyValueStorage::default_path)
}
