//! Configuration management for vaya.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::capture::AudioFormat;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "vaya";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "vaya.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `VAYA_`)
/// 2. TOML config file at `~/.config/vaya/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Voice capture configuration.
    pub capture: CaptureConfig,
    /// Transcription configuration.
    pub transcription: TranscriptionConfig,
    /// Spreadsheet export configuration.
    pub export: ExportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/vaya/vaya.db`
    pub database_path: Option<PathBuf>,
    /// Maximum number of recordings to retain.
    /// Set to 0 for unlimited.
    pub max_recordings: usize,
}

/// Voice capture configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// MIME type of the recording container.
    pub mime_type: String,
    /// Capacity of the chunk channel between source and session.
    pub chunk_buffer: usize,
}

/// Transcription-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// URL of the transcription endpoint.
    pub endpoint: String,
    /// BCP-47 language hint sent with each request (e.g. "es").
    pub language: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Substitute a canned transcript when the service fails.
    pub fallback_enabled: bool,
}

/// Spreadsheet export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Name of the worksheet written on export.
    pub sheet_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sheet_name: crate::workbook::DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            max_recordings: 10_000,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            mime_type: "audio/webm".to_string(),
            chunk_buffer: 64,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.vaya.app/v1/transcribe".to_string(),
            language: None,
            timeout_secs: 30,
            fallback_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `VAYA_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("VAYA_").split("_"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.transcription.endpoint.is_empty() {
            return Err(Error::ConfigValidation {
                message: "transcription endpoint must not be empty".to_string(),
            });
        }

        if self.transcription.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.capture.chunk_buffer == 0 {
            return Err(Error::ConfigValidation {
                message: "chunk_buffer must be greater than 0".to_string(),
            });
        }

        if self.export.sheet_name.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "export sheet_name must not be empty".to_string(),
            });
        }

        if AudioFormat::from_mime(&self.capture.mime_type).is_none() {
            return Err(Error::ConfigValidation {
                message: format!("unsupported recording mime type: {}", self.capture.mime_type),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the recording container format.
    ///
    /// Only call after [`Config::validate`]; falls back to WebM for an
    /// unknown MIME type.
    #[must_use]
    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat::from_mime(&self.capture.mime_type).unwrap_or(AudioFormat::Webm)
    }

    /// Get the transcription request timeout as a Duration.
    #[must_use]
    pub fn transcription_timeout(&self) -> Duration {
        Duration::from_secs(self.transcription.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert!(config.transcription.fallback_enabled);
        assert!(config.transcription.language.is_none());
    }

    #[test]
    fn test_default_storage_config() {
        let storage = StorageConfig::default();

        assert!(storage.database_path.is_none());
        assert_eq!(storage.max_recordings, 10_000);
    }

    #[test]
    fn test_default_capture_config() {
        let capture = CaptureConfig::default();

        assert_eq!(capture.mime_type, "audio/webm");
        assert_eq!(capture.chunk_buffer, 64);
    }

    #[test]
    fn test_default_transcription_config() {
        let transcription = TranscriptionConfig::default();

        assert!(!transcription.endpoint.is_empty());
        assert_eq!(transcription.timeout_secs, 30);
        assert!(transcription.fallback_enabled);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_endpoint() {
        let mut config = Config::default();
        config.transcription.endpoint = String::new();

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("endpoint"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.transcription.timeout_secs = 0;

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("timeout_secs"));
    }

    #[test]
    fn test_validate_zero_chunk_buffer() {
        let mut config = Config::default();
        config.capture.chunk_buffer = 0;

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("chunk_buffer"));
    }

    #[test]
    fn test_validate_blank_sheet_name() {
        let mut config = Config::default();
        config.export.sheet_name = "   ".to_string();

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("sheet_name"));
    }

    #[test]
    fn test_default_export_config() {
        let export = ExportConfig::default();
        assert_eq!(export.sheet_name, "Family");
    }

    #[test]
    fn test_validate_unknown_mime_type() {
        let mut config = Config::default();
        config.capture.mime_type = "audio/flac".to_string();

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("mime type"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("vaya.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_audio_format_default() {
        let config = Config::default();
        assert_eq!(config.audio_format(), AudioFormat::Webm);
    }

    #[test]
    fn test_audio_format_ogg() {
        let mut config = Config::default();
        config.capture.mime_type = "audio/ogg".to_string();
        assert_eq!(config.audio_format(), AudioFormat::Ogg);
    }

    #[test]
    fn test_transcription_timeout() {
        let config = Config::default();
        assert_eq!(config.transcription_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("vaya"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_default_data_dir() {
        let path = Config::default_data_dir();
        assert!(path.to_string_lossy().contains("vaya"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_clone() {
        let config = Config::default();
        let cloned = config.clone();
        assert_eq!(config, cloned);
    }

    #[test]
    fn test_storage_config_deserialize() {
        let json = r#"{"max_recordings": 500}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.max_recordings, 500);
        assert!(storage.database_path.is_none());
    }

    #[test]
    fn test_transcription_config_serialize() {
        let transcription = TranscriptionConfig::default();
        let json = serde_json::to_string(&transcription).unwrap();
        assert!(json.contains("endpoint"));
        assert!(json.contains("fallback_enabled"));
    }
}
