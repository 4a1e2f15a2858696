//! Configuration management.
//!
//! Configuration lives in a single TOML file, by default at
//! `~/.ncli/config.toml`, overridable with `--config` or `NCLI_CONFIG`.
//! It is loaded once in `main`, validated eagerly, and threaded by value
//! into each command; there is no process-wide config singleton.

mod auth;

pub use auth::AmazonAuth;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Country codes with an Audible marketplace.
const COUNTRY_CODES: &[&str] = &["us", "ca", "uk", "au", "fr", "de", "es", "jp", "it", "in"];

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub amazon: AmazonConfig,
    #[serde(default)]
    pub youtube: YoutubeConfig,

    /// Directory the config file was loaded from; relative paths inside the
    /// config (the auth file) are resolved against it.
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Settings shared by the Audible and Kindle exporters.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AmazonConfig {
    /// Path to the auth file (device registration JSON). Relative paths are
    /// resolved against the config directory.
    #[serde(default)]
    pub auth_file: String,

    /// Audible marketplace country code. Default `us`.
    #[serde(default = "default_country_code")]
    pub country_code: String,
}

impl Default for AmazonConfig {
    fn default() -> Self {
        Self {
            auth_file: String::new(),
            country_code: default_country_code(),
        }
    }
}

fn default_country_code() -> String {
    "us".to_string()
}

/// Settings for the YouTube exporter.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YoutubeConfig {
    /// Preferred transcript language. Default `en`.
    #[serde(default = "default_language")]
    pub language: String,

    /// Span of transcript grouped into one summarization request.
    /// Default 15 minutes, which typically fits an 8K context window.
    #[serde(default = "default_summary_window")]
    pub summary_time_window_minutes: u64,

    /// Chat-completion model used for summarization. With an empty model the
    /// summary is just the concatenated window text, which is useful when
    /// summarizing in an external app instead.
    #[serde(default)]
    pub model: String,

    /// Base URL of the OpenAI-compatible API. The key comes from the
    /// `OPENAI_API_KEY` environment variable.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_prompt_system")]
    pub prompt_system: String,

    #[serde(default = "default_prompt_summarize")]
    pub prompt_summarize: String,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            summary_time_window_minutes: default_summary_window(),
            model: String::new(),
            api_base: default_api_base(),
            prompt_system: default_prompt_system(),
            prompt_summarize: default_prompt_summarize(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_summary_window() -> u64 {
    15
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_prompt_system() -> String {
    "You are a helpful assistant.".to_string()
}

fn default_prompt_summarize() -> String {
    "Can you analyze all the key points and arrange them into cohesive paragraphs? \
     Do not reorder/remove any of the key points. Keep the number of paragraphs to a minimum. \
     Respond only with the paragraphs. Do not add your own words."
        .to_string()
}

impl Config {
    /// Load and validate the config file.
    ///
    /// A missing file yields the defaults; commands that need a filled-in
    /// section report their own, more specific error. A present but invalid
    /// file is always an error.
    ///
    /// # Errors
    ///
    /// `Error::Config` for unparseable content or invalid values.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let mut config = Self::default();
            config.base_dir = base_dir_of(path);
            return Ok(config);
        }

        let raw = fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.base_dir = base_dir_of(path);
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !COUNTRY_CODES.contains(&self.amazon.country_code.as_str()) {
            return Err(Error::Config(format!(
                "unknown amazon.country_code '{}' (expected one of: {})",
                self.amazon.country_code,
                COUNTRY_CODES.join(", ")
            )));
        }
        if self.youtube.summary_time_window_minutes == 0 {
            return Err(Error::Config(
                "youtube.summary_time_window_minutes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Absolute path of the Amazon auth file.
    ///
    /// # Errors
    ///
    /// `Error::Config` if no auth file is configured.
    pub fn amazon_auth_path(&self) -> Result<PathBuf> {
        if self.amazon.auth_file.is_empty() {
            return Err(Error::Config(
                "amazon.auth_file is not set; Audible and Kindle exports need one".to_string(),
            ));
        }

        let path = Path::new(&self.amazon.auth_file);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.base_dir.join(path))
        }
    }
}

fn base_dir_of(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Resolve the config file path.
///
/// Priority: explicit `--config` flag (clap also feeds `NCLI_CONFIG` into
/// it), then `~/.ncli/config.toml`.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from(".ncli"), |b| b.home_dir().join(".ncli"))
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(&temp_dir.path().join("config.toml")).unwrap();

        assert_eq!(config.amazon.country_code, "us");
        assert_eq!(config.youtube.language, "en");
        assert_eq!(config.youtube.summary_time_window_minutes, 15);
        assert!(config.youtube.model.is_empty());
    }

    #[test]
    fn test_load_and_resolve_auth_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "[amazon]\nauth_file = \"audible-auth.json\"\ncountry_code = \"de\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.amazon.country_code, "de");
        assert_eq!(
            config.amazon_auth_path().unwrap(),
            temp_dir.path().join("audible-auth.json")
        );
    }

    #[test]
    fn test_unknown_country_code_rejected_at_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[amazon]\ncountry_code = \"zz\"\n").unwrap();

        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_key_rejected_at_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[amazon]\nauthfile = \"typo.json\"\n").unwrap();

        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_auth_file_is_a_config_error() {
        let config = Config::default();
        assert!(matches!(config.amazon_auth_path(), Err(Error::Config(_))));
    }
}
