use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::ReportFormat;
use crate::extractors::LanguagePolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Playlist and caption provider settings
    pub provider: ProviderConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Path or name of the yt-dlp executable
    pub yt_dlp_path: String,

    /// Preferred caption languages, most preferred first
    pub languages: Vec<String>,

    /// Use auto-generated captions when no manual track matches
    pub allow_auto_captions: bool,

    /// Take any caption track when none of the preferred languages exist
    pub fallback_to_any_language: bool,

    /// Timeout for downloading a caption track
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory archives are written to (current directory if unset)
    pub output_dir: Option<PathBuf>,

    /// Pause between two videos, in milliseconds
    pub item_delay_ms: u64,

    /// Default format of the final report
    pub default_report_format: ReportFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                yt_dlp_path: "yt-dlp".to_string(),
                languages: vec!["en".to_string()],
                allow_auto_captions: true,
                fallback_to_any_language: true,
                http_timeout_secs: 30,
            },
            app: AppConfig {
                output_dir: None,
                item_delay_ms: 500,
                default_report_format: ReportFormat::Text,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let config = Self::load_from(&config_path)?;
            tracing::debug!("Loaded configuration from {}", config_path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Read and validate a specific configuration file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("playlist-transcripts").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.provider.yt_dlp_path.trim().is_empty() {
            anyhow::bail!("provider.yt_dlp_path must not be empty");
        }

        if self.provider.languages.is_empty() {
            anyhow::bail!("provider.languages must list at least one language");
        }

        if self.provider.http_timeout_secs == 0 {
            anyhow::bail!("provider.http_timeout_secs must be greater than zero");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  yt-dlp: {}", self.provider.yt_dlp_path);
        println!("  Languages: {}", self.provider.languages.join(", "));
        println!("  Auto Captions: {}", self.provider.allow_auto_captions);
        println!("  Any-Language Fallback: {}", self.provider.fallback_to_any_language);
        println!("  HTTP Timeout: {}s", self.provider.http_timeout_secs);
        match &self.app.output_dir {
            Some(dir) => println!("  Output Directory: {}", dir.display()),
            None => println!("  Output Directory: (current directory)"),
        }
        println!("  Delay Between Videos: {}ms", self.app.item_delay_ms);
        println!("  Report Format: {}", self.app.default_report_format);
    }

    /// Caption track selection derived from the provider settings
    pub fn language_policy(&self) -> LanguagePolicy {
        LanguagePolicy {
            languages: self.provider.languages.clone(),
            allow_auto_captions: self.provider.allow_auto_captions,
            fallback_to_any_language: self.provider.fallback_to_any_language,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.http_timeout_secs)
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.app.item_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs_err::write(
            &path,
            r#"
provider:
  yt_dlp_path: /opt/bin/yt-dlp
  languages: [de, en]
  allow_auto_captions: false
  fallback_to_any_language: false
  http_timeout_secs: 5
app:
  output_dir: /tmp/transcripts
  item_delay_ms: 0
  default_report_format: json
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.provider.yt_dlp_path, "/opt/bin/yt-dlp");
        assert_eq!(config.app.default_report_format, ReportFormat::Json);
        assert_eq!(config.item_delay(), Duration::ZERO);
        assert_eq!(
            config.language_policy(),
            LanguagePolicy {
                languages: vec!["de".to_string(), "en".to_string()],
                allow_auto_captions: false,
                fallback_to_any_language: false,
            }
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.provider.languages.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.provider.yt_dlp_path = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.provider.http_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
