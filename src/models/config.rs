//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Notice feed settings
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Document download constraints
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Risk keyword settings
    #[serde(default)]
    pub flagging: FlaggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("cannot read {}: {}", path.display(), e)))?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.feed_url.trim().is_empty() {
            return Err(AppError::validation("source.feed_url is empty"));
        }
        if self.source.name.trim().is_empty() {
            return Err(AppError::validation("source.name is empty"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.http.connect_timeout_secs == 0 {
            return Err(AppError::validation("http.connect_timeout_secs must be > 0"));
        }
        if self.acquisition.max_document_bytes == 0 {
            return Err(AppError::validation(
                "acquisition.max_document_bytes must be > 0",
            ));
        }
        if self.acquisition.probe_timeout_secs == 0
            || self.acquisition.download_timeout_secs == 0
            || self.acquisition.extraction_timeout_secs == 0
        {
            return Err(AppError::validation("acquisition timeouts must be > 0"));
        }
        if !self.acquisition.document_extension.starts_with('.') {
            return Err(AppError::validation(
                "acquisition.document_extension must start with '.'",
            ));
        }
        if self.acquisition.content_type.trim().is_empty() {
            return Err(AppError::validation("acquisition.content_type is empty"));
        }
        if self.flagging.keywords.is_empty() {
            return Err(AppError::validation("No keywords defined"));
        }
        for keyword in &self.flagging.keywords {
            if keyword.trim().is_empty() {
                return Err(AppError::validation("flagging.keywords has an empty entry"));
            }
            // Ledger cells join keyword lists with ", ".
            if keyword.contains(", ") {
                return Err(AppError::validation(format!(
                    "keyword '{}' must not contain \", \"",
                    keyword
                )));
            }
        }
        Ok(())
    }
}

/// Where notices come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Page listing the Federal Register notices
    #[serde(default = "defaults::feed_url")]
    pub feed_url: String,

    /// Tag written into every record's `source` field
    #[serde(default = "defaults::source_name")]
    pub name: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            feed_url: defaults::feed_url(),
            name: defaults::source_name(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds for feed pages
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "defaults::connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            connect_timeout_secs: defaults::connect_timeout(),
        }
    }
}

/// Document download constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Size ceiling in bytes
    #[serde(default = "defaults::max_document_bytes")]
    pub max_document_bytes: u64,

    /// Timeout for the HEAD probe
    #[serde(default = "defaults::probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Timeout for the full download
    #[serde(default = "defaults::download_timeout")]
    pub download_timeout_secs: u64,

    /// Timeout for text extraction from one document
    #[serde(default = "defaults::extraction_timeout")]
    pub extraction_timeout_secs: u64,

    /// Required URL path suffix, compared case-insensitively
    #[serde(default = "defaults::document_extension")]
    pub document_extension: String,

    /// Required declared content type
    #[serde(default = "defaults::content_type")]
    pub content_type: String,
}

impl AcquisitionConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: defaults::max_document_bytes(),
            probe_timeout_secs: defaults::probe_timeout(),
            download_timeout_secs: defaults::download_timeout(),
            extraction_timeout_secs: defaults::extraction_timeout(),
            document_extension: defaults::document_extension(),
            content_type: defaults::content_type(),
        }
    }
}

/// Risk keyword settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggingConfig {
    /// Case-insensitive substrings that flag a notice title
    #[serde(default = "defaults::keywords")]
    pub keywords: Vec<String>,
}

impl Default for FlaggingConfig {
    fn default() -> Self {
        Self {
            keywords: defaults::keywords(),
        }
    }
}

mod defaults {
    use crate::services::flags::DEFAULT_KEYWORDS;

    // Source defaults
    pub fn feed_url() -> String {
        "https://www.bis.gov/news-updates/federal-register-notices".into()
    }
    pub fn source_name() -> String {
        "BIS Federal Register".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; regulus/0.1)".into()
    }
    pub fn timeout() -> u64 {
        15
    }
    pub fn connect_timeout() -> u64 {
        5
    }

    // Acquisition defaults
    pub fn max_document_bytes() -> u64 {
        5 * 1024 * 1024
    }
    pub fn probe_timeout() -> u64 {
        5
    }
    pub fn download_timeout() -> u64 {
        10
    }
    pub fn extraction_timeout() -> u64 {
        30
    }
    pub fn document_extension() -> String {
        ".pdf".into()
    }
    pub fn content_type() -> String {
        "application/pdf".into()
    }

    // Flagging defaults
    pub fn keywords() -> Vec<String> {
        DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
    }
}
