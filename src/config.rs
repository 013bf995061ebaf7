//! Configuration types for the studio server, CLI and backends

use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable holding the remote backend API key
pub const API_KEY_ENV: &str = "BG_STUDIO_API_KEY";
/// Environment variable overriding the remote backend base URL
pub const BACKEND_URL_ENV: &str = "BG_STUDIO_BACKEND_URL";

/// Output image format options for processed results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    #[default]
    Png,
    /// JPEG (no transparency)
    Jpeg,
    /// WebP with alpha channel transparency (lossless)
    WebP,
    /// TIFF with alpha channel transparency
    Tiff,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpeg"),
            Self::WebP => write!(f, "webp"),
            Self::Tiff => write!(f, "tiff"),
        }
    }
}

/// HTTP surface settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Largest accepted upload in bytes, all multipart fields together
    pub max_upload_bytes: usize,
    /// Number of HTTP workers (0 = one per core)
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7860,
            max_upload_bytes: 20 * 1024 * 1024,
            workers: 0,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Remote processing service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the processing API
    pub base_url: String,
    /// Bearer token sent with every request
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Per-request timeout enforced by the HTTP client (None = wait indefinitely)
    pub timeout_secs: Option<u64>,
    /// Path of the background removal endpoint
    pub remove_background_path: String,
    /// Path of the upscaling endpoint
    pub upscale_path: String,
    /// Path of the background blur endpoint
    pub blur_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            api_key: None,
            timeout_secs: None,
            remove_background_path: "/v1/remove-background".to_string(),
            upscale_path: "/v1/upscale".to_string(),
            blur_path: "/v1/blur-background".to_string(),
        }
    }
}

/// Free generation allowance per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    pub enabled: bool,
    /// Successful generations allowed per session
    pub free_generations: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            free_generations: 5,
        }
    }
}

/// Complete studio configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub quota: QuotaConfig,
    /// Directory holding `remove-background/`, `upscale/` and `blur/` sample images
    pub examples_dir: Option<PathBuf>,
    /// Encoding of processed images returned to clients and written by the CLI
    pub output_format: OutputFormat,
    /// JPEG quality (0-100, only used for JPEG output)
    pub jpeg_quality: u8,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: BackendConfig::default(),
            quota: QuotaConfig::default(),
            examples_dir: None,
            output_format: OutputFormat::default(),
            jpeg_quality: 90,
        }
    }
}

impl StudioConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bg_studio::StudioConfig;
    ///
    /// let config = StudioConfig::builder()
    ///     .port(8080)
    ///     .backend_url("https://api.example.com")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.server.port, 8080);
    /// ```
    #[must_use]
    pub fn builder() -> StudioConfigBuilder {
        StudioConfigBuilder::default()
    }

    /// Load a JSON configuration file; missing keys keep their defaults
    ///
    /// # Errors
    /// - `Io` if the file cannot be read
    /// - `InvalidConfig` if it is not valid JSON for this schema
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| StudioError::file_io_error("read config file", path, &e))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            StudioError::invalid_config(format!("{}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Default location of the configuration file (`<config dir>/bg-studio/config.json`)
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bg-studio").join("config.json"))
    }

    /// Apply `BG_STUDIO_*` environment overrides
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.backend.api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                self.backend.base_url = url.trim().to_string();
            }
        }
        self
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Port 0
    /// - Upload limit of 0 bytes
    /// - Backend URL without an http(s) scheme
    /// - Quota enabled with zero free generations
    /// - JPEG quality above 100
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(StudioError::config_value_error(
                "port",
                0,
                "1-65535",
                Some(7860),
            ));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(StudioError::invalid_config(
                "max_upload_bytes must be greater than zero",
            ));
        }

        let url = self.backend.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StudioError::invalid_config(format!(
                "Backend URL must start with http:// or https:// (got '{}')",
                url
            )));
        }

        if self.quota.enabled && self.quota.free_generations == 0 {
            return Err(StudioError::config_value_error(
                "free_generations",
                0,
                "1 or more",
                Some(5),
            ));
        }

        if self.jpeg_quality > 100 {
            return Err(StudioError::config_value_error(
                "JPEG quality",
                self.jpeg_quality,
                "0-100",
                Some(90),
            ));
        }

        Ok(())
    }
}

/// Builder for `StudioConfig`
#[derive(Debug, Default)]
pub struct StudioConfigBuilder {
    config: StudioConfig,
}

impl StudioConfigBuilder {
    /// Start from an existing configuration (e.g. one loaded from disk)
    #[must_use]
    pub fn from_config(config: StudioConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    #[must_use]
    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.server.max_upload_bytes = bytes;
        self
    }

    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.server.workers = workers;
        self
    }

    #[must_use]
    pub fn backend_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.backend.base_url = url.into();
        self
    }

    #[must_use]
    pub fn api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.config.backend.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.config.backend.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn quota(mut self, free_generations: Option<u32>) -> Self {
        match free_generations {
            Some(limit) => {
                self.config.quota.enabled = true;
                self.config.quota.free_generations = limit;
            },
            None => self.config.quota.enabled = false,
        }
        self
    }

    #[must_use]
    pub fn examples_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.examples_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(0, 100);
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// Any error reported by [`StudioConfig::validate`]
    pub fn build(self) -> Result<StudioConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
