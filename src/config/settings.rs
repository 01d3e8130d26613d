//! Settings structures for image search configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of images processed at the same time
pub const DEFAULT_MAX_CONCURRENCY: usize = 3;

/// Default bounding box for the "small" derivative
pub const DEFAULT_SMALL_DIMENSION: u32 = 1024;

/// Default bounding box for the thumbnail derivative
pub const DEFAULT_THUMBNAIL_DIMENSION: u32 = 256;

/// JPEG quality used for every derivative
pub const ENCODE_QUALITY: u8 = 85;

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub unsplash: UnsplashSettings,
    pub image_processing: ImageProcessingSettings,
    pub retry: RetrySettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("IMAGE_SEARCH_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("IMAGE_SEARCH_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("IMAGE_SEARCH_ENVIRONMENT") {
            if let Ok(env) = serde_yaml::from_str(&val) {
                self.server.environment = env;
            }
        }
        if let Ok(val) = std::env::var("UNSPLASH_API_KEY") {
            self.unsplash.api_key = val;
        }
        if let Ok(val) = std::env::var("IMAGE_SEARCH_OUTPUT_DIR") {
            self.image_processing.output_directory = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("IMAGE_SEARCH_MAX_CONCURRENCY") {
            if let Ok(n) = val.parse() {
                self.image_processing.max_concurrency = n;
            }
        }
    }

    /// Check settings that have no usable default
    pub fn validate(&self) -> Result<()> {
        if self.unsplash.api_key.trim().is_empty() {
            anyhow::bail!("Unsplash API key is missing (set unsplash.api_key or UNSPLASH_API_KEY)");
        }
        url::Url::parse(&self.unsplash.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid unsplash.base_url: {}", e))?;
        for (name, secs) in [
            ("unsplash.timeout", self.unsplash.timeout),
            ("image_processing.download_timeout", self.image_processing.download_timeout),
        ] {
            match Duration::try_from_secs_f64(secs) {
                Ok(d) if !d.is_zero() => {}
                _ => anyhow::bail!("{} must be a positive number of seconds", name),
            }
        }
        Ok(())
    }
}

/// Deployment environment, controls CORS policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
    /// Deployment environment
    pub environment: Environment,
    /// Origins allowed by CORS outside development
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: "127.0.0.1".to_string(),
            environment: Environment::default(),
            allowed_origins: vec!["https://example.com".to_string()],
        }
    }
}

/// Upstream photo provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsplashSettings {
    /// Access key sent as `client_id`
    pub api_key: String,
    /// API root
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout: f64,
    /// Number of candidates requested per search
    pub max_results: u32,
}

impl Default for UnsplashSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.unsplash.com".to_string(),
            timeout: 30.0,
            max_results: 10,
        }
    }
}

/// Image pipeline settings.
///
/// Numeric limits are signed so that a zero or negative value in the file
/// falls back to the default instead of failing to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageProcessingSettings {
    /// Directory derivatives are written to
    pub output_directory: PathBuf,
    /// URL prefix under which stored derivatives are served
    pub public_prefix: String,
    pub max_concurrency: i64,
    pub small_image_dimension: i64,
    pub thumbnail_dimension: i64,
    /// Timeout for a single image download in seconds
    pub download_timeout: f64,
}

impl Default for ImageProcessingSettings {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("processed-images"),
            public_prefix: "/api/images".to_string(),
            max_concurrency: 0,
            small_image_dimension: 0,
            thumbnail_dimension: 0,
            download_timeout: 120.0,
        }
    }
}

impl UnsplashSettings {
    /// Per-attempt request timeout; unusable values fall back to 30s
    pub fn request_timeout(&self) -> Duration {
        seconds_or(self.timeout, Duration::from_secs(30))
    }
}

impl ImageProcessingSettings {
    /// Per-download timeout; unusable values fall back to 120s
    pub fn download_timeout(&self) -> Duration {
        seconds_or(self.download_timeout, Duration::from_secs(120))
    }

    /// Effective concurrency limit (always at least 1)
    pub fn concurrency(&self) -> usize {
        positive_or(self.max_concurrency, DEFAULT_MAX_CONCURRENCY)
    }

    /// Effective bounding box of the small derivative
    pub fn small_dimension(&self) -> u32 {
        positive_or(self.small_image_dimension, DEFAULT_SMALL_DIMENSION)
    }

    /// Effective bounding box of the thumbnail
    pub fn thumb_dimension(&self) -> u32 {
        positive_or(self.thumbnail_dimension, DEFAULT_THUMBNAIL_DIMENSION)
    }
}

/// Retry policy for upstream search calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Number of retries after the first attempt
    pub max_retries: u32,
    /// Base delay, multiplied by 2^attempt
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

fn seconds_or(secs: f64, default: Duration) -> Duration {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) if !d.is_zero() => d,
        _ => default,
    }
}

fn positive_or<T: TryFrom<i64>>(value: i64, default: T) -> T {
    if value > 0 {
        T::try_from(value).unwrap_or(default)
    } else {
        default
    }
}
