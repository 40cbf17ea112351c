//! Environment-driven configuration for the client and the server.
//!
//! Values are read from the process environment after loading an optional
//! `.env` file. Every key has a default so a bare checkout runs locally.

use crate::rosbag::AcceptedExtensions;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default server URI used by the client.
const DEFAULT_SERVER_URI: &str = "http://127.0.0.1:8080";

/// Default host.
const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port.
const DEFAULT_PORT: u16 = 8080;

/// Default bucket name.
const DEFAULT_BUCKET: &str = "ros2-rosbag";

/// Default bucket directory.
const DEFAULT_BUCKET_DIR: &str = "./bucket";

/// Default number of objects per listing page.
const DEFAULT_LIST_PAGE_SIZE: usize = 1000;

/// Default upload limit per file (20 GiB).
const DEFAULT_MAX_UPLOAD_SIZE: u64 = 20 * 1024 * 1024 * 1024;

/// Default timeout for non-upload requests.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URI of the rosbag server (`ROS2_ROSBAG_SERVER_URI`).
    pub server_uri: String,
    /// Extensions accepted by local validation (`ACCEPT_FILE_EXTENSIONS`).
    pub accepted_extensions: AcceptedExtensions,
    /// Timeout for everything except uploads (`REQUEST_TIMEOUT_SECS`).
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_uri: String::from(DEFAULT_SERVER_URI),
            accepted_extensions: AcceptedExtensions::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Loads `.env` (if present) and reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            server_uri: lookup("ROS2_ROSBAG_SERVER_URI").unwrap_or(defaults.server_uri),
            accepted_extensions: extensions(&lookup)?.unwrap_or(defaults.accepted_extensions),
            request_timeout: parsed::<u64>(&lookup, "REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        })
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (`HOST`).
    pub host: String,
    /// Port to bind to (`PORT`).
    pub port: u16,
    /// Bucket name reported as `filepath` (`S3_BUCKET`).
    pub bucket: String,
    /// Directory backing the bucket (`BUCKET_DIR`).
    pub bucket_dir: PathBuf,
    /// Objects per listing page (`LIST_PAGE_SIZE`).
    pub list_page_size: usize,
    /// Largest accepted file in bytes (`MAX_UPLOAD_SIZE`).
    pub max_upload_size: u64,
    /// Extensions accepted for upload (`ACCEPT_FILE_EXTENSIONS`).
    pub accepted_extensions: AcceptedExtensions,
    /// Processing service endpoint (`PROCESSING_SERVICE_URL`).
    pub processing_service_url: Option<String>,
    /// CORS origins (`ALLOWED_ORIGINS`, comma separated).
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            bucket: String::from(DEFAULT_BUCKET),
            bucket_dir: PathBuf::from(DEFAULT_BUCKET_DIR),
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            accepted_extensions: AcceptedExtensions::default(),
            processing_service_url: None,
            allowed_origins: vec![],
        }
    }
}

impl ServerConfig {
    /// Loads `.env` (if present) and reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT")?.unwrap_or(defaults.port),
            bucket: lookup("S3_BUCKET").unwrap_or(defaults.bucket),
            bucket_dir: lookup("BUCKET_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.bucket_dir),
            list_page_size: parsed(&lookup, "LIST_PAGE_SIZE")?.unwrap_or(defaults.list_page_size),
            max_upload_size: parsed(&lookup, "MAX_UPLOAD_SIZE")?.unwrap_or(defaults.max_upload_size),
            accepted_extensions: extensions(&lookup)?.unwrap_or(defaults.accepted_extensions),
            processing_service_url: lookup("PROCESSING_SERVICE_URL").filter(|url| !url.trim().is_empty()),
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or(defaults.allowed_origins),
        };

        if config.list_page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "LIST_PAGE_SIZE",
                value: String::from("0"),
                reason: String::from("must be greater than zero"),
            });
        }

        Ok(config)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                value: value.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn extensions(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<AcceptedExtensions>, ConfigError> {
    let Some(value) = lookup("ACCEPT_FILE_EXTENSIONS") else {
        return Ok(None);
    };
    let extensions = AcceptedExtensions::parse(&value);
    if extensions.as_slice().is_empty() {
        return Err(ConfigError::Invalid {
            key: "ACCEPT_FILE_EXTENSIONS",
            value,
            reason: String::from("at least one extension is required"),
        });
    }
    Ok(Some(extensions))
}
