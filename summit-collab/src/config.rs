use std::{env, path::PathBuf, str::FromStr, time::Duration};

use summit_core::ImageContentType;
use thiserror::Error;

/// Settings for the collab system.
/// Every value has a default that works for local development.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without it, data is kept in memory.
    pub database_url: Option<String>,
    /// How long an access token is valid
    pub session_duration: chrono::Duration,
    /// How long a refresh token is valid
    pub refresh_duration: chrono::Duration,
    /// How long a presigned file URL is valid
    pub url_expiration: Duration,
    /// How often the goal room scheduler runs
    pub scheduler_interval: Duration,
    pub storage: StorageConfig,
    pub default_image: DefaultImage,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory blobs are written to
    pub root: PathBuf,
    /// Prefix of every blob key
    pub sub_directory: String,
    /// Where blobs are served from
    pub base_url: String,
    /// Used to sign presigned URLs
    pub secret: String,
}

/// The profile image given to new members.
/// The path is `server_file_path_prefix` followed by a number in `1..=count`.
#[derive(Debug, Clone)]
pub struct DefaultImage {
    pub original_file_name: String,
    pub server_file_path_prefix: String,
    pub count: u32,
    pub content_type: ImageContentType,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a positive number, got {value}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} has an unknown image content type {value}")]
    InvalidContentType { name: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            session_duration: chrono::Duration::days(7),
            refresh_duration: chrono::Duration::days(14),
            url_expiration: Duration::from_secs(60 * 60),
            scheduler_interval: Duration::from_secs(60 * 60),
            storage: Default::default(),
            default_image: Default::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            sub_directory: "summit".to_string(),
            base_url: "http://localhost:9050/files/".to_string(),
            secret: "development-secret".to_string(),
        }
    }
}

impl Default for DefaultImage {
    fn default() -> Self {
        Self {
            original_file_name: "default-member-image".to_string(),
            server_file_path_prefix: "member/default/".to_string(),
            count: 5,
            content_type: ImageContentType::Webp,
        }
    }
}

impl Config {
    /// Reads `SUMMIT_*` environment variables on top of the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.database_url = lookup("SUMMIT_DATABASE_URL").filter(|url| !url.is_empty());

        if let Some(days) = number::<i64, _>(&lookup, "SUMMIT_SESSION_DAYS")? {
            config.session_duration = chrono::Duration::days(days);
        }
        if let Some(days) = number::<i64, _>(&lookup, "SUMMIT_REFRESH_DAYS")? {
            config.refresh_duration = chrono::Duration::days(days);
        }
        if let Some(secs) = number(&lookup, "SUMMIT_URL_EXPIRATION_SECS")? {
            config.url_expiration = Duration::from_secs(secs);
        }
        if let Some(secs) = number(&lookup, "SUMMIT_SCHEDULER_INTERVAL_SECS")? {
            config.scheduler_interval = Duration::from_secs(secs);
        }

        let storage = &mut config.storage;
        if let Some(root) = lookup("SUMMIT_BLOB_ROOT") {
            storage.root = PathBuf::from(root);
        }
        if let Some(sub_directory) = lookup("SUMMIT_BLOB_SUB_DIRECTORY") {
            storage.sub_directory = sub_directory;
        }
        if let Some(base_url) = lookup("SUMMIT_BLOB_BASE_URL") {
            storage.base_url = base_url;
        }
        if let Some(secret) = lookup("SUMMIT_BLOB_SECRET") {
            storage.secret = secret;
        }

        let image = &mut config.default_image;
        if let Some(name) = lookup("SUMMIT_DEFAULT_IMAGE_NAME") {
            image.original_file_name = name;
        }
        if let Some(prefix) = lookup("SUMMIT_DEFAULT_IMAGE_PREFIX") {
            image.server_file_path_prefix = prefix;
        }
        if let Some(count) = number(&lookup, "SUMMIT_DEFAULT_IMAGE_COUNT")? {
            image.count = count;
        }
        if let Some(value) = lookup("SUMMIT_DEFAULT_IMAGE_TYPE") {
            image.content_type =
                value
                    .parse()
                    .map_err(|_| ConfigError::InvalidContentType {
                        name: "SUMMIT_DEFAULT_IMAGE_TYPE",
                        value,
                    })?;
        }

        Ok(config)
    }
}

/// Parses a positive number, if the variable is set
fn number<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr + PartialOrd + Default,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(name) else {
        return Ok(None);
    };

    match value.trim().parse::<T>() {
        Ok(number) if number > T::default() => Ok(Some(number)),
        _ => Err(ConfigError::InvalidNumber { name, value }),
    }
}
