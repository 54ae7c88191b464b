use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use url::Url;

use crate::StorageConfig;

type HmacSha256 = Hmac<Sha256>;

/// A file about to be stored
#[derive(Debug, Clone)]
pub struct FileInformation {
    pub bytes: Vec<u8>,
    /// The MIME type, e.g. `image/png`
    pub content_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid blob path: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error("Invalid signing secret")]
    Secret,
}

/// Stores uploaded files and hands out time limited URLs to them
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    async fn save(&self, path: &str, file: FileInformation) -> Result<(), StorageError>;
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
    fn presigned_url(
        &self,
        path: &str,
        method: HttpMethod,
        expires_in: Duration,
    ) -> Result<Url, StorageError>;
}

/// A blob store on the local file system.
///
/// Blobs live at `root/sub_directory/path`. URLs point to `base_url/sub_directory/path`
/// and carry a signature that [LocalBlobStore::verify] checks.
pub struct LocalBlobStore {
    root: PathBuf,
    sub_directory: String,
    base_url: Url,
    secret: String,
}

impl LocalBlobStore {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let mut base_url = config.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            root: config.root.clone(),
            sub_directory: config.sub_directory.trim_matches('/').to_string(),
            base_url: Url::parse(&base_url)?,
            secret: config.secret.clone(),
        })
    }

    /// Checks a signature handed out by [BlobStore::presigned_url]
    pub fn verify(&self, key: &str, method: HttpMethod, expires: i64, signature: &str) -> bool {
        if expires < Utc::now().timestamp() {
            return false;
        }

        let (Ok(signature), Ok(mac)) = (hex::decode(signature), self.mac(key, method, expires))
        else {
            return false;
        };

        mac.verify_slice(&signature).is_ok()
    }

    fn key(&self, path: &str) -> Result<String, StorageError> {
        let path = path.trim_start_matches('/');
        let escapes = path.split('/').any(|segment| segment == "..");

        if path.is_empty() || escapes {
            return Err(StorageError::InvalidPath(path.to_string()));
        }

        if self.sub_directory.is_empty() {
            return Ok(path.to_string());
        }

        Ok(format!("{}/{}", self.sub_directory, path))
    }

    fn mac(&self, key: &str, method: HttpMethod, expires: i64) -> Result<HmacSha256, StorageError> {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|_| StorageError::Secret)?;

        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(method.as_str().as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());

        Ok(mac)
    }

    fn sign(&self, key: &str, method: HttpMethod, expires: i64) -> Result<String, StorageError> {
        let mac = self.mac(key, method, expires)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(&self, path: &str, file: FileInformation) -> Result<(), StorageError> {
        let full_path = self.root.join(self.key(path)?);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, file.bytes).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let full_path = self.root.join(self.key(path)?);

        match tokio::fs::remove_file(full_path).await {
            Err(error) if error.kind() != std::io::ErrorKind::NotFound => Err(error.into()),
            _ => Ok(()),
        }
    }

    fn presigned_url(
        &self,
        path: &str,
        method: HttpMethod,
        expires_in: Duration,
    ) -> Result<Url, StorageError> {
        let key = self.key(path)?;
        let expires = Utc::now().timestamp() + expires_in.as_secs() as i64;

        let mut url = self.base_url.join(&key)?;
        url.query_pairs_mut()
            .append_pair("method", method.as_str())
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &self.sign(&key, method, expires)?);

        Ok(url)
    }
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use crate::{StorageConfig, StorageError};

    use super::{BlobStore, FileInformation, HttpMethod, LocalBlobStore};

    fn store(root: &std::path::Path) -> LocalBlobStore {
        LocalBlobStore::new(&StorageConfig {
            root: root.to_path_buf(),
            sub_directory: "test".to_string(),
            base_url: "http://files.local/blobs".to_string(),
            secret: "secret".to_string(),
        })
        .unwrap()
    }

    fn png() -> FileInformation {
        FileInformation {
            bytes: vec![137, 80, 78, 71],
            content_type: "image/png".to_string(),
        }
    }

    #[tokio::test]
    async fn saves_under_the_sub_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        store.save("goal-rooms/1/feed.png", png()).await.unwrap();

        let written = std::fs::read(dir.path().join("test/goal-rooms/1/feed.png")).unwrap();
        assert_eq!(written, png().bytes);

        store.delete("goal-rooms/1/feed.png").await.unwrap();
        assert!(!dir.path().join("test/goal-rooms/1/feed.png").exists());
        store.delete("goal-rooms/1/feed.png").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let result = store.save("../outside.png", png()).await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }

    #[test]
    fn presigned_urls_verify() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let url = store
            .presigned_url("a/b.png", HttpMethod::Get, Duration::from_secs(60))
            .unwrap();
        assert_eq!(url.path(), "/blobs/test/a/b.png");

        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        let expires: i64 = query["expires"].parse().unwrap();
        let signature = &query["signature"];

        assert!(store.verify("test/a/b.png", HttpMethod::Get, expires, signature));
        assert!(!store.verify("test/a/b.png", HttpMethod::Put, expires, signature));
        assert!(!store.verify("test/a/b.png", HttpMethod::Get, expires - 3600, signature));
    }

    #[test]
    fn tampered_signatures_fail() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let url = store
            .presigned_url("a/b.png", HttpMethod::Get, Duration::from_secs(60))
            .unwrap();
        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        let expires: i64 = query["expires"].parse().unwrap();
        let signature = &query["signature"];

        assert!(!store.verify("test/a/b.pn", HttpMethod::Get, expires, signature));
        assert!(!store.verify("test/a/b.png", HttpMethod::Get, expires, "not hex"));
        assert!(!store.verify("test/a/b.png", HttpMethod::Get, expires, &signature[..10]));

        let mut flipped = signature.clone();
        let last = if flipped.ends_with('0') { "1" } else { "0" };
        flipped.replace_range(flipped.len() - 1.., last);
        assert!(!store.verify("test/a/b.png", HttpMethod::Get, expires, &flipped));
    }
}
