//! Filesystem-backed blob store for uploaded files.
//!
//! Objects live under `<root>/<bucket>/<key>` and are served to clients via
//! public URLs derived from a configured base URL. The portal uses three
//! buckets: generated certificate files, user documents, and avatars.

use std::path::PathBuf;

use thiserror::Error;

/// Maximum accepted object size (application-enforced, not storage-enforced).
pub const MAX_OBJECT_BYTES: usize = 10 * 1024 * 1024;

pub const BUCKET_CERTIFICATES: &str = "certificates";
pub const BUCKET_DOCUMENTS: &str = "documents";
pub const BUCKET_AVATARS: &str = "avatars";

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Object of {0} bytes exceeds the 10 MiB limit")]
    TooLarge(usize),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Filesystem blob store rooted at a configured directory.
pub struct BlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl BlobStore {
    pub fn new(root: PathBuf, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            root,
            public_base_url,
        }
    }

    fn validate_key(key: &str) -> Result<(), BlobError> {
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        Ok(())
    }

    /// Store an object. Rejects objects over [`MAX_OBJECT_BYTES`].
    pub async fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<(), BlobError> {
        if bytes.len() > MAX_OBJECT_BYTES {
            return Err(BlobError::TooLarge(bytes.len()));
        }
        Self::validate_key(key)?;

        let dir = self.root.join(bucket);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(key), bytes).await?;
        Ok(())
    }

    /// Public URL under which a stored object is served.
    pub fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{bucket}/{key}", self.public_base_url)
    }

    /// Remove an object. Returns `false` if it did not exist.
    pub async fn remove(&self, bucket: &str, key: &str) -> Result<bool, BlobError> {
        Self::validate_key(key)?;

        match tokio::fs::remove_file(self.root.join(bucket).join(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Map a public URL produced by this store back to `(bucket, key)`.
    ///
    /// Returns `None` for URLs pointing anywhere else, so callers can skip
    /// blob cleanup for externally hosted files.
    pub fn parse_public_url(&self, url: &str) -> Option<(String, String)> {
        let rest = url.strip_prefix(&self.public_base_url)?.strip_prefix('/')?;
        let (bucket, key) = rest.split_once('/')?;
        if key.is_empty() || key.contains('/') {
            return None;
        }
        Some((bucket.to_string(), key.to_string()))
    }
}
