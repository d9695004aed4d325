//! Bucketed object storage on the local filesystem.
//!
//! Objects live at `{root}/{bucket}/{path}` and are published under
//! `{public_base_url}/{bucket}/{path}`. Uploads never overwrite an existing
//! object.

use crate::config::settings::StorageSettings;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

/// Named storage areas, one per content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    /// Profile logo/header and program images
    SchoolImages,
    /// School videos
    SchoolVideos,
    /// Applicant documents
    PpdbDocuments,
    /// News cover images
    NewsImages,
    /// Gallery photos and videos
    Gallery,
}

impl Bucket {
    /// Every bucket
    pub const ALL: [Self; 5] = [
        Self::SchoolImages,
        Self::SchoolVideos,
        Self::PpdbDocuments,
        Self::NewsImages,
        Self::Gallery,
    ];

    /// Directory and URL segment of the bucket
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SchoolImages => "school-images",
            Self::SchoolVideos => "school-videos",
            Self::PpdbDocuments => "ppdb-documents",
            Self::NewsImages => "news-images",
            Self::Gallery => "gallery",
        }
    }

    /// Parses a bucket name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_str() == name)
    }

    /// Whether objects in this bucket may be served without authentication
    #[must_use]
    pub const fn is_public(self) -> bool {
        !matches!(self, Self::PpdbDocuments)
    }
}

/// Result of an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    /// Bucket the object went into
    pub bucket: Bucket,
    /// Path inside the bucket
    pub path: String,
    /// Public URL of the object
    pub public_url: String,
}

/// Filesystem-backed object store
#[derive(Debug, Clone)]
pub struct ObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl ObjectStorage {
    /// Creates a store rooted at `settings.root`.
    #[must_use]
    pub fn new(settings: &StorageSettings) -> Self {
        Self {
            root: settings.root.clone(),
            public_base_url: settings.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Root directory holding the bucket directories
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one bucket
    #[must_use]
    pub fn bucket_dir(&self, bucket: Bucket) -> PathBuf {
        self.root.join(bucket.as_str())
    }

    /// Creates every bucket directory.
    pub async fn ensure_buckets(&self) -> Result<()> {
        for bucket in Bucket::ALL {
            tokio::fs::create_dir_all(self.bucket_dir(bucket)).await?;
        }
        debug!("Storage buckets ready under {:?}", self.root);
        Ok(())
    }

    /// Stores `bytes` at `path`; fails with [`Error::Conflict`] if the object exists.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(&self, bucket: Bucket, path: &str, bytes: &[u8]) -> Result<StoredObject> {
        let relative = sanitize_object_path(path)?;
        let target = self.bucket_dir(bucket).join(&relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => Error::Conflict {
                    message: format!("object already exists: {}/{path}", bucket.as_str()),
                },
                _ => Error::Io(e),
            })?;
        write_or_discard(file, &target, bytes).await?;

        info!("Stored {}/{path}", bucket.as_str());
        Ok(StoredObject {
            bucket,
            path: path.to_string(),
            public_url: self.public_url(bucket, path),
        })
    }

    /// Deletes an object. Missing objects are not an error.
    #[instrument(skip(self))]
    pub async fn remove(&self, bucket: Bucket, path: &str) -> Result<()> {
        let relative = sanitize_object_path(path)?;
        match tokio::fs::remove_file(self.bucket_dir(bucket).join(relative)).await {
            Ok(()) => {
                info!("Removed {}/{path}", bucket.as_str());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Object {}/{path} already gone", bucket.as_str());
                Ok(())
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Reads an object.
    pub async fn read(&self, bucket: Bucket, path: &str) -> Result<Vec<u8>> {
        let relative = sanitize_object_path(path)?;
        tokio::fs::read(self.bucket_dir(bucket).join(relative))
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::NotFound {
                    entity: "object",
                    key: format!("{}/{path}", bucket.as_str()),
                },
                _ => Error::Io(e),
            })
    }

    /// Public URL of an object
    #[must_use]
    pub fn public_url(&self, bucket: Bucket, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket.as_str(), path)
    }

    /// Inverse of [`Self::public_url`]; `None` for URLs that are not ours.
    #[must_use]
    pub fn path_from_public_url(&self, bucket: Bucket, url: &str) -> Option<String> {
        let prefix = format!("{}/{}/", self.public_base_url, bucket.as_str());
        url.strip_prefix(&prefix)
            .filter(|path| !path.is_empty())
            .map(str::to_string)
    }
}

/// Rejects empty, absolute, and parent-escaping paths.
fn sanitize_object_path(path: &str) -> Result<PathBuf> {
    let invalid = || Error::Storage {
        message: format!("invalid object path: {path:?}"),
    };
    if path.is_empty() || path.contains('\\') || path.contains('\0') {
        return Err(invalid());
    }
    let candidate = Path::new(path);
    let mut clean = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            _ => return Err(invalid()),
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(invalid());
    }
    Ok(clean)
}

/// Writes `bytes` to a freshly created object; on failure the partial file at
/// `target` is removed so the path can be uploaded again.
async fn write_or_discard<W>(mut writer: W, target: &Path, bytes: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    }
    .await;
    drop(writer);

    if let Err(e) = written {
        if let Err(cleanup) = tokio::fs::remove_file(target).await {
            warn!("Could not remove partial object {target:?}: {cleanup}");
        }
        return Err(e.into());
    }
    Ok(())
}

/// Lowercased extension of a file name, if it has one.
#[must_use]
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn storage(dir: &tempfile::TempDir) -> ObjectStorage {
        ObjectStorage::new(&StorageSettings {
            root: dir.path().to_path_buf(),
            public_base_url: "https://cdn.example.sch.id/storage/".to_string(),
        })
    }

    #[tokio::test]
    async fn test_upload_read_remove() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = storage(&dir);
        store.ensure_buckets().await?;

        let stored = store
            .upload(Bucket::Gallery, "gallery/lab.jpg", b"jpeg bytes")
            .await?;
        assert_eq!(
            stored.public_url,
            "https://cdn.example.sch.id/storage/gallery/gallery/lab.jpg"
        );
        assert_eq!(store.read(Bucket::Gallery, "gallery/lab.jpg").await?, b"jpeg bytes");

        store.remove(Bucket::Gallery, "gallery/lab.jpg").await?;
        assert!(matches!(
            store.read(Bucket::Gallery, "gallery/lab.jpg").await,
            Err(Error::NotFound { .. })
        ));
        // removing twice is fine
        store.remove(Bucket::Gallery, "gallery/lab.jpg").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_does_not_overwrite() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = storage(&dir);

        store.upload(Bucket::NewsImages, "a.png", b"first").await?;
        let second = store.upload(Bucket::NewsImages, "a.png", b"second").await;
        assert!(matches!(second, Err(Error::Conflict { .. })));
        assert_eq!(store.read(Bucket::NewsImages, "a.png").await?, b"first");
        Ok(())
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = storage(&dir);

        for path in ["../escape.txt", "/etc/passwd", "", "a/../../b", "./x", "a\\b"] {
            let result = store.upload(Bucket::Gallery, path, b"x").await;
            assert!(matches!(result, Err(Error::Storage { .. })), "path {path:?}");
        }
        Ok(())
    }

    #[test]
    fn test_public_url_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = storage(&dir);
        let url = store.public_url(Bucket::SchoolImages, "school/logo_1.png");

        assert_eq!(
            store.path_from_public_url(Bucket::SchoolImages, &url),
            Some("school/logo_1.png".to_string())
        );
        assert_eq!(store.path_from_public_url(Bucket::Gallery, &url), None);
        assert_eq!(
            store.path_from_public_url(Bucket::SchoolImages, "https://elsewhere/x.png"),
            None
        );
    }

    #[test]
    fn test_bucket_names() {
        for bucket in Bucket::ALL {
            assert_eq!(Bucket::parse(bucket.as_str()), Some(bucket));
        }
        assert_eq!(Bucket::parse("private"), None);
        assert!(!Bucket::PpdbDocuments.is_public());
        assert!(Bucket::Gallery.is_public());
    }

    struct FailingWriter;

    impl AsyncWrite for FailingWriter {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
            _: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::other("disk full")))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_partial_object() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = storage(&dir);
        store.ensure_buckets().await?;
        let target = store.bucket_dir(Bucket::Gallery).join("foto_1.jpg");
        tokio::fs::write(&target, b"").await?;

        let result = write_or_discard(FailingWriter, &target, b"jpeg").await;
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(!target.exists());

        store.upload(Bucket::Gallery, "foto_1.jpg", b"jpeg").await?;
        assert_eq!(store.read(Bucket::Gallery, "foto_1.jpg").await?, b"jpeg");
        Ok(())
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("Scan KTP.PDF"), Some("pdf".to_string()));
        assert_eq!(file_extension("noext"), None);
    }
}
