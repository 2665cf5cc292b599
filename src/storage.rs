//! Image buckets on the local filesystem.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants::{ALLOWED_IMAGE_EXTENSIONS, MAX_IMAGE_SIZE_BYTES};
use crate::error::{AppError, Result};
use crate::security::base64_decode;

/// Storage buckets, one directory each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    PackageReports,
    EventImages,
    MarketplaceImages,
}

impl Bucket {
    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::PackageReports => "package_reports",
            Bucket::EventImages => "event_images",
            Bucket::MarketplaceImages => "marketplace_images",
        }
    }

    pub const ALL: [Bucket; 3] = [
        Bucket::PackageReports,
        Bucket::EventImages,
        Bucket::MarketplaceImages,
    ];
}

/// Image attached to a create request
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUpload {
    /// Original file name; only its extension is kept
    pub file_name: String,
    /// Base64 (optionally a data URL)
    pub data: String,
}

impl ImageUpload {
    /// Lowercased extension, if it is an accepted image type
    pub fn extension(&self) -> Result<String> {
        let ext = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Ok(ext)
        } else {
            Err(AppError::invalid(format!(
                "Unsupported image type '{}' (allowed: {})",
                ext,
                ALLOWED_IMAGE_EXTENSIONS.join(", ")
            )))
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        // Cheap upper bound before decoding
        if self.data.len() / 4 * 3 > MAX_IMAGE_SIZE_BYTES + 3 {
            return Err(AppError::PayloadTooLarge);
        }
        let bytes = base64_decode(&self.data)
            .map_err(|e| AppError::invalid(format!("Invalid image data: {}", e)))?;
        if bytes.is_empty() {
            return Err(AppError::invalid("Image is empty"));
        }
        if bytes.len() > MAX_IMAGE_SIZE_BYTES {
            return Err(AppError::PayloadTooLarge);
        }
        Ok(bytes)
    }
}

/// Writes uploads under `<root>/<bucket>/` and hands out public URLs
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    public_base_url: String,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create bucket directories if they are missing
    pub async fn init(&self) -> Result<()> {
        for bucket in Bucket::ALL {
            tokio::fs::create_dir_all(self.root.join(bucket.as_str())).await?;
        }
        Ok(())
    }

    /// Validate, store and return the public URL of an upload
    pub async fn save(&self, bucket: Bucket, upload: &ImageUpload) -> Result<String> {
        let ext = upload.extension()?;
        let bytes = upload.decode()?;

        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
        let dir = self.root.join(bucket.as_str());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), &bytes).await?;

        tracing::info!(
            "Stored image in bucket {}: {} ({} bytes)",
            bucket.as_str(),
            file_name,
            bytes.len()
        );

        Ok(self.public_url(bucket, &file_name))
    }

    /// Store an optional upload; `None` passes through
    pub async fn save_optional(
        &self,
        bucket: Bucket,
        upload: Option<&ImageUpload>,
    ) -> Result<Option<String>> {
        match upload {
            Some(upload) => self.save(bucket, upload).await.map(Some),
            None => Ok(None),
        }
    }

    /// Delete an upload by the URL [`save`](Self::save) returned.
    ///
    /// Called when the record meant to reference it was never created.
    /// URLs outside this store's buckets are left alone.
    pub async fn discard(&self, url: &str) {
        let prefix = format!("{}/storage/", self.public_base_url);
        let target = url
            .strip_prefix(&prefix)
            .and_then(|rest| rest.split_once('/'))
            .and_then(|(bucket, file_name)| {
                let bucket = Bucket::ALL.into_iter().find(|b| b.as_str() == bucket)?;
                let plain = !file_name.is_empty()
                    && !file_name.starts_with('.')
                    && !file_name.contains(['/', '\\']);
                plain.then(|| self.root.join(bucket.as_str()).join(file_name))
            });

        let Some(path) = target else {
            tracing::warn!("Refusing to discard unrecognised upload URL: {}", url);
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!("Discarded orphaned upload {:?}", path),
            Err(e) => tracing::warn!("Failed to discard upload {:?}: {}", path, e),
        }
    }

    pub fn public_url(&self, bucket: Bucket, file_name: &str) -> String {
        format!(
            "{}/storage/{}/{}",
            self.public_base_url,
            bucket.as_str(),
            file_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::base64_encode;
    use tempfile::TempDir;

    fn upload(name: &str, bytes: &[u8]) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            data: base64_encode(bytes),
        }
    }

    #[test]
    fn test_extension_allow_list() {
        assert_eq!(upload("photo.JPG", b"x").extension().unwrap(), "jpg");
        assert!(upload("script.sh", b"x").extension().is_err());
        assert!(upload("noext", b"x").extension().is_err());
    }

    #[test]
    fn test_oversized_upload_rejected() {
        let big = vec![7u8; MAX_IMAGE_SIZE_BYTES + 10];
        assert!(matches!(
            upload("big.png", &big).decode(),
            Err(AppError::PayloadTooLarge)
        ));
    }

    #[tokio::test]
    async fn test_save_writes_file_and_returns_url() {
        let temp_dir = TempDir::new().unwrap();
        let store = ImageStore::new(temp_dir.path(), "http://hook.test/");

        let url = store
            .save(Bucket::EventImages, &upload("flyer.png", b"\x89PNG data"))
            .await
            .unwrap();

        assert!(url.starts_with("http://hook.test/storage/event_images/"));
        assert!(url.ends_with(".png"));

        let file_name = url.rsplit('/').next().unwrap();
        let stored = std::fs::read(temp_dir.path().join("event_images").join(file_name)).unwrap();
        assert_eq!(stored, b"\x89PNG data");
    }

    #[tokio::test]
    async fn test_discard_removes_saved_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = ImageStore::new(temp_dir.path(), "http://hook.test");

        let url = store
            .save(Bucket::MarketplaceImages, &upload("lamp.jpg", b"jpeg bytes"))
            .await
            .unwrap();
        store.discard(&url).await;

        let bucket = temp_dir.path().join("marketplace_images");
        assert_eq!(std::fs::read_dir(bucket).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_discard_ignores_foreign_urls() {
        let temp_dir = TempDir::new().unwrap();
        let store = ImageStore::new(temp_dir.path(), "http://hook.test");
        let keep = temp_dir.path().join("keep.txt");
        std::fs::write(&keep, b"keep").unwrap();

        store.discard("http://hook.test/storage/event_images/../keep.txt").await;
        store.discard("http://hook.test/storage/secrets/keep.txt").await;
        store.discard("http://elsewhere.test/storage/event_images/x.png").await;

        assert!(keep.exists());
    }

    #[test]
    fn test_padding_only_upload_is_rejected() {
        let upload = ImageUpload {
            file_name: "blank.png".to_string(),
            data: "====".to_string(),
        };
        assert!(matches!(upload.decode(), Err(AppError::InvalidInput(_))));
    }
}
