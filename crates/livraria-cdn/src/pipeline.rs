//! Image ingestion pipeline.
//!
//! Orchestrates the full handle-image flow: validate the upload, delete the
//! replaced remote object (best effort), downscale and re-encode, then upload
//! under a resource-class folder with a synthetic unique filename. A TTL
//! cache fronts the name→file-id lookups used for deletion so repeated
//! replacements of the same image avoid a remote round trip.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use livraria_cache::TtlCache;
use livraria_core::config::ImageConfig;
use livraria_core::models::{ResourceClass, UploadedImage};
use livraria_core::AppError;
use livraria_imaging::{ImageTransformer, ImageValidator};

use crate::client::RemoteImageStore;

pub struct ImagePipeline {
    store: Arc<dyn RemoteImageStore>,
    validator: ImageValidator,
    rules: ImageConfig,
    lookup_cache: TtlCache<String>,
}

impl ImagePipeline {
    pub fn new(
        store: Arc<dyn RemoteImageStore>,
        rules: ImageConfig,
        lookup_cache: TtlCache<String>,
    ) -> Self {
        Self {
            store,
            validator: ImageValidator::new(rules.clone()),
            rules,
            lookup_cache,
        }
    }

    /// Handle an optional replacement image for `resource_id`.
    ///
    /// - `None` file → `Ok(None)`, no network calls; callers read this as
    ///   "keep the existing image".
    /// - A supplied `old_url` is resolved to a remote id and deleted; any
    ///   failure on that path is logged and swallowed — it never aborts the
    ///   new upload.
    /// - Returns the public URL of the newly stored image.
    ///
    /// Validation failures surface as [`AppError::Validation`] with every
    /// violated constraint; decode and upload failures are converted to a
    /// single [`AppError::Upstream`] at this boundary so transport error
    /// types never escape.
    pub async fn handle(
        &self,
        file: Option<UploadedImage>,
        class: ResourceClass,
        resource_id: Uuid,
        old_url: Option<&str>,
    ) -> Result<Option<String>, AppError> {
        let Some(file) = file else {
            return Ok(None);
        };

        let result = self.validator.validate(&file);
        if !result.is_valid {
            return Err(AppError::Validation(result.violations));
        }

        if let Some(old_url) = old_url.filter(|u| !u.is_empty()) {
            self.delete_previous(old_url).await;
        }

        let (encoded, width, height) = ImageTransformer::downscale_and_encode(
            &file.data,
            self.rules.output_max_dimension,
            self.rules.output_jpeg_quality,
        )
        .map_err(|e| {
            tracing::warn!(error = %e, %class, %resource_id, "Image re-encode failed");
            AppError::Upstream(format!("image upload failed: {}", e))
        })?;

        // Class + id + timestamp gives uniqueness without coordination.
        let filename = format!(
            "{}_{}_{}.jpg",
            class,
            resource_id,
            Utc::now().timestamp_millis()
        );
        let folder = format!("/{}", class);

        let stored = self
            .store
            .upload(&filename, &folder, "image/jpeg", encoded)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, %class, %resource_id, "Image upload failed");
                AppError::Upstream("image upload failed".to_string())
            })?;

        tracing::info!(
            %class,
            %resource_id,
            url = %stored.url,
            width,
            height,
            "Image stored"
        );

        Ok(Some(stored.url))
    }

    /// Best-effort removal of a stored image by its public URL, for callers
    /// deleting the owning entity. Failures are logged and swallowed.
    pub async fn remove(&self, url: &str) {
        if !url.is_empty() {
            self.delete_previous(url).await;
        }
    }

    /// Best-effort removal of a replaced image. The remote identifier is
    /// re-derived from the URL's last path segment since domain entities
    /// persist only the URL.
    async fn delete_previous(&self, old_url: &str) {
        let Some(name) = old_url.rsplit('/').next().filter(|n| !n.is_empty()) else {
            tracing::warn!(url = %old_url, "Old image URL has no file name, skipping delete");
            return;
        };

        let file_id = match self.lookup_cache.get(name).await {
            Some(id) => Some(id),
            None => match self.store.find_file_id(name).await {
                Ok(Some(id)) => {
                    self.lookup_cache.set(name, id.clone(), None).await;
                    Some(id)
                }
                Ok(None) => {
                    tracing::debug!(name = %name, "Old image not found in remote store");
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, name = %name, "Old image lookup failed, skipping delete");
                    None
                }
            },
        };

        if let Some(file_id) = file_id {
            match self.store.delete(&file_id).await {
                Ok(()) => {
                    self.lookup_cache.delete(name).await;
                    tracing::debug!(name = %name, file_id = %file_id, "Replaced image deleted");
                }
                Err(e) => {
                    tracing::warn!(error = %e, file_id = %file_id, "Failed to delete replaced image");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CdnError, RemoteFile};
    use async_trait::async_trait;
    use bytes::Bytes;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;

    fn rules() -> ImageConfig {
        ImageConfig {
            max_file_size_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
            min_width: 10,
            max_width: 4096,
            min_height: 10,
            max_height: 4096,
            min_aspect_ratio: 0.1,
            max_aspect_ratio: 10.0,
            output_max_dimension: 800,
            output_jpeg_quality: 85,
        }
    }

    fn png_upload(width: u32, height: u32) -> UploadedImage {
        let img = RgbImage::from_pixel(width, height, Rgb([1, 2, 3]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        UploadedImage::new(Bytes::from(buffer), "image/png")
    }

    /// Recording mock for the remote store.
    #[derive(Default)]
    struct MockStore {
        uploads: AtomicUsize,
        lookups: AtomicUsize,
        deletes: AtomicUsize,
        known_files: Mutex<Vec<(String, String)>>, // (name, file_id)
        fail_upload: bool,
        fail_delete: bool,
    }

    impl MockStore {
        async fn with_file(self, name: &str, file_id: &str) -> Self {
            self.known_files
                .lock()
                .await
                .push((name.to_string(), file_id.to_string()));
            self
        }
    }

    #[async_trait]
    impl RemoteImageStore for MockStore {
        async fn upload(
            &self,
            filename: &str,
            folder: &str,
            _content_type: &str,
            _data: Bytes,
        ) -> Result<RemoteFile, CdnError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            if self.fail_upload {
                return Err(CdnError::BadStatus {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(RemoteFile {
                file_id: "new-id".to_string(),
                name: filename.to_string(),
                url: format!("https://cdn.example.com{}/{}", folder, filename),
            })
        }

        async fn find_file_id(&self, name: &str) -> Result<Option<String>, CdnError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .known_files
                .lock()
                .await
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, id)| id.clone()))
        }

        async fn delete(&self, _file_id: &str) -> Result<(), CdnError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            if self.fail_delete {
                return Err(CdnError::Request("timeout".to_string()));
            }
            Ok(())
        }
    }

    fn pipeline(store: Arc<MockStore>) -> ImagePipeline {
        ImagePipeline::new(
            store,
            rules(),
            TtlCache::new(100, Duration::from_secs(60)),
        )
    }

    #[tokio::test]
    async fn test_no_file_is_noop() {
        let store = Arc::new(MockStore::default());
        let p = pipeline(store.clone());

        let url = p
            .handle(None, ResourceClass::Product, Uuid::new_v4(), Some("x"))
            .await
            .unwrap();

        assert_eq!(url, None);
        assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
        assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_image_makes_no_network_calls() {
        let store = Arc::new(MockStore::default());
        let p = pipeline(store.clone());
        let bad = UploadedImage::new(Bytes::from_static(b"junk"), "text/plain");

        let err = p
            .handle(Some(bad), ResourceClass::Author, Uuid::new_v4(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
        assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upload_returns_url_with_class_folder() {
        let store = Arc::new(MockStore::default());
        let p = pipeline(store.clone());
        let id = Uuid::new_v4();

        let url = p
            .handle(Some(png_upload(100, 100)), ResourceClass::Author, id, None)
            .await
            .unwrap()
            .unwrap();

        assert!(url.starts_with("https://cdn.example.com/author/author_"));
        assert!(url.contains(&id.to_string()));
        assert!(url.ends_with(".jpg"));
        assert_eq!(store.uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_old_object_skips_delete_but_uploads() {
        let store = Arc::new(MockStore::default());
        let p = pipeline(store.clone());

        let url = p
            .handle(
                Some(png_upload(100, 100)),
                ResourceClass::Product,
                Uuid::new_v4(),
                Some("https://cdn.example.com/product/ghost.jpg"),
            )
            .await
            .unwrap();

        assert!(url.is_some());
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
        assert_eq!(store.uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_old_object_is_deleted_before_upload() {
        let store = Arc::new(
            MockStore::default()
                .with_file("old.jpg", "old-id")
                .await,
        );
        let p = pipeline(store.clone());

        let url = p
            .handle(
                Some(png_upload(100, 100)),
                ResourceClass::User,
                Uuid::new_v4(),
                Some("https://cdn.example.com/user/old.jpg"),
            )
            .await
            .unwrap();

        assert!(url.is_some());
        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
        assert_eq!(store.uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_never_aborts_upload() {
        let mut mock = MockStore::default().with_file("old.jpg", "old-id").await;
        mock.fail_delete = true;
        let store = Arc::new(mock);
        let p = pipeline(store.clone());

        let url = p
            .handle(
                Some(png_upload(100, 100)),
                ResourceClass::User,
                Uuid::new_v4(),
                Some("https://cdn.example.com/user/old.jpg"),
            )
            .await
            .unwrap();

        assert!(url.is_some());
        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
        assert_eq!(store.uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_upload_failure_surfaces_single_domain_error() {
        let store = Arc::new(MockStore {
            fail_upload: true,
            ..Default::default()
        });
        let p = pipeline(store.clone());

        let err = p
            .handle(
                Some(png_upload(100, 100)),
                ResourceClass::Product,
                Uuid::new_v4(),
                None,
            )
            .await
            .unwrap_err();

        match err {
            AppError::Upstream(msg) => {
                // The transport error shape must not leak.
                assert!(!msg.contains("500"));
                assert!(!msg.contains("boom"));
            }
            other => panic!("expected Upstream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remove_deletes_known_object() {
        let store = Arc::new(MockStore::default().with_file("gone.jpg", "gone-id").await);
        let p = pipeline(store.clone());

        p.remove("https://cdn.example.com/author/gone.jpg").await;

        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
        assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remove_swallows_failures() {
        let mut mock = MockStore::default().with_file("gone.jpg", "gone-id").await;
        mock.fail_delete = true;
        let p = pipeline(Arc::new(mock));

        // Must not panic or error.
        p.remove("https://cdn.example.com/author/gone.jpg").await;
        p.remove("").await;
    }

    #[tokio::test]
    async fn test_lookup_is_cached_across_replacements() {
        // Deletes fail here so the cache entry survives (successful deletes
        // invalidate it).
        let mut mock = MockStore::default()
            .with_file("stable.jpg", "stable-id")
            .await;
        mock.fail_delete = true;
        let store = Arc::new(mock);
        let p = pipeline(store.clone());
        let old = Some("https://cdn.example.com/user/stable.jpg");

        for _ in 0..3 {
            p.handle(
                Some(png_upload(100, 100)),
                ResourceClass::User,
                Uuid::new_v4(),
                old,
            )
            .await
            .unwrap();
        }

        // One remote lookup; the rest hit the cache.
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(store.deletes.load(Ordering::SeqCst), 3);
    }
}
