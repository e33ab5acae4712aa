//! Capture/ingest surface: turns a raw image from the camera or file
//! picker into a durable queue entry.
//!
//! This is the producer side of the queue. It establishes the entry's
//! identity (attribution from the signed-in user, capture fingerprint
//! for deduplication) and its initial invariants (thumbnail present,
//! status `pending`) before anything is rendered or uploaded.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use sha2::{Digest, Sha256};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use fieldsync_core::{
    defaults, Error, GeoPoint, GeolocationProvider, IdentityProvider, PhotoCategory,
    PhotoQueueRepository, QueuePhotoRequest, Result,
};
use fieldsync_store::Store;

/// A captured or selected image plus the context gathered at the point
/// of capture.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub project_id: Uuid,
    /// Raw image payload from the device capture surface.
    pub image: Vec<u8>,
    pub filename: String,
    pub caption: Option<String>,
    pub category: PhotoCategory,
    /// Capture timestamp; defaults to now when the device did not say.
    pub taken_at: Option<DateTime<Utc>>,
    pub phase_id: Option<Uuid>,
    pub album_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    /// Preview supplied by the capture surface, when it made one.
    pub thumbnail: Option<Vec<u8>>,
}

impl CaptureRequest {
    /// A capture with required fields only; everything else defaults.
    pub fn new(project_id: Uuid, image: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            project_id,
            image,
            filename: filename.into(),
            caption: None,
            category: PhotoCategory::default(),
            taken_at: None,
            phase_id: None,
            album_id: None,
            task_id: None,
            thumbnail: None,
        }
    }
}

/// Accepts captures and hands them to the local photo store.
#[derive(Clone)]
pub struct PhotoIngest {
    store: Store,
    identity: Arc<dyn IdentityProvider>,
    geolocation: Arc<dyn GeolocationProvider>,
}

impl PhotoIngest {
    /// Create an ingest surface over the given store and providers.
    pub fn new(
        store: Store,
        identity: Arc<dyn IdentityProvider>,
        geolocation: Arc<dyn GeolocationProvider>,
    ) -> Self {
        Self {
            store,
            identity,
            geolocation,
        }
    }

    /// Queue a captured photo; returns its `local_id` after the durable
    /// write.
    ///
    /// Rejects with `Unauthorized` when no user is signed in and with
    /// `Validation` when the payload is empty or not a decodable image.
    /// Geolocation is best-effort: a missing or slow fix never blocks
    /// the capture.
    pub async fn capture(&self, request: CaptureRequest) -> Result<Uuid> {
        let user = self.identity.current_user().ok_or_else(|| {
            Error::Unauthorized("photo capture requires a signed-in user".into())
        })?;

        if request.image.is_empty() {
            return Err(Error::Validation("captured image is empty".into()));
        }

        let thumbnail = match request.thumbnail.filter(|t| !t.is_empty()) {
            Some(thumbnail) => thumbnail,
            None => generate_thumbnail(&request.image)?,
        };

        let location = self.acquire_location().await;
        let content_hash = capture_fingerprint(&request.image);

        let local_id = self
            .store
            .photos
            .queue_photo(QueuePhotoRequest {
                project_id: request.project_id,
                user,
                blob: request.image,
                thumbnail,
                filename: request.filename,
                caption: request.caption,
                category: request.category,
                taken_at: request.taken_at.unwrap_or_else(Utc::now),
                location,
                phase_id: request.phase_id,
                album_id: request.album_id,
                task_id: request.task_id,
                content_hash,
            })
            .await?;

        info!(
            subsystem = "ingest",
            op = "capture",
            photo_id = %local_id,
            project_id = %request.project_id,
            "Capture queued"
        );
        Ok(local_id)
    }

    async fn acquire_location(&self) -> Option<GeoPoint> {
        let deadline = Duration::from_millis(defaults::GEOLOCATION_TIMEOUT_MS);
        match timeout(deadline, self.geolocation.current_location()).await {
            Ok(location) => location,
            Err(_) => {
                warn!(
                    subsystem = "ingest",
                    op = "geolocation",
                    timeout_ms = deadline.as_millis() as u64,
                    "Geolocation fix timed out, capturing without location"
                );
                None
            }
        }
    }
}

/// Capture-event fingerprint: sha256 over the raw image bytes, hex.
pub fn capture_fingerprint(image: &[u8]) -> String {
    hex::encode(Sha256::digest(image))
}

/// Downscale the image to fit the thumbnail bounds and encode as JPEG.
pub fn generate_thumbnail(image_bytes: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(image_bytes)
        .map_err(|e| Error::Validation(format!("not a decodable image: {e}")))?;

    let dim = defaults::THUMBNAIL_MAX_DIM;
    // JPEG has no alpha channel; flatten before encoding.
    let thumb = img.thumbnail(dim, dim).to_rgb8();

    let mut out = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut out, defaults::THUMBNAIL_JPEG_QUALITY);
    encoder
        .encode(
            thumb.as_raw(),
            thumb.width(),
            thumb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| Error::Internal(format!("thumbnail encoding failed: {e}")))?;

    debug!(
        subsystem = "ingest",
        op = "thumbnail",
        width = thumb.width(),
        height = thumb.height(),
        bytes = out.get_ref().len(),
        "Thumbnail generated"
    );
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 90, 60]),
        ));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_capture_fingerprint_is_stable_and_distinct() {
        let a = capture_fingerprint(b"frame one");
        let b = capture_fingerprint(b"frame one");
        let c = capture_fingerprint(b"frame two");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_generate_thumbnail_downscales_large_images() {
        let png = sample_png(1600, 900);
        let thumbnail = generate_thumbnail(&png).unwrap();
        assert!(!thumbnail.is_empty());

        let decoded = image::load_from_memory(&thumbnail).unwrap();
        assert!(decoded.width() <= defaults::THUMBNAIL_MAX_DIM);
        assert!(decoded.height() <= defaults::THUMBNAIL_MAX_DIM);
    }

    #[test]
    fn test_generate_thumbnail_keeps_small_images() {
        let png = sample_png(32, 24);
        let thumbnail = generate_thumbnail(&png).unwrap();
        let decoded = image::load_from_memory(&thumbnail).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 24);
    }

    #[test]
    fn test_generate_thumbnail_rejects_garbage() {
        let err = generate_thumbnail(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_capture_request_defaults() {
        let request = CaptureRequest::new(Uuid::new_v4(), vec![1, 2, 3], "deck.jpg");
        assert_eq!(request.category, PhotoCategory::Progress);
        assert!(request.caption.is_none());
        assert!(request.taken_at.is_none());
        assert!(request.thumbnail.is_none());
    }
}
