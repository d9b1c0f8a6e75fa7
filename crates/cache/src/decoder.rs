//! Turning file bytes into sized, cacheable content.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use image::ImageReader;
use remo_batch::MediaKind;
use remo_storage::BackendHandle;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared handle to a decoder implementation.
pub type DecoderHandle = Arc<dyn ContentDecoder + Send + Sync>;

/// Decoded (or decodable) content of one record, plus the size estimate the
/// eviction loop charges against the memory budget.
#[derive(Debug)]
pub struct DecodedContent {
    pub kind: MediaKind,
    /// The raw file bytes. Opaque to the cache; a frontend hands them to
    /// whatever actually renders.
    pub bytes: Vec<u8>,
    /// Pixel dimensions, when the bytes carry a readable image header.
    pub dimensions: Option<(u32, u32)>,
}

impl DecodedContent {
    /// Approximate resident size: width × height × 4 bytes per pixel for
    /// images, the kind's fixed fallback otherwise. A heuristic, allowed to
    /// be wrong, as long as bigger content estimates bigger.
    pub fn approx_bytes(&self) -> u64 {
        match self.dimensions {
            Some((width, height)) => u64::from(width) * u64::from(height) * 4,
            None => self.kind.fallback_bytes(),
        }
    }
}

/// Produces [`DecodedContent`] for one file.
#[async_trait]
pub trait ContentDecoder: Send + Sync {
    async fn decode(
        &self,
        backend: &BackendHandle,
        path: &Path,
        kind: MediaKind,
    ) -> Result<DecodedContent>;
}

/// The standard decoder: reads the file and, for images, probes the header
/// for pixel dimensions without decoding the pixel data.
///
/// An unreadable header is not an error; the content falls back to the
/// kind's fixed size estimate.
pub struct ImageDecoder;

#[async_trait]
impl ContentDecoder for ImageDecoder {
    async fn decode(
        &self,
        backend: &BackendHandle,
        path: &Path,
        kind: MediaKind,
    ) -> Result<DecodedContent> {
        let bytes = backend.read(path).await.or_raise(|| ErrorKind::Storage)?;
        let dimensions = match kind {
            MediaKind::Image => probe_dimensions(&bytes, path),
            _ => None,
        };
        Ok(DecodedContent { kind, bytes, dimensions })
    }
}

fn probe_dimensions(bytes: &[u8], path: &Path) -> Option<(u32, u32)> {
    let probe = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions();
    match probe {
        Ok(dimensions) => Some(dimensions),
        Err(error) => {
            tracing::debug!(path = %path.display(), %error, "image header probe failed; using fallback size");
            None
        },
    }
}

/// Test double: fabricates content of a declared pixel size without touching
/// the backend, and counts how often it was asked to decode.
pub struct StubDecoder {
    dimensions: Option<(u32, u32)>,
    decodes: AtomicUsize,
}

impl StubDecoder {
    /// Every decode yields an "image" of `width` × `height` pixels.
    pub fn sized(width: u32, height: u32) -> Self {
        Self { dimensions: Some((width, height)), decodes: AtomicUsize::new(0) }
    }

    /// Every decode yields dimensionless content (fallback size estimate).
    pub fn opaque() -> Self {
        Self { dimensions: None, decodes: AtomicUsize::new(0) }
    }

    /// Total decode calls served so far. Cache hits never show up here.
    pub fn decode_count(&self) -> usize {
        self.decodes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ContentDecoder for StubDecoder {
    async fn decode(
        &self,
        _backend: &BackendHandle,
        _path: &Path,
        kind: MediaKind,
    ) -> Result<DecodedContent> {
        self.decodes.fetch_add(1, Ordering::Relaxed);
        Ok(DecodedContent { kind, bytes: Vec::new(), dimensions: self.dimensions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use remo_storage::backend::MockBackend;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        RgbaImage::new(width, height).write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[tokio::test]
    async fn test_image_decoder_probes_dimensions() {
        let backend: BackendHandle =
            Arc::new(MockBackend::with_files([("photo1.png", png_bytes(6, 4))]));
        let content =
            ImageDecoder.decode(&backend, Path::new("photo1.png"), MediaKind::Image).await.unwrap();
        assert_eq!(content.dimensions, Some((6, 4)));
        assert_eq!(content.approx_bytes(), 6 * 4 * 4);
        assert!(!content.bytes.is_empty());
    }

    #[tokio::test]
    async fn test_image_decoder_garbage_header_falls_back() {
        let backend: BackendHandle =
            Arc::new(MockBackend::with_files([("broken1.jpg", b"not an image".to_vec())]));
        let content = ImageDecoder
            .decode(&backend, Path::new("broken1.jpg"), MediaKind::Image)
            .await
            .unwrap();
        assert_eq!(content.dimensions, None);
        assert_eq!(content.approx_bytes(), MediaKind::Image.fallback_bytes());
    }

    #[tokio::test]
    async fn test_non_image_kinds_are_not_probed() {
        let backend: BackendHandle =
            Arc::new(MockBackend::with_files([("clip1.mp4", png_bytes(2, 2))]));
        let content =
            ImageDecoder.decode(&backend, Path::new("clip1.mp4"), MediaKind::Video).await.unwrap();
        assert_eq!(content.dimensions, None);
        assert_eq!(content.approx_bytes(), MediaKind::Video.fallback_bytes());
    }

    #[tokio::test]
    async fn test_missing_file_is_a_storage_error() {
        let backend: BackendHandle = Arc::new(MockBackend::default());
        let err = ImageDecoder
            .decode(&backend, Path::new("gone1.jpg"), MediaKind::Image)
            .await
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Storage));
    }
}
