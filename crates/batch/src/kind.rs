//! The tagged-variant media model.
//!
//! A record carries a [`MediaKind`] tag instead of being a subclass per
//! media type; content-producing behaviour (decoders, editors, size
//! estimates) is keyed off the tag.

use std::path::Path;

/// What kind of media a file holds, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Still image (decodable to pixels).
    Image,
    /// Video container; played, not decoded to a frame buffer here.
    Video,
    /// Audio file.
    Audio,
    /// Anything else; still renameable, never decoded.
    Other,
}

impl MediaKind {
    /// Detect the media kind from a file extension.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| match ext.to_lowercase().as_str() {
                "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tif" | "tiff" | "webp" => MediaKind::Image,
                "mp4" | "mov" | "avi" | "mkv" | "mpg" | "mpeg" | "wmv" | "webm" => MediaKind::Video,
                "mp3" | "wav" | "flac" | "ogg" | "m4a" | "aiff" | "aif" => MediaKind::Audio,
                _ => MediaKind::Other,
            })
            .unwrap_or(MediaKind::Other)
    }

    /// The stable tag used as a configuration key (external editor map) and
    /// in log fields.
    pub fn tag(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Other => "other",
        }
    }

    /// Byte-size estimate for cached content when nothing better is known.
    ///
    /// Images are normally estimated from their pixel dimensions; this is
    /// the fallback. Players for audio/video hold a roughly constant
    /// footprint regardless of file size, and unsupported kinds hold
    /// nothing. A heuristic, not a measurement; it only has to be
    /// monotonically related to the real footprint.
    pub fn fallback_bytes(&self) -> u64 {
        match self {
            MediaKind::Image => 32 * 1024 * 1024,
            MediaKind::Video => 64 * 1024 * 1024,
            MediaKind::Audio => 8 * 1024 * 1024,
            MediaKind::Other => 0,
        }
    }
}
