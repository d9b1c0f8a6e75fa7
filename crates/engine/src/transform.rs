//! The lossless-transform collaborator seam.
//!
//! Rotations and flips marked on a record are dispatched here during the
//! final save phase. Implementations are expected to rewrite the file
//! in place without a decode/re-encode quality loss (jpegtran-style); the
//! engine neither knows nor cares how.

use crate::error::Result;
use async_trait::async_trait;
use remo_batch::Rotation;
use remo_storage::BackendHandle;
use std::path::Path;
use std::sync::Arc;

/// Shared handle to a transform implementation.
pub type TransformHandle = Arc<dyn LosslessTransform + Send + Sync>;

/// Applies pending lossless orientation changes to one file.
///
/// A failure leaves the record's pending transform flags untouched so the
/// user's intent survives to the next save attempt.
#[async_trait]
pub trait LosslessTransform {
    async fn apply(
        &self,
        backend: &BackendHandle,
        path: &Path,
        rotation: Rotation,
        flip_horizontal: bool,
        flip_vertical: bool,
    ) -> Result<()>;
}

/// The default when no transform tool is configured: reports success without
/// touching the file, so stacked-up orientation flags do not block saves
/// forever on installations that cannot honour them.
pub struct NoopTransform;

#[async_trait]
impl LosslessTransform for NoopTransform {
    async fn apply(
        &self,
        _backend: &BackendHandle,
        path: &Path,
        rotation: Rotation,
        flip_horizontal: bool,
        flip_vertical: bool,
    ) -> Result<()> {
        tracing::debug!(
            path = %path.display(),
            degrees = rotation.degrees(),
            flip_horizontal,
            flip_vertical,
            "no transform tool configured; orientation change dropped"
        );
        Ok(())
    }
}
