//! Building a collection from a directory scan.

use crate::collection::{CollectionEvent, CollectionOptions, MediaCollection};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use remo_storage::BackendHandle;

/// Scans the backend's root directory and wraps every non-hidden file in a
/// record.
///
/// Ordering starts as case-insensitive filename order (what a user sees in
/// their file manager); from then on it is owned by the user. The counter
/// position is voted over the scanned names (unless the options pin it)
/// and stays fixed for the collection's lifetime.
pub async fn load_directory(
    backend: &BackendHandle,
    options: &CollectionOptions,
) -> Result<MediaCollection> {
    let mut metas = backend.list(None).await.or_raise(|| ErrorKind::Storage)?;
    metas.sort_by_cached_key(|meta| meta.file_name().to_lowercase());

    let counter_position = match options.counter_position {
        Some(position) => position,
        None => remo_codec::counter_position(metas.iter().map(|meta| meta.file_name())),
    };

    let mut collection = MediaCollection::empty(counter_position, options);
    for meta in &metas {
        collection.push_meta(meta);
    }
    tracing::info!(
        backend = backend.name(),
        files = collection.len(),
        counter_position,
        "directory loaded"
    );
    collection.emit(CollectionEvent::Loaded);
    Ok(collection)
}
