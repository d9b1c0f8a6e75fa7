//! The save stream: trash deletes, two rename passes, timestamps, transforms.

use crate::error::{ErrorKind, Result};
use crate::transform::TransformHandle;
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use remo_batch::{MediaCollection, RecordId, parse_modified};
use remo_storage::BackendHandle;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation for a running save.
///
/// Cheap to clone; hand one half to the save worker and keep the other to
/// flip from the outside. The engine checks it between records, so the
/// in-flight single-file operation always completes and the batch stops in a
/// well-defined partial state: committed records are clean, the rest keep
/// their dirty flags and save fine next time.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Engine knobs, usually derived from the loaded [`Config`](remo_config::Config).
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Name of the trash subdirectory, sibling to the managed files.
    /// Localizable, hence configurable.
    pub trash_dir: String,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self { trash_dir: "deleted".to_string() }
    }
}

impl From<&remo_config::Config> for SaveOptions {
    fn from(config: &remo_config::Config) -> Self {
        Self { trash_dir: config.trash_dir.clone() }
    }
}

/// What happened to one record during a rename pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The record sits at its final name.
    Successful,
    /// The final name was occupied; the record was parked at a unique
    /// intermediate name and retried in the second pass.
    SecondRunNeeded,
    /// The rename failed; the record is flagged and the batch moves on.
    RenameError,
}

/// Aggregate verdict of a completed save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Successful,
    /// At least this many records are flagged; per-record status tells which.
    Error(usize),
}

/// Tallies of a completed save, carried by [`SaveEvent::Complete`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    /// Files moved into the trash subdirectory.
    pub trashed: u64,
    /// Records whose rename reached its final name (either pass).
    pub renamed: usize,
    pub timestamps_written: usize,
    pub transforms_applied: usize,
    /// Records left flagged with any failure.
    pub failed: usize,
}

impl SaveSummary {
    pub fn status(&self) -> SaveStatus {
        if self.failed == 0 { SaveStatus::Successful } else { SaveStatus::Error(self.failed) }
    }
}

/// Progress events emitted by [`save`], one per file-system operation.
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) — exactly once.
/// 2. [`TrashComplete`](Self::TrashComplete) — exactly once, after all
///    physical deletes, with the number of files trashed.
/// 3. [`Renamed`](Self::Renamed) — zero or more times, one per record with a
///    pending rename (first pass).
/// 4. [`SecondPass`](Self::SecondPass) — exactly once, before the parked
///    intermediate records are retried.
/// 5. [`Renamed`](Self::Renamed) — again, once per parked record.
/// 6. [`TimestampWritten`](Self::TimestampWritten) — one per record with a
///    pending timestamp edit.
/// 7. [`Transformed`](Self::Transformed) — one per record with a pending
///    orientation change.
/// 8. [`Complete`](Self::Complete) — exactly once, with the summary.
///
/// Cancellation emits [`Cancelled`](Self::Cancelled) and terminates the
/// stream; [`Complete`](Self::Complete) is then never emitted. A fatal error
/// (`Err` item) likewise terminates the stream early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveEvent {
    Started,
    TrashComplete(u64),
    Renamed { id: RecordId, outcome: RecordOutcome },
    SecondPass,
    TimestampWritten { id: RecordId, ok: bool },
    Transformed { id: RecordId, ok: bool },
    Cancelled,
    Complete(SaveSummary),
}

/// Streams the on-disk commit of every pending change in `collection`.
///
/// Phase order follows the namespace logic: trash deletes first (their names
/// become reusable), then renames in up to two passes, then timestamp
/// writes, then lossless transforms. Exactly two rename passes — a
/// collision that survives both is a permanent conflict and flags the
/// record instead of looping.
///
/// Per-record failures are recorded as flags and surfaced in the summary;
/// the only fatal error is failing to create the trash directory.
pub fn save<'a>(
    backend: &'a BackendHandle,
    collection: &'a mut MediaCollection,
    transform: &'a TransformHandle,
    options: &'a SaveOptions,
    cancel: &'a CancelFlag,
) -> impl Stream<Item = Result<SaveEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(SaveEvent::Started);
        let mut summary = SaveSummary::default();
        let mut trash_failures = 0usize;
        let mut transform_failures = 0usize;

        // Phase 0: physical deletes into the trash, freeing up names the
        // rename passes may want to reuse.
        let pending_deletes: Vec<(RecordId, PathBuf, String)> = collection
            .deleted()
            .iter()
            .map(|record| (record.id(), record.path().to_owned(), record.file_name().to_string()))
            .collect();
        if !pending_deletes.is_empty() {
            let trash = PathBuf::from(&options.trash_dir);
            if let Err(e) = backend.create_dir(&trash).await.or_raise(|| ErrorKind::Storage) {
                yield Err(e);
                return;
            }
            for (id, path, name) in pending_deletes {
                if cancel.is_cancelled() {
                    yield Ok(SaveEvent::Cancelled);
                    return;
                }
                match trash_one(backend, &trash, &path, &name).await {
                    Ok(()) => {
                        collection.finish_delete(id);
                        summary.trashed += 1;
                    },
                    Err(error) => {
                        tracing::warn!(%id, path = %path.display(), %error, "trash move failed; record stays queued");
                        trash_failures += 1;
                    },
                }
            }
        }
        yield Ok(SaveEvent::TrashComplete(summary.trashed));

        let ids: Vec<RecordId> = collection.records().iter().map(|record| record.id()).collect();

        // Phase 1: rename every dirty record, parking anyone whose target is
        // occupied at a unique intermediate name.
        for id in ids.iter().copied() {
            let Some(record) = collection.record_by_id(id) else { continue };
            if !record.filename_changed() {
                continue;
            }
            if cancel.is_cancelled() {
                yield Ok(SaveEvent::Cancelled);
                return;
            }
            let current = record.path().to_owned();
            let target = current.with_file_name(record.resulting_filename());
            let outcome = first_pass_rename(backend, collection, id, &current, &target).await;
            if outcome == RecordOutcome::Successful {
                summary.renamed += 1;
            }
            yield Ok(SaveEvent::Renamed { id, outcome });
        }

        // Phase 2: parked records get exactly one retry, now that the first
        // pass has (hopefully) vacated their targets.
        yield Ok(SaveEvent::SecondPass);
        for id in ids.iter().copied() {
            let Some(record) = collection.record_by_id(id) else { continue };
            if !record.intermediate_renamed() {
                continue;
            }
            if cancel.is_cancelled() {
                yield Ok(SaveEvent::Cancelled);
                return;
            }
            let current = record.path().to_owned();
            let target = current.with_file_name(record.resulting_filename());
            let outcome = second_pass_rename(backend, collection, id, &current, &target).await;
            if outcome == RecordOutcome::Successful {
                summary.renamed += 1;
            }
            yield Ok(SaveEvent::Renamed { id, outcome });
        }

        // Phase 3: timestamp writes, against the records' post-rename paths.
        for id in ids.iter().copied() {
            let Some(record) = collection.record_by_id(id) else { continue };
            if !record.timestamp_changed() {
                continue;
            }
            if cancel.is_cancelled() {
                yield Ok(SaveEvent::Cancelled);
                return;
            }
            let path = record.path().to_owned();
            let parsed = parse_modified(record.modified_text());
            let ok = write_timestamp(backend, collection, id, &path, parsed).await;
            if ok {
                summary.timestamps_written += 1;
            }
            yield Ok(SaveEvent::TimestampWritten { id, ok });
        }

        // Phase 4: lossless orientation transforms.
        for id in ids.iter().copied() {
            let Some(record) = collection.record_by_id(id) else { continue };
            if !record.has_pending_transform() {
                continue;
            }
            if cancel.is_cancelled() {
                yield Ok(SaveEvent::Cancelled);
                return;
            }
            let path = record.path().to_owned();
            let rotation = record.rotation();
            let flip_horizontal = record.flip_horizontal();
            let flip_vertical = record.flip_vertical();
            let ok = match transform.apply(backend, &path, rotation, flip_horizontal, flip_vertical).await {
                Ok(()) => {
                    if let Some(record) = collection.record_by_id_mut(id) {
                        record.clear_transform();
                    }
                    summary.transforms_applied += 1;
                    true
                },
                Err(error) => {
                    // Flags stay set: the user's intent survives to the next
                    // save attempt.
                    tracing::warn!(%id, path = %path.display(), %error, "lossless transform failed");
                    transform_failures += 1;
                    false
                },
            };
            yield Ok(SaveEvent::Transformed { id, ok });
        }

        collection.mark_conflicts();
        summary.failed = trash_failures
            + transform_failures
            + collection
                .records()
                .iter()
                .filter(|record| {
                    record.rename_error() || record.intermediate_renamed() || record.timestamp_write_error()
                })
                .count();
        tracing::info!(
            trashed = summary.trashed,
            renamed = summary.renamed,
            failed = summary.failed,
            "save complete"
        );
        yield Ok(SaveEvent::Complete(summary));
    })
}

/// Moves one file into the trash directory, suffixing the name until it does
/// not collide with an earlier trashed file.
async fn trash_one(
    backend: &BackendHandle,
    trash: &Path,
    path: &Path,
    name: &str,
) -> Result<()> {
    let target = unique_target(backend, &trash.join(name), 0).await?;
    backend.rename(path, &target).await.or_raise(|| ErrorKind::Storage)
}

async fn first_pass_rename(
    backend: &BackendHandle,
    collection: &mut MediaCollection,
    id: RecordId,
    current: &Path,
    target: &Path,
) -> RecordOutcome {
    match backend.exists(target).await {
        Ok(false) => match backend.rename(current, target).await {
            Ok(()) => {
                if let Some(record) = collection.record_by_id_mut(id) {
                    record.commit_rename(target.to_owned());
                }
                RecordOutcome::Successful
            },
            Err(error) => rename_failed(collection, id, current, error),
        },
        Ok(true) => {
            // Target occupied. Park at an intermediate name; whoever holds
            // the target gets this pass to move out of the way.
            let parked = match unique_target(backend, target, 1).await {
                Ok(intermediate) => match backend
                    .rename(current, &intermediate)
                    .await
                    .or_raise(|| ErrorKind::Storage)
                {
                    Ok(()) => Ok(intermediate),
                    Err(error) => Err(error),
                },
                Err(error) => Err(error),
            };
            match parked {
                Ok(intermediate) => {
                    if let Some(record) = collection.record_by_id_mut(id) {
                        record.park_at_intermediate(intermediate);
                    }
                    RecordOutcome::SecondRunNeeded
                },
                Err(error) => rename_failed(collection, id, current, error),
            }
        },
        Err(error) => rename_failed(collection, id, current, error),
    }
}

async fn second_pass_rename(
    backend: &BackendHandle,
    collection: &mut MediaCollection,
    id: RecordId,
    current: &Path,
    target: &Path,
) -> RecordOutcome {
    match backend.exists(target).await {
        // Still occupied after a full pass: both records converge on the
        // same final name. That needs a user decision, not a third pass.
        Ok(true) => {
            tracing::warn!(%id, target = %target.display(), "permanent naming conflict");
            if let Some(record) = collection.record_by_id_mut(id) {
                record.mark_rename_error();
            }
            RecordOutcome::RenameError
        },
        Ok(false) => match backend.rename(current, target).await {
            Ok(()) => {
                if let Some(record) = collection.record_by_id_mut(id) {
                    record.commit_rename(target.to_owned());
                }
                RecordOutcome::Successful
            },
            Err(error) => rename_failed(collection, id, current, error),
        },
        Err(error) => rename_failed(collection, id, current, error),
    }
}

fn rename_failed<E: std::fmt::Display>(
    collection: &mut MediaCollection,
    id: RecordId,
    current: &Path,
    error: E,
) -> RecordOutcome {
    tracing::warn!(%id, path = %current.display(), %error, "rename failed");
    if let Some(record) = collection.record_by_id_mut(id) {
        record.mark_rename_error();
    }
    RecordOutcome::RenameError
}

async fn write_timestamp(
    backend: &BackendHandle,
    collection: &mut MediaCollection,
    id: RecordId,
    path: &Path,
    parsed: Option<time::OffsetDateTime>,
) -> bool {
    let result = match parsed {
        Some(modified) => match backend.set_modified(path, modified).await {
            Ok(()) => Some(modified),
            Err(error) => {
                tracing::warn!(%id, path = %path.display(), %error, "timestamp write failed");
                None
            },
        },
        None => {
            tracing::warn!(%id, path = %path.display(), "edited date does not parse");
            None
        },
    };
    match (result, collection.record_by_id_mut(id)) {
        (Some(modified), Some(record)) => {
            record.commit_timestamp(modified);
            true
        },
        (None, Some(record)) => {
            record.mark_timestamp_error();
            false
        },
        _ => false,
    }
}

/// First free name in `desired`'s directory, trying `desired` itself when
/// `suffix` starts at 0, then `stem-1.ext`, `stem-2.ext`, …
async fn unique_target(backend: &BackendHandle, desired: &Path, mut suffix: u64) -> Result<PathBuf> {
    let name = desired.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let (stem, extension) = match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(index) => name.split_at(index),
    };
    loop {
        let candidate = if suffix == 0 {
            desired.to_owned()
        } else {
            desired.with_file_name(format!("{stem}-{suffix}{extension}"))
        };
        if !backend.exists(&candidate).await.or_raise(|| ErrorKind::Storage)? {
            return Ok(candidate);
        }
        suffix += 1;
    }
}
