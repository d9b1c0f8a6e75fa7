//! The hot set and its eviction discipline.

use crate::budget::{self, MemoryBudget};
use crate::decoder::{DecodedContent, DecoderHandle};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use remo_batch::{MediaCollection, MediaRecord, RecordId};
use remo_config::CacheConfig;
use remo_storage::BackendHandle;
use std::collections::VecDeque;
use std::sync::Arc;

/// Request-ordered cache of decoded content, keyed by record identity so a
/// rename never orphans an entry.
///
/// The hot set is a queue: a decode pushes to the back, a hit moves its
/// entry to the back, eviction pops from the front. After every admission
/// the queue is shrunk until the estimated resident total plus the safety
/// margin fits under whatever the budget provider reports *right now*.
pub struct ContentCache {
    backend: BackendHandle,
    decoder: DecoderHandle,
    budget: Box<dyn MemoryBudget>,
    margin: u64,
    hot: VecDeque<(RecordId, Arc<DecodedContent>)>,
    preload_suspended: bool,
}

impl ContentCache {
    pub fn new(
        backend: BackendHandle,
        decoder: DecoderHandle,
        budget: Box<dyn MemoryBudget>,
        margin: u64,
    ) -> Self {
        Self { backend, decoder, budget, margin, hot: VecDeque::new(), preload_suspended: false }
    }

    /// Budget and margin from the loaded configuration.
    pub fn from_config(backend: BackendHandle, decoder: DecoderHandle, config: &CacheConfig) -> Self {
        Self::new(backend, decoder, budget::from_config(config), config.margin_bytes)
    }

    /// Content of the record at `index`, decoding it if cold, then eagerly
    /// warming `index - 1` and `index + 1` under the same eviction
    /// discipline (unless preloading is suspended).
    ///
    /// A neighbor that fails to decode is logged and skipped; only the
    /// requested record's failure reaches the caller.
    pub async fn get(
        &mut self,
        index: usize,
        collection: &MediaCollection,
    ) -> Result<Arc<DecodedContent>> {
        let record = collection.get(index).or_raise(|| ErrorKind::Collection)?;
        let content = self.fetch(record).await?;

        if !self.preload_suspended {
            let neighbors = [index.checked_sub(1), index.checked_add(1)];
            for neighbor in neighbors.into_iter().flatten() {
                let Ok(record) = collection.get(neighbor) else { continue };
                if let Err(error) = self.fetch(record).await {
                    tracing::debug!(index = neighbor, %error, "neighbor preload failed");
                }
            }
        }
        Ok(content)
    }

    /// Non-blocking lookup by record identity. Never decodes and never
    /// reorders the hot set; callers poll this while waiting for a
    /// `Changed`/`ContentInvalidated` notification after a `get`.
    pub fn peek(&self, id: RecordId) -> Option<Arc<DecodedContent>> {
        self.hot.iter().find(|(hot_id, _)| *hot_id == id).map(|(_, content)| content.clone())
    }

    /// Drops one record's content, e.g. after its bytes changed on disk.
    /// Neighbors stay hot.
    pub fn flush(&mut self, id: RecordId) {
        self.hot.retain(|(hot_id, _)| *hot_id != id);
    }

    /// Clears the whole hot set (directory reopen).
    pub fn flush_all(&mut self) {
        self.hot.clear();
    }

    /// Stops neighbor preloading until [`resume_preload`](Self::resume_preload).
    /// Used during bulk reordering, where the index space is in flux and
    /// preloading would thrash.
    pub fn suspend_preload(&mut self) {
        self.preload_suspended = true;
    }

    pub fn resume_preload(&mut self) {
        self.preload_suspended = false;
    }

    /// Number of records currently hot.
    pub fn len(&self) -> usize {
        self.hot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hot.is_empty()
    }

    /// Estimated resident size of the hot set.
    pub fn estimated_bytes(&self) -> u64 {
        self.hot.iter().map(|(_, content)| content.approx_bytes()).sum()
    }

    async fn fetch(&mut self, record: &MediaRecord) -> Result<Arc<DecodedContent>> {
        if let Some(position) = self.hot.iter().position(|(id, _)| *id == record.id()) {
            // Hit: re-queue at the back so the least recently requested
            // entry is always the one at the front.
            if let Some(entry) = self.hot.remove(position) {
                let content = entry.1.clone();
                self.hot.push_back(entry);
                return Ok(content);
            }
        }
        let content = Arc::new(
            self.decoder.decode(&self.backend, record.path(), record.kind()).await?,
        );
        self.hot.push_back((record.id(), content.clone()));
        self.evict();
        Ok(content)
    }

    /// Pops from the front until `total + margin` fits under the budget or
    /// nothing is left. The freshly admitted entry is evictable too; its
    /// caller still holds the [`Arc`].
    fn evict(&mut self) {
        let budget = self.budget.available_bytes();
        while !self.hot.is_empty() && self.estimated_bytes() + self.margin > budget {
            if let Some((id, content)) = self.hot.pop_front() {
                tracing::trace!(%id, bytes = content.approx_bytes(), "evicted from hot set");
            }
        }
    }
}
