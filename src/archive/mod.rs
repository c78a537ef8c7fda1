//! Batched archive assembly
//!
//! Consumes an ordered sequence of audio items (or already-in-memory named
//! buffers), groups items into batches of at most N, and writes each batch
//! into an in-memory ZIP buffer. Items are fetched on demand while zipping;
//! fetched audio stays cached on the item, so re-zipping with a different
//! batch size downloads nothing.
//!
//! Failure policy: a batch whose entry cannot be produced is aborted with
//! [`ArchiveError::EntryFailed`]. The engine never emits an archive with
//! entries silently dropped.

mod batching;


pub use batching::plan_batches;

use bytes::Bytes;
use std::io::{Cursor, Write};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use zip::write::FileOptions;

use crate::config::Compression;
use crate::entity::AudioItem;
use crate::error::{ArchiveError, Error, Result};
use crate::types::Event;
use crate::utils::sanitize_entry_name;

/// An immutable, in-memory ZIP container
#[derive(Clone, Debug)]
pub struct ArchiveBuffer {
    data: Bytes,
    entry_count: usize,
}

impl ArchiveBuffer {
    fn new(data: Vec<u8>, entry_count: usize) -> Self {
        Self {
            data: Bytes::from(data),
            entry_count,
        }
    }

    /// The raw ZIP bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The ZIP bytes as a cheap-clone buffer
    pub fn to_bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Size of the container in bytes
    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    /// Number of entries written into this archive
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }
}

/// Input to the archival engine
#[derive(Debug)]
pub enum ZipSource<'a> {
    /// An ordered sequence of audio items, fetched on demand
    Items(&'a [AudioItem]),
    /// Already-in-memory buffers keyed by display name
    ///
    /// Used when combining previously produced outputs. The display name
    /// plays the role of the entry filename. This form cannot be batched.
    Named(&'a [(String, Bytes)]),
}

impl ZipSource<'_> {
    /// Number of entries in the source
    pub fn len(&self) -> usize {
        match self {
            ZipSource::Items(items) => items.len(),
            ZipSource::Named(entries) => entries.len(),
        }
    }

    /// Whether the source has no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Batched ZIP assembly engine
///
/// Construction is cheap; a session builds one per pass with its own
/// progress channel and cancellation token.
pub struct Archiver {
    compression: Compression,
    progress: Option<broadcast::Sender<Event>>,
    cancel: CancellationToken,
}

impl Archiver {
    /// Create an engine with the given compression method, no progress
    /// reporting, and a token that never cancels
    pub fn new(compression: Compression) -> Self {
        Self {
            compression,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Report per-item and per-batch progress on the given channel
    pub fn with_progress(mut self, tx: broadcast::Sender<Event>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Observe the given token; cancellation is honored between items,
    /// never mid-item
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Zip the source into one or more archives
    ///
    /// Always returns a sequence of buffers, in batch order; length 1 when
    /// `batch_size` is `None` or covers the whole source. Entries appear in
    /// the exact iteration order of the input.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::BatchedNamedSource`] when `batch_size` is combined
    ///   with a [`ZipSource::Named`] input.
    /// - [`ArchiveError::EntryFailed`] when an item's audio cannot be
    ///   produced; the batch is aborted, never emitted partially.
    /// - [`Error::Cancelled`] when the token fires between items.
    pub async fn zip(
        &self,
        source: ZipSource<'_>,
        batch_size: Option<usize>,
    ) -> Result<Vec<ArchiveBuffer>> {
        match source {
            ZipSource::Named(entries) => {
                if batch_size.is_some() {
                    return Err(ArchiveError::BatchedNamedSource.into());
                }
                let archive = self.zip_named(entries)?;
                Ok(vec![archive])
            }
            ZipSource::Items(items) => {
                let plan = plan_batches(items.len(), batch_size);
                let batch_count = plan.len();
                debug!(
                    items = items.len(),
                    ?batch_size,
                    batches = batch_count,
                    "zipping items"
                );

                let mut archives = Vec::with_capacity(batch_count);
                for (index, range) in plan.into_iter().enumerate() {
                    let archive = self
                        .zip_item_batch(&items[range], index + 1, batch_count)
                        .await?;
                    archives.push(archive);
                }
                Ok(archives)
            }
        }
    }

    /// Zip one batch of items, fetching audio on demand
    async fn zip_item_batch(
        &self,
        items: &[AudioItem],
        batch: usize,
        batch_count: usize,
    ) -> Result<ArchiveBuffer> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(self.compression.method());
        let total = items.len();

        for (i, item) in items.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            self.emit(Event::Fetching {
                index: i + 1,
                total,
                title: item.display_title(),
                cached: item.is_cached(),
            });

            let audio = item
                .fetch_audio()
                .await
                .map_err(|e| ArchiveError::EntryFailed {
                    batch,
                    name: item.filename().to_string(),
                    source: Box::new(e),
                })?;

            writer.start_file(sanitize_entry_name(item.filename()), options)?;
            writer.write_all(&audio)?;
        }

        let cursor = writer.finish()?;
        self.emit(Event::BatchReady {
            batch,
            batch_count,
            entry_count: total,
        });
        Ok(ArchiveBuffer::new(cursor.into_inner(), total))
    }

    /// Zip already-in-memory buffers into a single archive
    fn zip_named(&self, entries: &[(String, Bytes)]) -> Result<ArchiveBuffer> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(self.compression.method());
        let total = entries.len();

        for (i, (name, data)) in entries.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            self.emit(Event::Fetching {
                index: i + 1,
                total,
                title: name.clone(),
                cached: true,
            });
            writer.start_file(sanitize_entry_name(name), options)?;
            writer.write_all(data)?;
        }

        let cursor = writer.finish()?;
        self.emit(Event::BatchReady {
            batch: 1,
            batch_count: 1,
            entry_count: total,
        });
        Ok(ArchiveBuffer::new(cursor.into_inner(), total))
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.progress {
            // Nobody listening is fine; progress never affects correctness
            tx.send(event).ok();
        }
    }
}
