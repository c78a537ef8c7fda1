//! Per-session orchestration: cross-URL accumulation and size-cap
//! enforcement
//!
//! A [`Session`] owns the URL → entity cache for one user session and runs
//! evaluation passes over an ordered URL list. Processing is strictly
//! sequential — URL by URL, item by item — because every admitted descriptor
//! mutates the running byte total and the inclusion set, and the cap
//! decision must behave as if evaluated in input order.
//!
//! The cap is soft: the first crossing emits one warning, partitions the
//! URL list into included and excluded, and stops admitting further
//! results. Already-admitted results are kept.

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_helpers;


use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::archive::{Archiver, ZipSource};
use crate::config::Config;
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::resolver::Resolver;
use crate::types::{
    DownloadDescriptor, Event, SessionReport, SessionState, SizeCap, UrlError, UrlResult,
};
use crate::utils::{dedup_ordered, extract_and_clean_urls};

/// Event channel capacity; slow subscribers lose progress events, never
/// correctness
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One user session: entity cache, accumulator state, and event channel
pub struct Session {
    resolver: Arc<Resolver>,
    config: Config,
    urls: Vec<String>,
    entities: HashMap<String, Arc<Entity>>,
    state: SessionState,
    event_tx: broadcast::Sender<Event>,
    cancel: CancellationToken,
}

impl Session {
    /// Create a session over a resolver and configuration
    pub fn new(resolver: Arc<Resolver>, config: Config) -> Self {
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            resolver,
            config,
            urls: Vec::new(),
            entities: HashMap::new(),
            state: SessionState::Idle,
            event_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Subscribe to processing events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Token observed between items; cancelling it aborts the current pass
    /// at the next item boundary
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current accumulator state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The session configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// URLs of the current input list
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Number of cached entities (resolved URLs kept across passes)
    pub fn cached_entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Replace the input URL list, evicting cached entities for URLs that
    /// are no longer present
    ///
    /// Entities for retained URLs survive, along with their cached audio,
    /// so an edited list only re-fetches what actually changed.
    pub fn reset(&mut self, urls: &[String]) {
        self.entities.retain(|url, _| urls.contains(url));
        self.urls = urls.to_vec();
        self.state = SessionState::Idle;
    }

    /// Process free-form input text: extract URLs, clean, dedup, and run a
    /// pass with the given cap
    pub async fn process_input(&mut self, input: &str, cap: SizeCap) -> Result<SessionReport> {
        let urls = extract_and_clean_urls(input);
        self.process_urls(&urls, cap).await
    }

    /// Run a pass with the configured default cap
    pub async fn process(&mut self, urls: &[String]) -> Result<SessionReport> {
        self.process_urls(urls, self.config.size_cap()).await
    }

    /// Process an ordered URL list against a data-volume ceiling
    ///
    /// URLs are deduplicated order-preserving, then processed strictly in
    /// order. Resolution and extraction failures are per-URL error entries;
    /// sibling URLs continue. The first cap crossing stops admitting
    /// further results (soft cap). When the deduped list holds two or more
    /// URLs and anything was admitted, a combined all-URLs archive is
    /// offered as well.
    ///
    /// # Errors
    ///
    /// [`Error::Cancelled`] when the session token fires; per-URL failures
    /// never surface here.
    pub async fn process_urls(&mut self, input: &[String], cap: SizeCap) -> Result<SessionReport> {
        let urls = dedup_ordered(input.to_vec());
        self.reset(&urls);
        self.state = SessionState::Accumulating;

        match self.run_pass(&urls, cap).await {
            Ok(report) => {
                self.state = if report.capped {
                    SessionState::Capped
                } else {
                    SessionState::Exhausted
                };
                self.emit(Event::PassComplete { state: self.state });
                Ok(report)
            }
            Err(e) => {
                self.state = SessionState::Idle;
                Err(e)
            }
        }
    }

    async fn run_pass(&mut self, urls: &[String], cap: SizeCap) -> Result<SessionReport> {
        let archiver = self.archiver();
        let mut report = SessionReport::default();
        let mut accumulator = Accumulator::new(cap);

        for url in urls {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let entity = match self.entity_for(url).await {
                Ok(entity) => entity,
                Err(e) => {
                    self.record_url_error(&mut report, url, e);
                    continue;
                }
            };

            let (song_count, descriptors) =
                match self.prepare_descriptors(&entity, &archiver).await {
                    Ok(prepared) => prepared,
                    Err(Error::Cancelled) => return Err(Error::Cancelled),
                    Err(e) => {
                        self.record_url_error(&mut report, url, e);
                        continue;
                    }
                };

            let admitted = accumulator.admit(descriptors);
            if !admitted.is_empty() {
                accumulator.included.push(url.clone());
                report.total_songs += song_count;
                report.per_url.insert(
                    url.clone(),
                    UrlResult {
                        song_count,
                        descriptors: admitted,
                    },
                );
            }

            if accumulator.capped {
                warn!(
                    cap = %cap,
                    total_bytes = accumulator.total_bytes,
                    "total data size exceeds the limit, downloads capped"
                );
                self.emit(Event::CapExceeded {
                    value: cap.value,
                    unit: cap.unit,
                });
                break;
            }
        }

        report.capped = accumulator.capped;
        report.total_bytes = accumulator.total_bytes;
        report.included_urls = accumulator.included.clone();
        report.excluded_urls = urls
            .iter()
            .filter(|url| !accumulator.included.contains(*url))
            .cloned()
            .collect();

        if urls.len() >= 2 && !accumulator.entries.is_empty() {
            report.combined = Some(
                self.combine_all(&archiver, &accumulator.entries, report.total_songs)
                    .await?,
            );
        }

        info!(
            urls = urls.len(),
            included = report.included_urls.len(),
            excluded = report.excluded_urls.len(),
            capped = report.capped,
            total_bytes = report.total_bytes,
            "evaluation pass complete"
        );
        Ok(report)
    }

    /// Resolve a URL, serving the session cache when the entity is already
    /// known
    async fn entity_for(&mut self, url: &str) -> Result<Arc<Entity>> {
        if let Some(entity) = self.entities.get(url) {
            return Ok(Arc::clone(entity));
        }
        let resolved = self.resolver.resolve(url).await?;
        self.emit(Event::Resolved {
            url: url.to_string(),
            platform: resolved.platform,
            kind: resolved.kind,
            song_count: resolved.entity.song_count(),
        });
        let entity = Arc::new(resolved.entity);
        self.entities.insert(url.to_string(), Arc::clone(&entity));
        Ok(entity)
    }

    /// Produce the download descriptors for one entity
    ///
    /// A song yields exactly one raw-audio descriptor; a playlist yields
    /// one descriptor per archive batch, plus an all-batches archive when
    /// the playlist was split.
    async fn prepare_descriptors(
        &self,
        entity: &Entity,
        archiver: &Archiver,
    ) -> Result<(usize, Vec<DownloadDescriptor>)> {
        match entity {
            Entity::Song(item) => {
                let audio = item.fetch_audio().await?;
                Ok((
                    1,
                    vec![DownloadDescriptor {
                        label: "Download Song".to_string(),
                        payload: audio,
                        suggested_filename: item.filename().to_string(),
                        mime_type: "audio/mpeg".to_string(),
                    }],
                ))
            }
            Entity::Playlist(playlist) => {
                let song_count = playlist.len();
                let batch_size = self.config.default_batch_size();
                let items = playlist.items().await?;
                let archives = archiver.zip(ZipSource::Items(items), Some(batch_size)).await?;
                let mut descriptors =
                    playlist_descriptors(playlist.title(), song_count, batch_size, &archives);
                if archives.len() > 1 {
                    let combined = self
                        .combine_batches(
                            archiver,
                            playlist.title(),
                            song_count,
                            batch_size,
                            &descriptors,
                        )
                        .await?;
                    descriptors.push(combined);
                }
                Ok((song_count, descriptors))
            }
        }
    }

    /// Re-zip a split playlist's batch archives into one all-batches archive
    async fn combine_batches(
        &self,
        archiver: &Archiver,
        title: &str,
        song_count: usize,
        batch_size: usize,
        batches: &[DownloadDescriptor],
    ) -> Result<DownloadDescriptor> {
        let entries: Vec<(String, Bytes)> = batches
            .iter()
            .map(|d| (d.suggested_filename.clone(), d.payload.clone()))
            .collect();
        let archives = archiver.zip(ZipSource::Named(&entries), None).await?;
        Ok(DownloadDescriptor {
            label: format!(
                "Download All {} Songs (Batches of {}) (.zip)",
                song_count, batch_size
            ),
            payload: archives[0].to_bytes(),
            suggested_filename: format!("{} - All Songs (Batches of {}).zip", title, batch_size),
            mime_type: "application/zip".to_string(),
        })
    }

    /// Re-zip every admitted payload into the combined all-URLs archive
    async fn combine_all(
        &self,
        archiver: &Archiver,
        entries: &[(String, Bytes)],
        total_songs: usize,
    ) -> Result<DownloadDescriptor> {
        let archives = archiver.zip(ZipSource::Named(entries), None).await?;
        let archive = &archives[0];
        self.emit(Event::CombinedReady {
            song_count: total_songs,
            size_bytes: archive.size_bytes(),
        });
        Ok(DownloadDescriptor {
            label: format!("Download All {} Songs (.zip)", total_songs),
            payload: archive.to_bytes(),
            suggested_filename: format!("all_songs_{}.zip", Utc::now().format("%Y-%m-%d")),
            mime_type: "application/zip".to_string(),
        })
    }

    fn record_url_error(&self, report: &mut SessionReport, url: &str, e: Error) {
        error!(url, error = %e, "failed to process URL");
        self.emit(Event::UrlFailed {
            url: url.to_string(),
            message: e.to_string(),
        });
        report.errors.push(UrlError {
            url: url.to_string(),
            platform: e.platform(),
            message: e.to_string(),
        });
    }

    fn archiver(&self) -> Archiver {
        let archiver = Archiver::new(self.config.archive.compression)
            .with_cancellation(self.cancel.clone());
        if self.config.progress {
            archiver.with_progress(self.event_tx.clone())
        } else {
            archiver
        }
    }

    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("urls", &self.urls.len())
            .field("cached_entities", &self.entities.len())
            .field("state", &self.state)
            .finish()
    }
}

/// Running accumulation state for one pass: the ordered name → payload set,
/// an O(1)-updated byte total, and the included-URL list
struct Accumulator {
    cap: SizeCap,
    entries: Vec<(String, Bytes)>,
    index: HashMap<String, usize>,
    total_bytes: u64,
    included: Vec<String>,
    capped: bool,
}

impl Accumulator {
    fn new(cap: SizeCap) -> Self {
        Self {
            cap,
            entries: Vec::new(),
            index: HashMap::new(),
            total_bytes: 0,
            included: Vec::new(),
            capped: false,
        }
    }

    /// Admit descriptors one at a time, re-evaluating the cap after every
    /// addition; stops at the first crossing and returns what was admitted
    fn admit(&mut self, descriptors: Vec<DownloadDescriptor>) -> Vec<DownloadDescriptor> {
        let mut admitted = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            self.add_entry(&descriptor);
            admitted.push(descriptor);
            if self.cap.exceeded_by(self.total_bytes) {
                self.capped = true;
                break;
            }
        }
        admitted
    }

    /// Insert or replace one named payload, keeping the running total exact
    fn add_entry(&mut self, descriptor: &DownloadDescriptor) {
        let name = &descriptor.suggested_filename;
        if let Some(&slot) = self.index.get(name) {
            // Same filename produced again (e.g. duplicate titles): replace
            // and account for the evicted payload
            self.total_bytes -= self.entries[slot].1.len() as u64;
            self.entries[slot].1 = descriptor.payload.clone();
        } else {
            self.index.insert(name.clone(), self.entries.len());
            self.entries.push((name.clone(), descriptor.payload.clone()));
        }
        self.total_bytes += descriptor.size_bytes();
    }
}

/// Build the per-batch download descriptors for a playlist, mirroring the
/// 1-based "Songs {start} to {end}" labeling
fn playlist_descriptors(
    title: &str,
    song_count: usize,
    batch_size: usize,
    archives: &[crate::archive::ArchiveBuffer],
) -> Vec<DownloadDescriptor> {
    if archives.len() > 1 {
        archives
            .iter()
            .enumerate()
            .map(|(idx, archive)| {
                let start = idx * batch_size + 1;
                let end = (start + batch_size - 1).min(song_count);
                DownloadDescriptor {
                    label: format!("Download Songs {} to {} (.zip)", start, end),
                    payload: archive.to_bytes(),
                    suggested_filename: format!("{} - Songs {} to {}.zip", title, start, end),
                    mime_type: "application/zip".to_string(),
                }
            })
            .collect()
    } else {
        archives
            .iter()
            .map(|archive| DownloadDescriptor {
                label: format!("Download {} Songs (.zip)", song_count),
                payload: archive.to_bytes(),
                suggested_filename: format!("{}.zip", title),
                mime_type: "application/zip".to_string(),
            })
            .collect()
    }
}
