//! Audio-bearing item and collection abstractions
//!
//! The platform adapters behind these types are external collaborators: all
//! the core needs from them is a title, a filename, and a way to produce the
//! audio bytes. Audio is fetched at most once per item and cached in memory
//! for the lifetime of the item (`Unfetched → Fetching → Cached`); repeated
//! fetches return the cached buffer without touching the adapter again.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Audio-download capability provided by a platform adapter
///
/// `fetch` may be slow and hit the network. It does not need to be
/// idempotent itself; [`AudioItem`] guarantees it is invoked at most once
/// per item, even under concurrent first fetches.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Download the audio bytes for one item
    async fn fetch(&self) -> Result<Bytes>;
}

/// A single song: title, filename, and an at-most-once cached audio buffer
pub struct AudioItem {
    title: String,
    artist: String,
    filename: String,
    audio: OnceCell<Bytes>,
    fetcher: Arc<dyn AudioFetcher>,
}

impl AudioItem {
    /// Create an item whose audio will be fetched on demand
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        filename: impl Into<String>,
        fetcher: Arc<dyn AudioFetcher>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            filename: filename.into(),
            audio: OnceCell::new(),
            fetcher,
        }
    }

    /// Create an item whose audio is already in memory
    ///
    /// The cache starts populated, so `fetch_audio` never touches an adapter.
    pub fn preloaded(
        title: impl Into<String>,
        artist: impl Into<String>,
        filename: impl Into<String>,
        audio: Bytes,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            filename: filename.into(),
            audio: OnceCell::new_with(Some(audio)),
            fetcher: Arc::new(PreloadedFetcher),
        }
    }

    /// Song title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Artist name
    pub fn artist(&self) -> &str {
        &self.artist
    }

    /// Filename for the audio file
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Title for display, carrying the artist when the title alone does not
    ///
    /// Titles already shaped like "Artist - Song" are left as-is.
    pub fn display_title(&self) -> String {
        if self.title.contains(" - ") || self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} by {}", self.title, self.artist)
        }
    }

    /// Whether the audio buffer is already cached
    pub fn is_cached(&self) -> bool {
        self.audio.initialized()
    }

    /// The cached audio buffer, if any, without triggering a download
    pub fn cached_audio(&self) -> Option<&Bytes> {
        self.audio.get()
    }

    /// Fetch the audio, downloading it on first call and serving the cached
    /// buffer thereafter
    ///
    /// Idempotent: concurrent first calls collapse into a single adapter
    /// download, and every call observes the same buffer.
    pub async fn fetch_audio(&self) -> Result<Bytes> {
        let audio = self
            .audio
            .get_or_try_init(|| async {
                debug!(title = %self.title, "downloading audio");
                self.fetcher.fetch().await
            })
            .await?;
        Ok(audio.clone())
    }
}

impl std::fmt::Debug for AudioItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioItem")
            .field("title", &self.title)
            .field("artist", &self.artist)
            .field("filename", &self.filename)
            .field("cached", &self.is_cached())
            .finish()
    }
}

/// Stand-in fetcher for preloaded items; the cache is populated up front so
/// this is never invoked
struct PreloadedFetcher;

#[async_trait]
impl AudioFetcher for PreloadedFetcher {
    async fn fetch(&self) -> Result<Bytes> {
        Ok(Bytes::new())
    }
}

/// Playlist capability provided by a platform adapter
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Playlist title
    fn title(&self) -> &str;

    /// Number of songs, reported without materializing the item list
    /// (API-reported count or scraped element count)
    fn declared_len(&self) -> usize;

    /// Build the ordered item list; called at most once per playlist
    async fn load_items(&self) -> Result<Vec<AudioItem>>;
}

/// An ordered collection of songs, lazily materialized from its source
pub struct Playlist {
    source: Arc<dyn PlaylistSource>,
    items: OnceCell<Vec<AudioItem>>,
}

impl Playlist {
    /// Create a playlist over a platform adapter
    pub fn new(source: Arc<dyn PlaylistSource>) -> Self {
        Self {
            source,
            items: OnceCell::new(),
        }
    }

    /// Playlist title
    pub fn title(&self) -> &str {
        self.source.title()
    }

    /// Number of songs
    ///
    /// Uses the materialized count once items are loaded, the source's
    /// declared count before that.
    pub fn len(&self) -> usize {
        match self.items.get() {
            Some(items) => items.len(),
            None => self.source.declared_len(),
        }
    }

    /// Whether the playlist has no songs
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The ordered items, materialized on first access and cached
    pub async fn items(&self) -> Result<&[AudioItem]> {
        let items = self
            .items
            .get_or_try_init(|| async {
                let items = self.source.load_items().await?;
                if items.len() != self.source.declared_len() {
                    warn!(
                        title = %self.source.title(),
                        declared = self.source.declared_len(),
                        materialized = items.len(),
                        "playlist length mismatch, using materialized count"
                    );
                }
                Ok::<_, Error>(items)
            })
            .await?;
        Ok(items.as_slice())
    }
}

impl std::fmt::Debug for Playlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playlist")
            .field("title", &self.title())
            .field("len", &self.len())
            .field("materialized", &self.items.initialized())
            .finish()
    }
}

/// A resolved, typed representation of a URL
#[derive(Debug)]
pub enum Entity {
    /// A single song
    Song(AudioItem),
    /// An ordered collection of songs
    Playlist(Playlist),
}

impl Entity {
    /// Whether this entity is a song or a playlist
    pub fn kind(&self) -> crate::types::EntityKind {
        match self {
            Entity::Song(_) => crate::types::EntityKind::Song,
            Entity::Playlist(_) => crate::types::EntityKind::Playlist,
        }
    }

    /// Number of songs behind this entity
    pub fn song_count(&self) -> usize {
        match self {
            Entity::Song(_) => 1,
            Entity::Playlist(playlist) => playlist.len(),
        }
    }
}
