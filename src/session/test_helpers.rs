//! Shared stub providers for session tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::entity::{AudioFetcher, AudioItem, Entity, Playlist, PlaylistSource};
use crate::error::{Error, Result};
use crate::resolver::{EntityProvider, Resolver};
use crate::types::{EntityKind, Platform};

/// Fetcher serving a fixed payload, counting underlying downloads
pub(crate) struct StubFetcher {
    pub payload: Bytes,
    pub downloads: Arc<AtomicUsize>,
}

#[async_trait]
impl AudioFetcher for StubFetcher {
    async fn fetch(&self) -> Result<Bytes> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }
}

/// Song provider matching URLs by substring, counting resolve calls
pub(crate) struct SongProvider {
    pub needle: &'static str,
    pub platform: Platform,
    pub title: &'static str,
    pub filename: &'static str,
    pub payload_size: usize,
    pub resolves: Arc<AtomicUsize>,
    pub downloads: Arc<AtomicUsize>,
}

impl SongProvider {
    pub fn new(needle: &'static str, title: &'static str, filename: &'static str, payload_size: usize) -> Self {
        Self {
            needle,
            platform: Platform::YouTube,
            title,
            filename,
            payload_size,
            resolves: Arc::new(AtomicUsize::new(0)),
            downloads: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl EntityProvider for SongProvider {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Song
    }

    fn matches(&self, url: &str) -> bool {
        url.contains(self.needle)
    }

    async fn resolve(&self, _url: &str) -> Result<Entity> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        Ok(Entity::Song(AudioItem::new(
            self.title,
            "Stub Artist",
            self.filename,
            Arc::new(StubFetcher {
                payload: Bytes::from(vec![0x5a; self.payload_size]),
                downloads: Arc::clone(&self.downloads),
            }),
        )))
    }
}

/// Playlist source with `track_count` stub tracks of `track_size` bytes each
pub(crate) struct StubPlaylist {
    pub title: String,
    pub track_count: usize,
    pub track_size: usize,
}

#[async_trait]
impl PlaylistSource for StubPlaylist {
    fn title(&self) -> &str {
        &self.title
    }

    fn declared_len(&self) -> usize {
        self.track_count
    }

    async fn load_items(&self) -> Result<Vec<AudioItem>> {
        Ok((0..self.track_count)
            .map(|i| {
                AudioItem::preloaded(
                    format!("{} track {}", self.title, i + 1),
                    "Various",
                    format!("{}_track_{}.mp3", self.title, i + 1),
                    Bytes::from(vec![0x2b; self.track_size]),
                )
            })
            .collect())
    }
}

/// Playlist provider matching URLs by substring
pub(crate) struct PlaylistProvider {
    pub needle: &'static str,
    pub title: &'static str,
    pub track_count: usize,
    pub track_size: usize,
}

#[async_trait]
impl EntityProvider for PlaylistProvider {
    fn platform(&self) -> Platform {
        Platform::Spotify
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Playlist
    }

    fn matches(&self, url: &str) -> bool {
        url.contains(self.needle)
    }

    async fn resolve(&self, _url: &str) -> Result<Entity> {
        Ok(Entity::Playlist(Playlist::new(Arc::new(StubPlaylist {
            title: self.title.to_string(),
            track_count: self.track_count,
            track_size: self.track_size,
        }))))
    }
}

/// Provider whose resolution always fails with an extraction error
pub(crate) struct FailingProvider {
    pub needle: &'static str,
    pub platform: Platform,
}

#[async_trait]
impl EntityProvider for FailingProvider {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Song
    }

    fn matches(&self, url: &str) -> bool {
        url.contains(self.needle)
    }

    async fn resolve(&self, url: &str) -> Result<Entity> {
        Err(Error::Extraction {
            platform: self.platform,
            message: format!("stale page structure for {}", url),
        })
    }
}

/// Build a resolver from boxed providers
pub(crate) fn resolver_with(providers: Vec<Box<dyn EntityProvider>>) -> Arc<Resolver> {
    let mut resolver = Resolver::new();
    for provider in providers {
        resolver.register(provider);
    }
    Arc::new(resolver)
}
