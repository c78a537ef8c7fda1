//! Entity resolution: URL → (platform, kind, entity)
//!
//! Providers are registered in a fixed priority order and their URL
//! predicates are checked in that order; the first match wins. Predicates
//! must be cheap and purely syntactic — no network — so classification can
//! run without resolving.

use async_trait::async_trait;
use tracing::debug;

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::types::{EntityKind, Platform};

/// A platform adapter capable of recognizing and resolving URLs of one
/// (platform, kind) pair
#[async_trait]
pub trait EntityProvider: Send + Sync {
    /// Platform this provider serves
    fn platform(&self) -> Platform;

    /// Whether this provider yields songs or playlists
    fn kind(&self) -> EntityKind;

    /// Cheap, syntactic URL predicate
    fn matches(&self, url: &str) -> bool;

    /// Resolve the URL into an entity; may hit the network
    async fn resolve(&self, url: &str) -> Result<Entity>;
}

/// A URL resolved to a typed entity
#[derive(Debug)]
pub struct Resolved {
    /// Platform the URL belongs to
    pub platform: Platform,
    /// Song or playlist
    pub kind: EntityKind,
    /// The resolved entity
    pub entity: Entity,
}

/// Registry of entity providers, checked in registration order
#[derive(Default)]
pub struct Resolver {
    providers: Vec<Box<dyn EntityProvider>>,
}

impl Resolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider
    ///
    /// Registration order is the lookup priority order: a URL matched by
    /// several providers resolves through the first one registered.
    pub fn register(&mut self, provider: Box<dyn EntityProvider>) {
        self.providers.push(provider);
    }

    /// Number of registered providers
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Classify a URL without resolving it
    ///
    /// Returns the (platform, kind) of the first matching provider, or
    /// `None` for unsupported URLs.
    pub fn classify(&self, url: &str) -> Option<(Platform, EntityKind)> {
        self.providers
            .iter()
            .find(|p| p.matches(url))
            .map(|p| (p.platform(), p.kind()))
    }

    /// Resolve a URL through the first matching provider
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedUrl`] when no provider matches; whatever the
    /// provider reports when resolution itself fails.
    pub async fn resolve(&self, url: &str) -> Result<Resolved> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.matches(url))
            .ok_or_else(|| Error::UnsupportedUrl {
                url: url.to_string(),
            })?;

        debug!(
            url,
            platform = %provider.platform(),
            kind = %provider.kind(),
            "resolving URL"
        );
        let entity = provider.resolve(url).await?;
        Ok(Resolved {
            platform: provider.platform(),
            kind: provider.kind(),
            entity,
        })
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("providers", &self.providers.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::AudioItem;
    use bytes::Bytes;

    struct SubstringProvider {
        platform: Platform,
        kind: EntityKind,
        needle: &'static str,
        resolves_to: &'static str,
    }

    #[async_trait]
    impl EntityProvider for SubstringProvider {
        fn platform(&self) -> Platform {
            self.platform
        }

        fn kind(&self) -> EntityKind {
            self.kind
        }

        fn matches(&self, url: &str) -> bool {
            url.contains(self.needle)
        }

        async fn resolve(&self, _url: &str) -> Result<Entity> {
            Ok(Entity::Song(AudioItem::preloaded(
                self.resolves_to,
                "Artist",
                format!("{}.mp3", self.resolves_to),
                Bytes::from_static(b"audio"),
            )))
        }
    }

    fn test_resolver() -> Resolver {
        let mut resolver = Resolver::new();
        resolver.register(Box::new(SubstringProvider {
            platform: Platform::YouTube,
            kind: EntityKind::Song,
            needle: "youtube.com/watch?",
            resolves_to: "yt-video",
        }));
        resolver.register(Box::new(SubstringProvider {
            platform: Platform::YouTube,
            kind: EntityKind::Playlist,
            needle: "youtube.com/playlist?",
            resolves_to: "yt-playlist",
        }));
        resolver.register(Box::new(SubstringProvider {
            platform: Platform::SoundCloud,
            kind: EntityKind::Song,
            needle: "soundcloud.com/",
            resolves_to: "sc-track",
        }));
        resolver
    }

    #[tokio::test]
    async fn test_resolve_picks_matching_provider() {
        let resolver = test_resolver();
        let resolved = resolver
            .resolve("https://youtube.com/playlist?list=PL1")
            .await
            .unwrap();
        assert_eq!(resolved.platform, Platform::YouTube);
        assert_eq!(resolved.kind, EntityKind::Playlist);
    }

    #[tokio::test]
    async fn test_resolve_unsupported_url() {
        let resolver = test_resolver();
        let err = resolver
            .resolve("https://example.com/nothing")
            .await
            .unwrap_err();
        match err {
            Error::UnsupportedUrl { url } => assert!(url.contains("example.com")),
            other => panic!("expected UnsupportedUrl, got: {:?}", other),
        }
    }

    #[test]
    fn test_classify_respects_registration_order() {
        let mut resolver = Resolver::new();
        // Both providers match soundcloud URLs; the first registered wins
        resolver.register(Box::new(SubstringProvider {
            platform: Platform::SoundCloud,
            kind: EntityKind::Playlist,
            needle: "soundcloud.com",
            resolves_to: "sc-set",
        }));
        resolver.register(Box::new(SubstringProvider {
            platform: Platform::SoundCloud,
            kind: EntityKind::Song,
            needle: "soundcloud.com",
            resolves_to: "sc-track",
        }));

        let (platform, kind) = resolver.classify("https://soundcloud.com/a/sets/b").unwrap();
        assert_eq!(platform, Platform::SoundCloud);
        assert_eq!(kind, EntityKind::Playlist);
    }

    #[test]
    fn test_classify_unknown_is_none() {
        assert!(test_resolver().classify("https://bandcamp.com/x").is_none());
    }
}
