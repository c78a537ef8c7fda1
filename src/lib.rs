//! # tunepack
//!
//! Backend library for batched music-download applications: paste a handful
//! of song or playlist URLs, get back size-bounded ZIP archives.
//!
//! ## Design Philosophy
//!
//! tunepack is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Adapter-agnostic** - Platform scraping/extraction lives behind the
//!   [`resolver::EntityProvider`] and [`entity::AudioFetcher`] traits;
//!   the core never talks to a platform directly
//! - **Event-driven** - Consumers subscribe to progress events, no polling
//! - **Predictable under pressure** - A soft data-volume cap stops admitting
//!   results instead of failing, and reports exactly what was included
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tunepack::{Config, Resolver, Session, SizeCap, SizeUnit};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut resolver = Resolver::new();
//!     // resolver.register(Box::new(MyYouTubeProvider::new()));
//!
//!     let mut session = Session::new(Arc::new(resolver), Config::default());
//!
//!     // Subscribe to events
//!     let mut events = session.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = session
//!         .process_input(
//!             "youtube.com/watch?v=abc, soundcloud.com/artist/track",
//!             SizeCap::new(2.0, SizeUnit::Gb),
//!         )
//!         .await?;
//!
//!     for url in &report.included_urls {
//!         for descriptor in &report.per_url[url].descriptors {
//!             println!("{} -> {}", descriptor.label, descriptor.suggested_filename);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Batched archive assembly
pub mod archive;
/// Configuration types
pub mod config;
/// Audio item and playlist abstractions
pub mod entity;
/// Error types
pub mod error;
/// URL → entity resolution registry
pub mod resolver;
/// Session orchestration and size-cap enforcement
pub mod session;
/// Core types and events
pub mod types;
/// URL cleaning and entry-name utilities
pub mod utils;

// Re-export commonly used types
pub use archive::{ArchiveBuffer, Archiver, ZipSource, plan_batches};
pub use config::{ArchiveConfig, Compression, Config, LimitsConfig};
pub use entity::{AudioFetcher, AudioItem, Entity, Playlist, PlaylistSource};
pub use error::{ArchiveError, Error, Result};
pub use resolver::{EntityProvider, Resolved, Resolver};
pub use session::Session;
pub use types::{
    DownloadDescriptor, EntityKind, Event, Platform, SessionReport, SessionState, SizeCap,
    SizeUnit, UrlError, UrlResult,
};
