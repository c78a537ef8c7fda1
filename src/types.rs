//! Core types for tunepack

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Media platform a URL was resolved against
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// youtube.com video and playlist URLs
    YouTube,
    /// spotify.com track and playlist URLs
    Spotify,
    /// soundcloud.com track and set URLs
    SoundCloud,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::YouTube => write!(f, "YouTube"),
            Platform::Spotify => write!(f, "Spotify"),
            Platform::SoundCloud => write!(f, "SoundCloud"),
        }
    }
}

/// Kind of entity a URL resolves to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A single song or video
    Song,
    /// An ordered collection of songs
    Playlist,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Song => write!(f, "song"),
            EntityKind::Playlist => write!(f, "playlist"),
        }
    }
}

/// Unit used to express the session data-volume ceiling
///
/// Conversions are 1024-based: 1 KB = 1024 B, 1 MB = 1024² B, 1 GB = 1024³ B.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    /// Bytes
    B,
    /// Kibibytes (1024 bytes)
    Kb,
    /// Mebibytes (1024² bytes)
    Mb,
    /// Gibibytes (1024³ bytes)
    #[default]
    Gb,
}

impl SizeUnit {
    /// Number of bytes in one unit
    pub fn bytes_per_unit(&self) -> u64 {
        match self {
            SizeUnit::B => 1,
            SizeUnit::Kb => 1024,
            SizeUnit::Mb => 1024 * 1024,
            SizeUnit::Gb => 1024 * 1024 * 1024,
        }
    }

    /// Convert a byte count into this unit
    pub fn from_bytes(&self, bytes: u64) -> f64 {
        bytes as f64 / self.bytes_per_unit() as f64
    }
}

impl std::fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeUnit::B => write!(f, "B"),
            SizeUnit::Kb => write!(f, "KB"),
            SizeUnit::Mb => write!(f, "MB"),
            SizeUnit::Gb => write!(f, "GB"),
        }
    }
}

impl std::str::FromStr for SizeUnit {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "b" => Ok(SizeUnit::B),
            "kb" => Ok(SizeUnit::Kb),
            "mb" => Ok(SizeUnit::Mb),
            "gb" => Ok(SizeUnit::Gb),
            other => Err(crate::error::Error::Config {
                message: format!("invalid size unit '{}', use b, kb, mb, or gb", other),
            }),
        }
    }
}

/// Data-volume ceiling for one processing pass
///
/// Enforced as a soft cap: the first crossing stops admitting further
/// results but keeps everything already accumulated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeCap {
    /// Ceiling value, expressed in `unit`
    pub value: f64,
    /// Unit the value is expressed in
    pub unit: SizeUnit,
}

impl SizeCap {
    /// Create a cap from a value and unit
    pub fn new(value: f64, unit: SizeUnit) -> Self {
        Self { value, unit }
    }

    /// The ceiling in bytes
    pub fn bytes(&self) -> f64 {
        self.value * self.unit.bytes_per_unit() as f64
    }

    /// Whether a running byte total has crossed this ceiling
    pub fn exceeded_by(&self, total_bytes: u64) -> bool {
        self.unit.from_bytes(total_bytes) > self.value
    }
}

impl std::fmt::Display for SizeCap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Metadata + payload bundle handed to the presentation layer to offer a
/// file for download
#[derive(Clone, Debug)]
pub struct DownloadDescriptor {
    /// Human-readable button/link label
    pub label: String,
    /// The file contents
    pub payload: Bytes,
    /// Filename to suggest to the user
    pub suggested_filename: String,
    /// MIME type of the payload
    pub mime_type: String,
}

impl DownloadDescriptor {
    /// Payload size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.payload.len() as u64
    }
}

/// Per-URL processing result: how many songs the URL contributed and the
/// download descriptors produced for it
#[derive(Clone, Debug, Default)]
pub struct UrlResult {
    /// Number of songs behind this URL (1 for a song, playlist length otherwise)
    pub song_count: usize,
    /// One descriptor per produced archive or raw audio file, in order
    pub descriptors: Vec<DownloadDescriptor>,
}

/// Per-URL error entry
///
/// Errors are isolated to their URL: a failing URL never aborts processing
/// of sibling URLs (see [`crate::session::Session::process_urls`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlError {
    /// The URL that failed
    pub url: String,
    /// Platform the failure originated from, when the URL resolved far
    /// enough to know it
    pub platform: Option<Platform>,
    /// Human-readable failure description
    pub message: String,
}

/// Accumulator state for one evaluation pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No pass in progress
    #[default]
    Idle,
    /// Processing URLs in input order
    Accumulating,
    /// The size cap was crossed; terminal for this pass
    Capped,
    /// All URLs processed without crossing the cap; terminal for this pass
    Exhausted,
}

/// Outcome of one `process_urls` evaluation pass
#[derive(Clone, Debug, Default)]
pub struct SessionReport {
    /// Results keyed by URL, for every URL whose output was admitted
    pub per_url: HashMap<String, UrlResult>,
    /// Per-URL errors (resolution or upstream extraction failures)
    pub errors: Vec<UrlError>,
    /// URLs whose output is part of the accumulated result set, input order
    pub included_urls: Vec<String>,
    /// URLs whose output was not admitted, input order
    pub excluded_urls: Vec<String>,
    /// Whether the size cap was crossed during this pass
    pub capped: bool,
    /// Total number of songs across admitted URLs
    pub total_songs: usize,
    /// Total admitted payload bytes
    pub total_bytes: u64,
    /// Combined everything-in-one archive, offered when the pass covered
    /// two or more distinct URLs
    pub combined: Option<DownloadDescriptor>,
}

/// Events emitted during processing
///
/// Consumers subscribe via [`crate::session::Session::subscribe`]. Events are
/// a side channel only: dropping or missing them never affects archive
/// contents or ordering.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A URL resolved to an entity
    Resolved {
        /// The resolved URL
        url: String,
        /// Platform the URL belongs to
        platform: Platform,
        /// Song or playlist
        kind: EntityKind,
        /// Number of songs behind the entity
        song_count: usize,
    },

    /// An item is being pulled into an archive
    Fetching {
        /// 1-based index of the item within the current zip pass
        index: usize,
        /// Total items in the current zip pass
        total: usize,
        /// Human-readable current-item label
        title: String,
        /// Whether the audio was already cached (zip only, no download)
        cached: bool,
    },

    /// One archive buffer was finalized
    BatchReady {
        /// 1-based index of the batch within its plan
        batch: usize,
        /// Total batches in the plan
        batch_count: usize,
        /// Entries written into this archive
        entry_count: usize,
    },

    /// A URL failed to resolve or extract; siblings continue
    UrlFailed {
        /// The failing URL
        url: String,
        /// Failure description
        message: String,
    },

    /// The size cap was crossed; emitted at most once per pass
    CapExceeded {
        /// Configured ceiling value
        value: f64,
        /// Unit the ceiling is expressed in
        unit: SizeUnit,
    },

    /// The combined all-URLs archive was assembled
    CombinedReady {
        /// Songs across every admitted URL
        song_count: usize,
        /// Size of the combined archive in bytes
        size_bytes: u64,
    },

    /// An evaluation pass finished
    PassComplete {
        /// Terminal state of the pass (`Capped` or `Exhausted`)
        state: SessionState,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_size_unit_conversion_table() {
        assert_eq!(SizeUnit::B.bytes_per_unit(), 1);
        assert_eq!(SizeUnit::Kb.bytes_per_unit(), 1024);
        assert_eq!(SizeUnit::Mb.bytes_per_unit(), 1024 * 1024);
        assert_eq!(SizeUnit::Gb.bytes_per_unit(), 1024 * 1024 * 1024);
    }

    #[test]
    fn test_size_unit_from_bytes() {
        assert_eq!(SizeUnit::Kb.from_bytes(2048), 2.0);
        assert_eq!(SizeUnit::Mb.from_bytes(1024 * 1024), 1.0);
    }

    #[test]
    fn test_size_unit_parse_is_case_insensitive() {
        assert_eq!("MB".parse::<SizeUnit>().unwrap(), SizeUnit::Mb);
        assert_eq!("gb".parse::<SizeUnit>().unwrap(), SizeUnit::Gb);
        assert!("tb".parse::<SizeUnit>().is_err());
    }

    #[test]
    fn test_size_cap_crossing_is_strict() {
        let cap = SizeCap::new(20.0, SizeUnit::Mb);
        assert!(
            !cap.exceeded_by(20 * 1024 * 1024),
            "exactly at the cap is not a crossing"
        );
        assert!(cap.exceeded_by(20 * 1024 * 1024 + 1));
    }

    #[test]
    fn test_size_cap_display() {
        let cap = SizeCap::new(2.0, SizeUnit::Gb);
        assert_eq!(cap.to_string(), "2 GB");
    }
}
