//! Error types for tunepack
//!
//! The taxonomy distinguishes three failure scopes:
//! - Resolution and upstream extraction errors are scoped to a single URL
//!   and never abort processing of sibling URLs.
//! - Archival errors are contract violations or mid-batch failures; a batch
//!   that cannot be completed is aborted with a structured error rather than
//!   emitted as a partial or corrupt archive.
//! - Crossing the size cap is *not* an error; it is reported through the
//!   [`crate::types::SessionReport`].

use thiserror::Error;

use crate::types::Platform;

/// Result type alias for tunepack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tunepack
#[derive(Debug, Error)]
pub enum Error {
    /// URL did not match any registered platform provider
    #[error("unsupported URL or platform: {url}")]
    UnsupportedUrl {
        /// The unrecognized URL
        url: String,
    },

    /// The external platform adapter failed to retrieve metadata or audio
    #[error("{platform} extraction error: {message}")]
    Extraction {
        /// Platform the failure originated from
        platform: Platform,
        /// Adapter-reported failure description
        message: String,
    },

    /// Archive assembly error
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Configuration error
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable description of the invalid setting
        message: String,
    },

    /// ZIP container error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input URL could not be parsed
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Processing was cancelled between items
    #[error("operation cancelled")]
    Cancelled,
}

/// Archive-assembly errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// `batch_size` was combined with a named-buffer (mapping) source
    ///
    /// Batching applies to item sequences only; re-zipping already-produced
    /// buffers is always a single archive. Asking for both is a caller bug.
    #[error("batch_size cannot be combined with a named-buffer source")]
    BatchedNamedSource,

    /// An entry could not be produced, so the whole batch was aborted
    ///
    /// The engine never emits an archive with entries silently missing; a
    /// failed fetch aborts the batch it belongs to.
    #[error("batch {batch} aborted: entry '{name}' failed")]
    EntryFailed {
        /// 1-based index of the aborted batch
        batch: usize,
        /// Label of the failing entry
        name: String,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Platform a per-URL error originated from, if it carries one
    pub fn platform(&self) -> Option<Platform> {
        match self {
            Error::Extraction { platform, .. } => Some(*platform),
            Error::Archive(ArchiveError::EntryFailed { source, .. }) => source.platform(),
            _ => None,
        }
    }
}
