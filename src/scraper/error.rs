//! Shared error type for the scrape pipeline, grouped into validation, fetch, and extraction failures.

use thiserror::Error;

/// Coarse failure class. Validation happens before any network activity; fetch and
/// extraction errors that reach a caller are always fatal for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Fetch,
    Extraction,
}

/// Fatal scraper error. Per-chapter failures never take this form; they become placeholder chapters.
#[derive(Debug, Error)]
pub enum ScraperError {
    // Validation
    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("The {site} scraper does not support URLs on host '{host}'.")]
    DomainMismatch { site: &'static str, host: String },

    #[error("Could not detect site from URL host '{host}'. Use the novelfull or wuxiaworld subcommand.")]
    UnrecognizedHost { host: String },

    #[error("Invalid start chapter {start}: must be greater than 0.")]
    InvalidStartChapter { start: i64 },

    #[error("Invalid end chapter {end}: must be greater than or equal to start chapter {start}.")]
    InvalidEndChapter { start: i64, end: i64 },

    #[error("Invalid chapter {chapter}: chapters above {max} are not supported.")]
    ChapterBeyondLimit { chapter: i64, max: i64 },

    #[error("Chapter range {start}-{end} is too large: at most {max} chapters per run.")]
    RangeTooLarge { start: i64, end: i64, max: i64 },

    // Fetch
    #[error("Network error: could not reach {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Extraction
    #[error("Could not find the novel's {field} on {url} (selector or structure may have changed).")]
    MissingMetadata { field: &'static str, url: String },

    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl ScraperError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScraperError::InvalidUrl { .. }
            | ScraperError::DomainMismatch { .. }
            | ScraperError::UnrecognizedHost { .. }
            | ScraperError::InvalidStartChapter { .. }
            | ScraperError::InvalidEndChapter { .. }
            | ScraperError::ChapterBeyondLimit { .. }
            | ScraperError::RangeTooLarge { .. } => ErrorKind::Validation,
            ScraperError::Network { .. }
            | ScraperError::HttpStatus { .. }
            | ScraperError::BodyRead { .. } => ErrorKind::Fetch,
            ScraperError::MissingMetadata { .. } | ScraperError::InvalidSelector { .. } => {
                ErrorKind::Extraction
            }
        }
    }
}
