//! Site adapters. Site detection, the adapter capability trait, the shared fetcher, and adapters.

mod client;
mod error;
mod extract;
mod range;

pub mod novelfull;
pub mod wuxiaworld;

pub use client::{Fetch, HttpClient, HttpClientBuilder};
pub use error::{ErrorKind, ScraperError};
pub use extract::{extract_text, Extraction, EXTRACTION_FAILED_TEXT};
pub use range::{
    chapter_number_from_label, keep_label, page_of, MAX_CHAPTER, MAX_RANGE_LEN, PAGE_SIZE,
};

pub use crate::model::ChapterRange;

use crate::model::{ChapterResult, FetchTarget, NovelMetadata};
use novelfull::NovelFullAdapter;
use reqwest::Url;
use std::fmt;
use tracing::{info, warn};
use wuxiaworld::WuxiaWorldAdapter;

/// Supported novel site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    NovelFull,
    WuxiaWorld,
}

impl Site {
    /// Registrable domain the site's URLs must be on.
    pub fn domain(self) -> &'static str {
        match self {
            Site::NovelFull => "novelfull.com",
            Site::WuxiaWorld => "wuxiaworld.com",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Site::NovelFull => "NovelFull",
            Site::WuxiaWorld => "WuxiaWorld",
        }
    }

    fn matches_host(self, host: &str) -> bool {
        let domain = self.domain();
        host == domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// Pick the site whose domain the URL's host belongs to.
    pub fn detect(url: &str) -> Result<Site, ScraperError> {
        let parsed = parse_url(url)?;
        let host = host_of(&parsed, url)?;
        [Site::NovelFull, Site::WuxiaWorld]
            .into_iter()
            .find(|site| site.matches_host(host))
            .ok_or_else(|| ScraperError::UnrecognizedHost {
                host: host.to_string(),
            })
    }

    /// Fail with [ScraperError::DomainMismatch] unless the URL's host is on this site's domain.
    pub fn validate_url(self, url: &str) -> Result<Url, ScraperError> {
        let parsed = parse_url(url)?;
        let host = host_of(&parsed, url)?;
        if !self.matches_host(host) {
            return Err(ScraperError::DomainMismatch {
                site: self.name(),
                host: host.to_string(),
            });
        }
        Ok(parsed)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_url(url: &str) -> Result<Url, ScraperError> {
    Url::parse(url.trim()).map_err(|e| ScraperError::InvalidUrl {
        input: url.to_string(),
        reason: e.to_string(),
    })
}

fn host_of<'a>(parsed: &'a Url, input: &str) -> Result<&'a str, ScraperError> {
    parsed.host_str().ok_or_else(|| ScraperError::InvalidUrl {
        input: input.to_string(),
        reason: "URL has no host".to_string(),
    })
}

/// Per-site knowledge used by the pipeline. Implementations hold only immutable
/// configuration, so one adapter is shared by every pool worker.
pub trait SourceAdapter: Sync {
    fn site(&self) -> Site;

    fn listing_url(&self) -> &str;

    fn range(&self) -> ChapterRange;

    /// Read title, author, description and cover from the listing page, fetching the cover image.
    /// A missing title or author is fatal.
    fn resolve_metadata(
        &self,
        listing_html: &str,
        fetcher: &dyn Fetch,
    ) -> Result<NovelMetadata, ScraperError>;

    /// Fetch targets covering the requested range, in discovery order.
    fn build_fetch_targets(&self) -> Vec<FetchTarget>;

    /// Expand targets into chapter targets. Sites whose targets already are chapters return them unchanged.
    fn discover_chapters(
        &self,
        targets: Vec<FetchTarget>,
        _fetcher: &dyn Fetch,
    ) -> Result<Vec<FetchTarget>, ScraperError> {
        Ok(targets)
    }

    /// Extract one fetched chapter document. Never fails; empty content yields a placeholder result.
    fn extract_chapter(&self, raw_document: &str, target: &FetchTarget) -> ChapterResult;
}

/// Adapter for one of the supported sites, selected by [Site].
#[derive(Debug, Clone)]
pub enum Adapter {
    NovelFull(NovelFullAdapter),
    WuxiaWorld(WuxiaWorldAdapter),
}

impl Adapter {
    /// Build the adapter for `site`, validating the URL's domain.
    pub fn new(site: Site, url: &str, range: ChapterRange) -> Result<Self, ScraperError> {
        match site {
            Site::NovelFull => NovelFullAdapter::new(url, range).map(Adapter::NovelFull),
            Site::WuxiaWorld => WuxiaWorldAdapter::new(url, range).map(Adapter::WuxiaWorld),
        }
    }

    /// Detect the site from the URL host, then build its adapter.
    pub fn detect(url: &str, range: ChapterRange) -> Result<Self, ScraperError> {
        Self::new(Site::detect(url)?, url, range)
    }

    fn inner(&self) -> &dyn SourceAdapter {
        match self {
            Adapter::NovelFull(a) => a as &dyn SourceAdapter,
            Adapter::WuxiaWorld(a) => a as &dyn SourceAdapter,
        }
    }
}

impl SourceAdapter for Adapter {
    fn site(&self) -> Site {
        self.inner().site()
    }

    fn listing_url(&self) -> &str {
        self.inner().listing_url()
    }

    fn range(&self) -> ChapterRange {
        self.inner().range()
    }

    fn resolve_metadata(
        &self,
        listing_html: &str,
        fetcher: &dyn Fetch,
    ) -> Result<NovelMetadata, ScraperError> {
        self.inner().resolve_metadata(listing_html, fetcher)
    }

    fn build_fetch_targets(&self) -> Vec<FetchTarget> {
        self.inner().build_fetch_targets()
    }

    fn discover_chapters(
        &self,
        targets: Vec<FetchTarget>,
        fetcher: &dyn Fetch,
    ) -> Result<Vec<FetchTarget>, ScraperError> {
        self.inner().discover_chapters(targets, fetcher)
    }

    fn extract_chapter(&self, raw_document: &str, target: &FetchTarget) -> ChapterResult {
        self.inner().extract_chapter(raw_document, target)
    }
}

/// Listing-page fields before the cover image is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListingDetails {
    pub title: String,
    pub author: String,
    pub description: String,
    pub cover_url: Option<String>,
}

impl ListingDetails {
    pub(crate) fn into_metadata(self, cover: Vec<u8>, source_url: &str) -> NovelMetadata {
        info!(title = %self.title, author = %self.author, "Novel information");
        NovelMetadata {
            title: self.title,
            author: self.author,
            description: self.description,
            cover,
            source_url: source_url.to_string(),
        }
    }
}

/// Fetch the cover image, resolving `src` against `base`. No cover element means an empty
/// cover; a cover that cannot be fetched is fatal.
pub(crate) fn fetch_cover(
    src: Option<&str>,
    base: &Url,
    fetcher: &dyn Fetch,
) -> Result<Vec<u8>, ScraperError> {
    let Some(src) = src.map(str::trim).filter(|s| !s.is_empty()) else {
        warn!("Listing page has no cover image; the book will have no cover");
        return Ok(Vec::new());
    };
    let url = base.join(src).map_err(|e| ScraperError::InvalidUrl {
        input: src.to_string(),
        reason: e.to_string(),
    })?;
    fetcher.fetch_bytes(url.as_str())
}
