//! The scrape run: listing page and metadata first, then chapter discovery, then the
//! worker pool, then assembly.

use crate::assemble::assemble;
use crate::model::{BookManifest, ChapterResult, FetchTarget};
use crate::pool::{ExtractionPool, Progress, DEFAULT_WORKERS};
use crate::scraper::{Fetch, ScraperError, SourceAdapter};
use tracing::{info, trace, warn};

/// Options for one scrape run.
#[derive(Clone, Copy)]
pub struct ScrapeOptions<'a> {
    /// Maximum concurrent chapter fetches.
    pub max_workers: usize,
    pub progress: Option<Progress<'a>>,
}

impl Default for ScrapeOptions<'_> {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_WORKERS,
            progress: None,
        }
    }
}

/// Scrape the adapter's novel into a manifest.
///
/// Fatal: listing fetch, metadata (title/author/cover), and listing-page discovery failures.
/// Chapter fetch and extraction failures are recorded as failed chapters.
pub fn scrape_novel(
    adapter: &dyn SourceAdapter,
    fetcher: &dyn Fetch,
    options: &ScrapeOptions<'_>,
) -> Result<BookManifest, ScraperError> {
    info!(site = %adapter.site(), url = %adapter.listing_url(), "Scraping novel information");
    let listing_html = fetcher.fetch_text(adapter.listing_url())?;
    let metadata = adapter.resolve_metadata(&listing_html, fetcher)?;

    let targets = adapter.build_fetch_targets();
    let chapters = adapter.discover_chapters(targets, fetcher)?;
    info!(count = chapters.len(), "Chapters to scrape");

    let pool = ExtractionPool::new(options.max_workers);
    let results = pool.run(
        &chapters,
        |_, target| fetch_and_extract(adapter, fetcher, target),
        options.progress,
    );

    Ok(assemble(metadata, adapter.range(), results))
}

/// One pool task. Never fails: fetch errors become a failed chapter with a placeholder body.
pub fn fetch_and_extract(
    adapter: &dyn SourceAdapter,
    fetcher: &dyn Fetch,
    target: &FetchTarget,
) -> ChapterResult {
    let number = target.chapter_number();
    let Some(url) = target.url() else {
        warn!(target = %target.label, "Target is not a chapter; skipped");
        return ChapterResult::failed(
            number,
            target.label.clone(),
            "novelscraper could not download this chapter (not a chapter link).",
            "",
        );
    };
    trace!(chapter = %target.label, %url, "Scraping chapter");
    match fetcher.fetch_text(url) {
        Ok(html) => adapter.extract_chapter(&html, target),
        Err(e) => {
            warn!(chapter = %target.label, %url, "Chapter download failed: {e}");
            ChapterResult::failed(
                number,
                target.label.clone(),
                format!("novelscraper could not download this chapter ({}).", e),
                url,
            )
        }
    }
}
