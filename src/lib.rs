//! novelscraper: CLI scraper for NovelFull and WuxiaWorld novels, outputting EPUB.

pub mod assemble;
pub mod cli;
pub mod config;
pub mod epub;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod pool;
pub mod scraper;

#[cfg(test)]
mod test_support;

// Re-exports for CLI and consumers.
pub use assemble::{assemble, output_file_name, sort_chapters};
pub use epub::{write_epub, EpubError};
pub use model::{BookManifest, ChapterRange, ChapterResult, FetchTarget, NovelMetadata};
pub use pipeline::{scrape_novel, ScrapeOptions};
pub use pool::ExtractionPool;
pub use scraper::{Adapter, Fetch, HttpClient, HttpClientBuilder, ScraperError, Site, SourceAdapter};
