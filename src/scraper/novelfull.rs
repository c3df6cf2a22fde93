//! NovelFull adapter. Chapters are listed 50 per page on the novel's listing page
//! (`?page=N`); each listed link is one chapter document.

use crate::model::{ChapterRange, ChapterResult, FetchTarget, Locator, NovelMetadata};
use crate::scraper::error::ScraperError;
use crate::scraper::extract::{
    element_text, extract_text, first_text, into_chapter_result, paragraphs, parse_selector,
    sibling_after_label,
};
use crate::scraper::range::{chapter_number_from_label, keep_label};
use crate::scraper::{fetch_cover, Fetch, ListingDetails, Site, SourceAdapter};
use reqwest::Url;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

const NOVELFULL_BASE: &str = "https://novelfull.com";

static CHAPTER_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div#list-chapter a[title]").expect("chapter link selector parses")
});
static CHAPTER_CONTENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#chapter-content").expect("content selector parses"));

/// Page-paginated adapter for novelfull.com.
#[derive(Debug, Clone)]
pub struct NovelFullAdapter {
    listing: Url,
    range: ChapterRange,
}

impl NovelFullAdapter {
    /// Validate the listing URL's domain and keep the requested range.
    pub fn new(url: &str, range: ChapterRange) -> Result<Self, ScraperError> {
        let listing = Site::NovelFull.validate_url(url)?;
        Ok(Self { listing, range })
    }

    fn page_url(&self, page: u32) -> String {
        let mut url = self.listing.clone();
        url.set_query(Some(&format!("page={}", page)));
        url.set_fragment(None);
        url.to_string()
    }

    /// Chapter links on one listing page, filtered to the requested range.
    fn chapters_on_page(&self, html: &str) -> Result<Vec<FetchTarget>, ScraperError> {
        let doc = Html::parse_document(html);
        let base = Url::parse(NOVELFULL_BASE).map_err(|e| ScraperError::InvalidUrl {
            input: NOVELFULL_BASE.to_string(),
            reason: e.to_string(),
        })?;
        let mut targets = Vec::new();
        for link in doc.select(&CHAPTER_LINK) {
            let label = link.value().attr("title").unwrap_or_default().trim();
            if !keep_label(&self.range, label) {
                continue;
            }
            let Some(href) = link.value().attr("href") else {
                warn!(chapter = %label, "Chapter link has no href; skipped");
                continue;
            };
            let url = match base.join(href) {
                Ok(u) => u.to_string(),
                Err(e) => {
                    warn!(chapter = %label, %href, "Chapter link is not a valid URL: {e}");
                    continue;
                }
            };
            targets.push(FetchTarget::chapter(
                url,
                label,
                chapter_number_from_label(label),
            ));
        }
        Ok(targets)
    }
}

/// Title, author, description and cover URL from a NovelFull listing page.
fn parse_listing(html: &str, url: &str) -> Result<ListingDetails, ScraperError> {
    let doc = Html::parse_document(html);
    let title_sel = parse_selector("h3.title")?;
    let h3_sel = parse_selector("h3")?;
    let desc_sel = parse_selector("div.desc-text")?;
    let img_sel = parse_selector("img[alt]")?;

    let title = first_text(&doc, &title_sel).ok_or_else(|| ScraperError::MissingMetadata {
        field: "title",
        url: url.to_string(),
    })?;
    let author = sibling_after_label(&doc, &h3_sel, "Author:", "a")
        .map(element_text)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ScraperError::MissingMetadata {
            field: "author",
            url: url.to_string(),
        })?;
    let description = doc
        .select(&desc_sel)
        .next()
        .map(|div| paragraphs(div).join("\n"))
        .unwrap_or_default();
    // The cover's alt text is the novel title.
    let cover_url = doc
        .select(&img_sel)
        .find(|img| img.value().attr("alt").map(str::trim) == Some(title.as_str()))
        .and_then(|img| img.value().attr("src"))
        .map(String::from);

    Ok(ListingDetails {
        title,
        author,
        description,
        cover_url,
    })
}

impl SourceAdapter for NovelFullAdapter {
    fn site(&self) -> Site {
        Site::NovelFull
    }

    fn listing_url(&self) -> &str {
        self.listing.as_str()
    }

    fn range(&self) -> ChapterRange {
        self.range
    }

    fn resolve_metadata(
        &self,
        listing_html: &str,
        fetcher: &dyn Fetch,
    ) -> Result<NovelMetadata, ScraperError> {
        let details = parse_listing(listing_html, self.listing.as_str())?;
        let base = Url::parse(NOVELFULL_BASE).map_err(|e| ScraperError::InvalidUrl {
            input: NOVELFULL_BASE.to_string(),
            reason: e.to_string(),
        })?;
        let cover = fetch_cover(details.cover_url.as_deref(), &base, fetcher)?;
        Ok(details.into_metadata(cover, self.listing.as_str()))
    }

    fn build_fetch_targets(&self) -> Vec<FetchTarget> {
        let pages = self.range.pages();
        info!(first = *pages.start(), last = *pages.end(), "Pages to scrape");
        pages.map(FetchTarget::page).collect()
    }

    fn discover_chapters(
        &self,
        targets: Vec<FetchTarget>,
        fetcher: &dyn Fetch,
    ) -> Result<Vec<FetchTarget>, ScraperError> {
        let mut chapters = Vec::new();
        for target in targets {
            match target.locator {
                Locator::Page(page) => {
                    let url = self.page_url(page);
                    info!(page, "Scraping listing page");
                    let html = fetcher.fetch_text(&url)?;
                    let found = self.chapters_on_page(&html)?;
                    debug!(page, count = found.len(), "Chapters selected from page");
                    chapters.extend(found);
                }
                Locator::Chapter(_) => chapters.push(target),
            }
        }
        Ok(chapters)
    }

    fn extract_chapter(&self, raw_document: &str, target: &FetchTarget) -> ChapterResult {
        let url = target.url().unwrap_or_default();
        let number = target.chapter_number();
        let doc = Html::parse_document(raw_document);
        into_chapter_result(
            extract_text(&doc, &CHAPTER_CONTENT),
            number,
            target.label.clone(),
            url,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UNNUMBERED;
    use crate::test_support::FakeFetcher;

    const LISTING: &str = "https://novelfull.com/against-the-gods.html";

    const LISTING_HTML: &str = r#"<html><body>
<div class="book"><img src="/uploads/thumbs/against-the-gods.jpg" alt="Against the Gods"></div>
<h3 class="title">Against the Gods</h3>
<div class="info"><div><h3>Author:</h3><a href="/author/Mars+Gravity">Mars Gravity</a></div>
<div><h3>Genre:</h3><a href="/genre/Action">Action</a></div></div>
<div class="desc-text"><p>The Profound Sky Continent.</p><p>Yun Che's revenge.</p></div>
</body></html>"#;

    fn adapter(start: i64, end: i64) -> Result<NovelFullAdapter, ScraperError> {
        NovelFullAdapter::new(LISTING, ChapterRange::new(start, end)?)
    }

    fn page_html(links: &[(&str, &str)]) -> String {
        let items: String = links
            .iter()
            .map(|(href, title)| format!(r#"<li><a href="{}" title="{}">{}</a></li>"#, href, title, title))
            .collect();
        format!(r#"<html><body><div id="list-chapter"><ul>{}</ul></div></body></html>"#, items)
    }

    #[test]
    fn rejects_foreign_domain() -> Result<(), ScraperError> {
        let result = NovelFullAdapter::new(
            "https://www.wuxiaworld.com/novel/x",
            ChapterRange::new(1, 1)?,
        );
        assert!(matches!(result, Err(ScraperError::DomainMismatch { .. })));
        Ok(())
    }

    #[test]
    fn parse_listing_reads_all_fields() -> Result<(), ScraperError> {
        let details = parse_listing(LISTING_HTML, LISTING)?;
        assert_eq!(details.title, "Against the Gods");
        assert_eq!(details.author, "Mars Gravity");
        assert_eq!(
            details.description,
            "The Profound Sky Continent.\nYun Che's revenge."
        );
        assert_eq!(
            details.cover_url.as_deref(),
            Some("/uploads/thumbs/against-the-gods.jpg")
        );
        Ok(())
    }

    #[test]
    fn parse_listing_without_author_is_fatal() {
        let html = r#"<html><body><h3 class="title">Orphan</h3></body></html>"#;
        assert!(matches!(
            parse_listing(html, LISTING),
            Err(ScraperError::MissingMetadata { field: "author", .. })
        ));
    }

    #[test]
    fn parse_listing_without_title_is_fatal() {
        assert!(matches!(
            parse_listing("<html><body></body></html>", LISTING),
            Err(ScraperError::MissingMetadata { field: "title", .. })
        ));
    }

    #[test]
    fn resolve_metadata_fetches_cover_from_site_root() -> Result<(), ScraperError> {
        let fetcher = FakeFetcher::new().with_bytes(
            "https://novelfull.com/uploads/thumbs/against-the-gods.jpg",
            vec![0xFF, 0xD8, 0xFF],
        );
        let metadata = adapter(1, 1)?.resolve_metadata(LISTING_HTML, &fetcher)?;
        assert_eq!(metadata.title, "Against the Gods");
        assert_eq!(metadata.cover, vec![0xFF, 0xD8, 0xFF]);
        assert_eq!(metadata.source_url, LISTING);
        Ok(())
    }

    #[test]
    fn resolve_metadata_fails_when_cover_fetch_fails() -> Result<(), ScraperError> {
        let fetcher = FakeFetcher::new();
        let result = adapter(1, 1)?.resolve_metadata(LISTING_HTML, &fetcher);
        assert!(matches!(result, Err(ScraperError::HttpStatus { status: 404, .. })));
        Ok(())
    }

    #[test]
    fn targets_are_resolved_pages() -> Result<(), ScraperError> {
        let targets = adapter(50, 101)?.build_fetch_targets();
        assert_eq!(
            targets,
            vec![FetchTarget::page(1), FetchTarget::page(2), FetchTarget::page(3)]
        );
        Ok(())
    }

    #[test]
    fn discover_filters_links_and_keeps_unnumbered() -> Result<(), ScraperError> {
        let page1 = page_html(&[
            ("/against-the-gods/chapter-1.html", "Chapter 1 Yun Che"),
            ("/against-the-gods/chapter-2.html", "Chapter 2 Xiao Che"),
            ("/against-the-gods/prologue.html", "Prologue"),
            ("/against-the-gods/chapter-3.html", "Chapter 3 Heaven Poison"),
        ]);
        let fetcher = FakeFetcher::new().with_page(&format!("{}?page=1", LISTING), &page1);
        let adapter = adapter(2, 3)?;
        let chapters = adapter.discover_chapters(adapter.build_fetch_targets(), &fetcher)?;
        let labels: Vec<&str> = chapters.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Chapter 2 Xiao Che", "Prologue", "Chapter 3 Heaven Poison"]
        );
        assert_eq!(chapters[0].number, Some(2));
        assert_eq!(chapters[1].chapter_number(), UNNUMBERED);
        assert_eq!(
            chapters[0].url(),
            Some("https://novelfull.com/against-the-gods/chapter-2.html")
        );
        Ok(())
    }

    #[test]
    fn discover_fails_when_a_listing_page_fails() -> Result<(), ScraperError> {
        let fetcher = FakeFetcher::new().with_status(&format!("{}?page=1", LISTING), 500);
        let adapter = adapter(1, 5)?;
        let result = adapter.discover_chapters(adapter.build_fetch_targets(), &fetcher);
        assert!(matches!(result, Err(ScraperError::HttpStatus { status: 500, .. })));
        Ok(())
    }

    #[test]
    fn extract_chapter_uses_label_and_number() -> Result<(), ScraperError> {
        let target = FetchTarget::chapter(
            "https://novelfull.com/against-the-gods/chapter-7.html",
            "Chapter 7 Ling Yue",
            Some(7),
        );
        let html = r#"<div id="chapter-content"><p>Line one.</p><p>Line two.</p></div>"#;
        let result = adapter(1, 10)?.extract_chapter(html, &target);
        assert!(result.success);
        assert_eq!(result.number, 7);
        assert_eq!(result.title, "Chapter 7 Ling Yue");
        assert_eq!(result.text, "Line one.\nLine two.");
        Ok(())
    }
}
