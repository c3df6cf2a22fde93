//! WuxiaWorld adapter. Chapter URLs follow `{listing}/{slug}-chapter-{n}`, so every chapter
//! in the range is one fetch target and no listing pages are needed.

use crate::model::{ChapterRange, ChapterResult, FetchTarget, NovelMetadata};
use crate::scraper::error::ScraperError;
use crate::scraper::extract::{
    element_text, extract_text, first_text, into_chapter_result, paragraphs, parse_selector,
    sibling_after_label,
};
use crate::scraper::{fetch_cover, Fetch, ListingDetails, Site, SourceAdapter};
use reqwest::Url;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static CHAPTER_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#chapter-outer h4").expect("title selector parses"));
static CHAPTER_CONTENT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div#chapter-outer div#chapter-content").expect("content selector parses")
});

/// URL-templated adapter for www.wuxiaworld.com.
#[derive(Debug, Clone)]
pub struct WuxiaWorldAdapter {
    listing: Url,
    /// Listing URL without query, fragment or trailing slash.
    chapter_prefix: String,
    range: ChapterRange,
}

impl WuxiaWorldAdapter {
    /// Validate the listing URL's domain and derive the chapter URL template from its last path segment.
    pub fn new(url: &str, range: ChapterRange) -> Result<Self, ScraperError> {
        let listing = Site::WuxiaWorld.validate_url(url)?;
        let mut base = listing.clone();
        base.set_query(None);
        base.set_fragment(None);
        let trimmed = base.as_str().trim_end_matches('/').to_string();
        let slug = base
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(String::from)
            .ok_or_else(|| ScraperError::InvalidUrl {
                input: url.to_string(),
                reason: "URL has no novel path".to_string(),
            })?;
        Ok(Self {
            chapter_prefix: format!("{}/{}-chapter-", trimmed, slug),
            listing,
            range,
        })
    }

    /// URL of chapter `n`.
    pub fn chapter_url(&self, n: i64) -> String {
        format!("{}{}", self.chapter_prefix, n)
    }
}

/// Title, author, synopsis and cover URL from a WuxiaWorld novel page.
fn parse_listing(html: &str, url: &str) -> Result<ListingDetails, ScraperError> {
    let doc = Html::parse_document(html);
    let title_sel = parse_selector("div.novel-body h2")?;
    let dt_sel = parse_selector("dt")?;
    let h3_sel = parse_selector("h3")?;
    let cover_sel = parse_selector("img.img-thumbnail")?;

    let title = first_text(&doc, &title_sel).ok_or_else(|| ScraperError::MissingMetadata {
        field: "title",
        url: url.to_string(),
    })?;
    let author = sibling_after_label(&doc, &dt_sel, "Author:", "dd")
        .map(element_text)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ScraperError::MissingMetadata {
            field: "author",
            url: url.to_string(),
        })?;
    let description = sibling_after_label(&doc, &h3_sel, "Synopsis", "div")
        .map(|div| paragraphs(div).join("\n"))
        .unwrap_or_default();
    let cover_url = doc
        .select(&cover_sel)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(String::from);

    Ok(ListingDetails {
        title,
        author,
        description,
        cover_url,
    })
}

impl SourceAdapter for WuxiaWorldAdapter {
    fn site(&self) -> Site {
        Site::WuxiaWorld
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
        let cover = fetch_cover(details.cover_url.as_deref(), &self.listing, fetcher)?;
        Ok(details.into_metadata(cover, self.listing.as_str()))
    }

    fn build_fetch_targets(&self) -> Vec<FetchTarget> {
        (self.range.start()..=self.range.end())
            .map(|n| FetchTarget::chapter(self.chapter_url(n), format!("Chapter {}", n), Some(n)))
            .collect()
    }

    fn extract_chapter(&self, raw_document: &str, target: &FetchTarget) -> ChapterResult {
        let url = target.url().unwrap_or_default();
        let number = target.chapter_number();
        let doc = Html::parse_document(raw_document);
        let title = first_text(&doc, &CHAPTER_TITLE).unwrap_or_else(|| target.label.clone());
        into_chapter_result(extract_text(&doc, &CHAPTER_CONTENT), number, title, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeFetcher;

    const LISTING: &str = "https://www.wuxiaworld.com/novel/martial-world";

    const LISTING_HTML: &str = r#"<html><body>
<img class="img-thumbnail" src="https://cdn.wuxiaworld.com/images/covers/mw.jpg">
<div class="novel-body"><h2>Martial World</h2>
<dl><dt>Translator:</dt><dd>GravityTales</dd><dt>Author:</dt><dd>Cocooned Cow</dd></dl></div>
<h3>Synopsis</h3><div class="fr-view"><p>In the Realm of the Gods...</p><p>Lin Ming.</p></div>
</body></html>"#;

    fn adapter(url: &str, start: i64, end: i64) -> Result<WuxiaWorldAdapter, ScraperError> {
        WuxiaWorldAdapter::new(url, ChapterRange::new(start, end)?)
    }

    #[test]
    fn chapter_urls_follow_template() -> Result<(), ScraperError> {
        let a = adapter(LISTING, 1, 1)?;
        assert_eq!(
            a.chapter_url(12),
            "https://www.wuxiaworld.com/novel/martial-world/martial-world-chapter-12"
        );
        let with_slash = adapter("https://www.wuxiaworld.com/novel/martial-world/", 1, 1)?;
        assert_eq!(with_slash.chapter_url(12), a.chapter_url(12));
        Ok(())
    }

    #[test]
    fn rejects_listing_without_path() -> Result<(), ScraperError> {
        assert!(matches!(
            adapter("https://www.wuxiaworld.com/", 1, 1),
            Err(ScraperError::InvalidUrl { .. })
        ));
        Ok(())
    }

    #[test]
    fn rejects_foreign_domain() -> Result<(), ScraperError> {
        assert!(matches!(
            adapter("https://novelfull.com/a.html", 1, 1),
            Err(ScraperError::DomainMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn one_target_per_chapter_in_order() -> Result<(), ScraperError> {
        let targets = adapter(LISTING, 3, 5)?.build_fetch_targets();
        let numbers: Vec<Option<i64>> = targets.iter().map(|t| t.number).collect();
        assert_eq!(numbers, vec![Some(3), Some(4), Some(5)]);
        assert_eq!(
            targets[0].url(),
            Some("https://www.wuxiaworld.com/novel/martial-world/martial-world-chapter-3")
        );
        Ok(())
    }

    #[test]
    fn parse_listing_reads_all_fields() -> Result<(), ScraperError> {
        let details = parse_listing(LISTING_HTML, LISTING)?;
        assert_eq!(details.title, "Martial World");
        assert_eq!(details.author, "Cocooned Cow");
        assert_eq!(details.description, "In the Realm of the Gods...\nLin Ming.");
        assert_eq!(
            details.cover_url.as_deref(),
            Some("https://cdn.wuxiaworld.com/images/covers/mw.jpg")
        );
        Ok(())
    }

    #[test]
    fn missing_author_block_is_fatal() {
        let html = r#"<div class="novel-body"><h2>Martial World</h2></div>"#;
        assert!(matches!(
            parse_listing(html, LISTING),
            Err(ScraperError::MissingMetadata { field: "author", .. })
        ));
    }

    #[test]
    fn missing_cover_element_yields_empty_cover() -> Result<(), ScraperError> {
        let html = r#"<div class="novel-body"><h2>Martial World</h2><dl><dt>Author:</dt><dd>Cocooned Cow</dd></dl></div>"#;
        let metadata = adapter(LISTING, 1, 1)?.resolve_metadata(html, &FakeFetcher::new())?;
        assert!(metadata.cover.is_empty());
        assert_eq!(metadata.description, "");
        Ok(())
    }

    #[test]
    fn extract_chapter_reads_title_and_content() -> Result<(), ScraperError> {
        let a = adapter(LISTING, 1, 1)?;
        let target = FetchTarget::chapter(a.chapter_url(1), "Chapter 1", Some(1));
        let html = r#"<div id="chapter-outer"><h4>Chapter 1 - Dreams</h4>
<div id="chapter-content"><p>Sky Fall Continent.</p><p>Lin Ming woke.</p></div></div>"#;
        let result = a.extract_chapter(html, &target);
        assert!(result.success);
        assert_eq!(result.title, "Chapter 1 - Dreams");
        assert_eq!(result.number, 1);
        assert_eq!(result.text, "Sky Fall Continent.\nLin Ming woke.");
        Ok(())
    }

    #[test]
    fn extract_chapter_without_title_uses_label() -> Result<(), ScraperError> {
        let a = adapter(LISTING, 1, 1)?;
        let target = FetchTarget::chapter(a.chapter_url(9), "Chapter 9", Some(9));
        let result = a.extract_chapter("<html><body><p>x</p></body></html>", &target);
        assert_eq!(result.title, "Chapter 9");
        assert!(!result.success);
        Ok(())
    }
}
