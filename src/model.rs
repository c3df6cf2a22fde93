//! Data model threaded through the pipeline: novel metadata, fetch targets, per-chapter
//! results, and the frozen manifest handed to the package writer.

use serde::Serialize;
use std::fmt;

/// Chapter number used when a label carries no parsable number. Such chapters are never dropped.
pub const UNNUMBERED: i64 = -1;

/// Metadata resolved once from the novel's listing page.
#[derive(Debug, Clone, Serialize)]
pub struct NovelMetadata {
    pub title: String,
    pub author: String,
    pub description: String,
    /// Raw cover image bytes. Empty when the listing page has no cover element.
    #[serde(skip)]
    pub cover: Vec<u8>,
    /// Listing URL the metadata was read from. Used as the package identifier.
    #[serde(rename = "sourceUrl")]
    pub source_url: String,
}

/// Inclusive, 1-based chapter-number interval requested by the caller.
///
/// Only constructible through [ChapterRange::new](crate::scraper::ChapterRange), which enforces
/// `start >= 1` and `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChapterRange {
    pub(crate) start: i64,
    pub(crate) end: i64,
}

impl ChapterRange {
    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Whether a chapter number falls inside the interval.
    pub fn contains(&self, number: i64) -> bool {
        self.start <= number && number <= self.end
    }
}

impl fmt::Display for ChapterRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Where a fetch target points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// One listing page of a page-paginated site (1-based).
    Page(u32),
    /// One chapter document.
    Chapter(String),
}

/// A unit of fetch work plus the chapter-number hint taken from its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub locator: Locator,
    pub label: String,
    pub number: Option<i64>,
}

impl FetchTarget {
    pub fn page(page: u32) -> Self {
        Self {
            locator: Locator::Page(page),
            label: format!("Page {}", page),
            number: None,
        }
    }

    pub fn chapter(url: impl Into<String>, label: impl Into<String>, number: Option<i64>) -> Self {
        Self {
            locator: Locator::Chapter(url.into()),
            label: label.into(),
            number,
        }
    }

    /// Chapter number for results built from this target, [UNNUMBERED] when unknown.
    pub fn chapter_number(&self) -> i64 {
        self.number.unwrap_or(UNNUMBERED)
    }

    /// Chapter URL, if this target points at a chapter document.
    pub fn url(&self) -> Option<&str> {
        match &self.locator {
            Locator::Chapter(url) => Some(url),
            Locator::Page(_) => None,
        }
    }
}

/// Outcome of fetching and extracting one chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterResult {
    pub number: i64,
    pub title: String,
    /// Extracted text, one paragraph per line, or a placeholder when `success` is false.
    pub text: String,
    pub url: String,
    pub success: bool,
}

impl ChapterResult {
    pub fn extracted(
        number: i64,
        title: impl Into<String>,
        text: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            number,
            title: title.into(),
            text: text.into(),
            url: url.into(),
            success: true,
        }
    }

    pub fn failed(
        number: i64,
        title: impl Into<String>,
        placeholder: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            number,
            title: title.into(),
            text: placeholder.into(),
            url: url.into(),
            success: false,
        }
    }
}

/// Metadata plus chapters in final reading order. Frozen once assembled.
#[derive(Debug, Clone, Serialize)]
pub struct BookManifest {
    metadata: NovelMetadata,
    range: ChapterRange,
    chapters: Vec<ChapterResult>,
}

impl BookManifest {
    /// Callers must pass chapters already in reading order; see [crate::assemble].
    pub(crate) fn new(
        metadata: NovelMetadata,
        range: ChapterRange,
        chapters: Vec<ChapterResult>,
    ) -> Self {
        Self {
            metadata,
            range,
            chapters,
        }
    }

    pub fn metadata(&self) -> &NovelMetadata {
        &self.metadata
    }

    pub fn range(&self) -> ChapterRange {
        self.range
    }

    pub fn chapters(&self) -> &[ChapterResult] {
        &self.chapters
    }

    pub fn failed_count(&self) -> usize {
        self.chapters.iter().filter(|c| !c.success).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn sample_manifest() -> BookManifest {
        BookManifest::new(
            NovelMetadata {
                title: "Martial World".to_string(),
                author: "Cocooned Cow".to_string(),
                description: "Lin Ming's path of martial arts.".to_string(),
                cover: vec![0x89, b'P', b'N', b'G'],
                source_url: "https://www.wuxiaworld.com/novel/martial-world".to_string(),
            },
            ChapterRange { start: 1, end: 2 },
            vec![
                ChapterResult::extracted(1, "Chapter 1", "First line.\nSecond line.", "u1"),
                ChapterResult::failed(2, "Chapter 2", "placeholder", "u2"),
            ],
        )
    }

    #[test]
    fn manifest_serializes_without_cover_bytes() -> Result<(), Box<dyn Error>> {
        let json = serde_json::to_string(&sample_manifest())?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        let metadata = value
            .get("metadata")
            .and_then(|m| m.as_object())
            .ok_or("metadata must be an object")?;
        assert_eq!(metadata["title"].as_str(), Some("Martial World"));
        assert!(!metadata.contains_key("cover"));
        assert_eq!(
            metadata["sourceUrl"].as_str(),
            Some("https://www.wuxiaworld.com/novel/martial-world")
        );
        let chapters = value["chapters"].as_array().ok_or("chapters must be array")?;
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[1]["success"].as_bool(), Some(false));
        Ok(())
    }

    #[test]
    fn failed_count_counts_placeholders() {
        assert_eq!(sample_manifest().failed_count(), 1);
    }

    #[test]
    fn target_without_hint_uses_sentinel() {
        let target = FetchTarget::chapter("https://novelfull.com/x.html", "Prologue", None);
        assert_eq!(target.chapter_number(), UNNUMBERED);
        assert_eq!(target.url(), Some("https://novelfull.com/x.html"));
        assert_eq!(FetchTarget::page(3).url(), None);
    }

    #[test]
    fn range_contains_is_inclusive() {
        let range = ChapterRange { start: 5, end: 7 };
        assert!(!range.contains(4));
        assert!(range.contains(5));
        assert!(range.contains(7));
        assert!(!range.contains(8));
        assert_eq!(range.to_string(), "5-7");
    }
}
