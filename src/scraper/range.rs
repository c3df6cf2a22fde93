//! Chapter range validation and page arithmetic for page-paginated listings.

use crate::model::ChapterRange;
use crate::scraper::error::ScraperError;
use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

/// Chapters per listing page on page-paginated sites.
pub const PAGE_SIZE: i64 = 50;

/// Highest chapter whose listing page still fits a `u32` page number.
pub const MAX_CHAPTER: i64 = PAGE_SIZE * u32::MAX as i64;

/// Most chapters one run may request. Targets are built up front, one per chapter.
pub const MAX_RANGE_LEN: i64 = 100_000;

impl ChapterRange {
    /// Validate a requested range: `start >= 1`, `end >= start`, `end <= MAX_CHAPTER`
    /// and at most `MAX_RANGE_LEN` chapters.
    pub fn new(start: i64, end: i64) -> Result<Self, ScraperError> {
        if start < 1 {
            return Err(ScraperError::InvalidStartChapter { start });
        }
        if end < start {
            return Err(ScraperError::InvalidEndChapter { start, end });
        }
        if page_of(end).is_none() {
            return Err(ScraperError::ChapterBeyondLimit {
                chapter: end,
                max: MAX_CHAPTER,
            });
        }
        if end - start >= MAX_RANGE_LEN {
            return Err(ScraperError::RangeTooLarge {
                start,
                end,
                max: MAX_RANGE_LEN,
            });
        }
        Ok(Self { start, end })
    }

    /// Listing pages covering this range, `[page(start), page(end)]`.
    pub fn pages(&self) -> RangeInclusive<u32> {
        // `new` rejects any end whose page does not fit.
        let first = page_of(self.start).unwrap_or(u32::MAX);
        let last = page_of(self.end).unwrap_or(u32::MAX);
        first..=last
    }
}

/// 1-based listing page holding chapter `n` (n >= 1). A chapter on a page boundary
/// (e.g. 51) belongs to the page that starts with it. `None` when the page number
/// does not fit a `u32`.
pub fn page_of(n: i64) -> Option<u32> {
    u32::try_from((n - 1).div_euclid(PAGE_SIZE) + 1).ok()
}

/// First run of ASCII digits in a label.
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("chapter number pattern compiles"));

/// First run of digits in a chapter label, e.g. "Chapter 12: Return" -> 12. A run too
/// long for `i64` saturates to `i64::MAX` so it still counts as numbered.
pub fn chapter_number_from_label(label: &str) -> Option<i64> {
    NUMBER_RE
        .find(label)
        .map(|m| m.as_str().parse().unwrap_or(i64::MAX))
}

/// Listing filter: unnumbered labels are always kept, numbered ones only inside the range.
pub fn keep_label(range: &ChapterRange, label: &str) -> bool {
    match chapter_number_from_label(label) {
        Some(n) => range.contains(n),
        None => true,
    }
}
