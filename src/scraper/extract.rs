//! HTML helpers shared by the site adapters: selector parsing, metadata lookups, and chapter
//! content extraction with a whole-document fallback.

use crate::model::ChapterResult;
use crate::scraper::error::ScraperError;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::warn;

/// Body used when neither the content container nor the whole document yields text.
pub const EXTRACTION_FAILED_TEXT: &str =
    "novelscraper failed to scrape the contents of this chapter.";

static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("paragraph selector parses"));

/// Parse a CSS selector, mapping a parse failure to [ScraperError::InvalidSelector].
pub fn parse_selector(sel: &str) -> Result<Selector, ScraperError> {
    Selector::parse(sel).map_err(|e| ScraperError::InvalidSelector {
        selector: sel.to_string(),
        reason: e.to_string(),
    })
}

/// Trimmed text of an element.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Trimmed text of the first element matching `sel`, if non-empty.
pub fn first_text(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

/// Find the element matching `label` whose text is exactly `text`, then return its first
/// following sibling element named `sibling`. E.g. `<dt>Author:</dt><dd>Name</dd>`.
pub fn sibling_after_label<'a>(
    doc: &'a Html,
    label: &Selector,
    text: &str,
    sibling: &str,
) -> Option<ElementRef<'a>> {
    let label_el = doc.select(label).find(|el| element_text(*el) == text)?;
    label_el
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == sibling)
}

/// Non-empty paragraph texts under `root`, in document order.
pub fn paragraphs(root: ElementRef<'_>) -> Vec<String> {
    root.select(&PARAGRAPH)
        .map(element_text)
        .filter(|s| !s.is_empty())
        .collect()
}

/// How chapter text was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Paragraphs from the content container.
    Primary(String),
    /// Container was missing or held at most one paragraph; paragraphs from the whole document.
    Fallback(String),
    /// At most one paragraph anywhere in the document.
    Empty,
}

/// Collect paragraphs from the first `container` match, falling back to the whole document
/// when that yields at most one paragraph. Lines are joined with `\n`.
pub fn extract_text(doc: &Html, container: &Selector) -> Extraction {
    let primary = doc
        .select(container)
        .next()
        .map(paragraphs)
        .unwrap_or_default();
    if primary.len() > 1 {
        return Extraction::Primary(primary.join("\n"));
    }
    let whole = paragraphs(doc.root_element());
    if whole.len() > 1 {
        Extraction::Fallback(whole.join("\n"))
    } else {
        Extraction::Empty
    }
}

/// Turn an extraction into a chapter result. An empty extraction is a soft failure:
/// the result carries the fixed placeholder and `success = false`.
pub fn into_chapter_result(
    extraction: Extraction,
    number: i64,
    title: String,
    url: &str,
) -> ChapterResult {
    match extraction {
        Extraction::Primary(text) => ChapterResult::extracted(number, title, text, url),
        Extraction::Fallback(text) => {
            warn!(
                chapter = %title,
                %url,
                "Content container was empty; using paragraphs from the whole page"
            );
            ChapterResult::extracted(number, title, text, url)
        }
        Extraction::Empty => {
            warn!(chapter = %title, %url, "Could not find chapter content");
            ChapterResult::failed(number, title, EXTRACTION_FAILED_TEXT, url)
        }
    }
}
