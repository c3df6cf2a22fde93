//! Book assembly: final chapter order and output naming.

use crate::model::{BookManifest, ChapterRange, ChapterResult, NovelMetadata};
use tracing::info;

/// Stable ascending sort by chapter number. Unnumbered chapters (`-1`) come first and
/// chapters sharing a number keep their discovery order.
pub fn sort_chapters(chapters: &mut [ChapterResult]) {
    chapters.sort_by_key(|c| c.number);
}

/// Sort the collected results and freeze them with the metadata into a manifest.
pub fn assemble(
    metadata: NovelMetadata,
    range: ChapterRange,
    mut chapters: Vec<ChapterResult>,
) -> BookManifest {
    sort_chapters(&mut chapters);
    let manifest = BookManifest::new(metadata, range, chapters);
    info!(
        chapters = manifest.chapters().len(),
        failed = manifest.failed_count(),
        "Assembled book"
    );
    manifest
}

/// `{Title_with_underscores}.Chapters{start}-{end}.{ext}`. Path separators in the title
/// are replaced too so the file always lands in the output directory.
pub fn output_file_name(title: &str, range: ChapterRange, ext: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    format!(
        "{}.Chapters{}-{}.{}",
        stem,
        range.start(),
        range.end(),
        ext
    )
}
