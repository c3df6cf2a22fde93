//! EPUB writer. Consumes a [BookManifest] and writes an EPUB 3 package (mimetype, container,
//! OPF, nav, NCX, optional cover, one document per chapter in manifest order).

use crate::model::{BookManifest, ChapterResult};
use std::io::{Seek, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{info, trace};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTAINER_XML: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<container version=\"1.0\" xmlns=\"urn:oasis:names:tc:opendocument:xmlns:container\">\n  <rootfiles>\n    <rootfile full-path=\"OEBPS/content.opf\" media-type=\"application/oebps-package+xml\"/>\n  </rootfiles>\n</container>";

const MIMETYPE: &[u8] = b"application/epub+zip";
const OEBPS_PREFIX: &str = "OEBPS/";

/// Errors from the EPUB writer. Maps to CLI exit code 3.
#[derive(Debug, Error)]
pub enum EpubError {
    #[error("Cannot write EPUB: novel title is empty.")]
    EmptyTitle,

    #[error("Cannot write EPUB: no chapters were found in the requested range.")]
    NoChapters,

    #[error("Failed to create EPUB file: {path}: {source}")]
    CreateFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write EPUB archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl From<std::io::Error> for EpubError {
    fn from(e: std::io::Error) -> Self {
        EpubError::Zip(zip::result::ZipError::Io(e))
    }
}

/// Cover image format, sniffed from the image's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CoverKind {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl CoverKind {
    fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"\x89PNG") {
            Some(CoverKind::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(CoverKind::Jpeg)
        } else if data.starts_with(b"GIF8") {
            Some(CoverKind::Gif)
        } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(CoverKind::Webp)
        } else {
            None
        }
    }

    fn ext(self) -> &'static str {
        match self {
            CoverKind::Png => "png",
            CoverKind::Jpeg => "jpg",
            CoverKind::Gif => "gif",
            CoverKind::Webp => "webp",
        }
    }

    fn media_type(self) -> &'static str {
        match self {
            CoverKind::Png => "image/png",
            CoverKind::Jpeg => "image/jpeg",
            CoverKind::Gif => "image/gif",
            CoverKind::Webp => "image/webp",
        }
    }
}

/// Cover image to embed, if the manifest has one. Unknown formats are embedded as PNG,
/// which is what the listing pages serve in practice.
fn cover_of(manifest: &BookManifest) -> Option<(&[u8], CoverKind)> {
    let data = manifest.metadata().cover.as_slice();
    if data.is_empty() {
        return None;
    }
    Some((data, CoverKind::sniff(data).unwrap_or(CoverKind::Png)))
}

/// Write a manifest to an EPUB file, replacing any existing file at `path`.
pub fn write_epub(manifest: &BookManifest, path: &Path) -> Result<(), EpubError> {
    validate_manifest(manifest)?;

    let file = std::fs::File::create(path).map_err(|e| EpubError::CreateFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_epub_to(manifest, file)?;
    info!(path = %path.display(), "Created EPUB file");
    Ok(())
}

/// Write the EPUB archive to any seekable writer.
pub fn write_epub_to<W: Write + Seek>(manifest: &BookManifest, writer: W) -> Result<(), EpubError> {
    validate_manifest(manifest)?;
    let mut zip = ZipWriter::new(writer);

    let options_stored = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);
    let options_deflate = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    // Mimetype first, uncompressed.
    zip.start_file("mimetype", options_stored)?;
    zip.write_all(MIMETYPE)?;

    zip.start_file("META-INF/container.xml", options_deflate)?;
    zip.write_all(CONTAINER_XML)?;

    let cover = cover_of(manifest);
    write_opf(manifest, cover.map(|(_, kind)| kind), &mut zip, options_deflate)?;
    write_nav_xhtml(manifest, &mut zip, options_deflate)?;
    write_ncx(manifest, &mut zip, options_deflate)?;
    if let Some((data, kind)) = cover {
        write_cover_xhtml(kind, &mut zip, options_deflate)?;
        zip.start_file(
            format!("{}images/cover.{}", OEBPS_PREFIX, kind.ext()),
            options_deflate,
        )?;
        zip.write_all(data)?;
    }
    write_chapters(manifest, &mut zip, options_deflate)?;

    zip.finish()?;
    Ok(())
}

fn validate_manifest(manifest: &BookManifest) -> Result<(), EpubError> {
    if manifest.metadata().title.trim().is_empty() {
        return Err(EpubError::EmptyTitle);
    }
    if manifest.chapters().is_empty() {
        return Err(EpubError::NoChapters);
    }
    Ok(())
}

fn chapter_file(i: usize) -> String {
    format!("chapter-{}.xhtml", i + 1)
}

fn write_opf(
    manifest: &BookManifest,
    cover: Option<CoverKind>,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let metadata = manifest.metadata();
    let id = xml_escape(&metadata.source_url);
    let title = xml_escape(&metadata.title);
    let creator = xml_escape(&metadata.author);

    let mut items = String::from(
        r#"    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
"#,
    );
    if let Some(kind) = cover {
        items.push_str(&format!(
            r#"    <item id="cover-img" href="images/cover.{}" media-type="{}" properties="cover-image"/>
    <item id="cover" href="cover.xhtml" media-type="application/xhtml+xml"/>
"#,
            kind.ext(),
            kind.media_type()
        ));
    }
    for i in 0..manifest.chapters().len() {
        items.push_str(&format!(
            r#"    <item id="chapter-{}" href="{}" media-type="application/xhtml+xml"/>
"#,
            i + 1,
            chapter_file(i)
        ));
    }

    // Reading order: cover, then chapters in manifest order.
    let mut spine = String::new();
    if cover.is_some() {
        spine.push_str("    <itemref idref=\"cover\" linear=\"no\"/>\n");
    }
    for i in 0..manifest.chapters().len() {
        spine.push_str(&format!("    <itemref idref=\"chapter-{}\"/>\n", i + 1));
    }

    let mut meta = format!(
        r#"    <dc:identifier id="book-id">{id}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:creator>{creator}</dc:creator>
    <dc:language>en</dc:language>
"#
    );
    if !metadata.description.trim().is_empty() {
        meta.push_str(&format!(
            "    <dc:description>{}</dc:description>\n",
            xml_escape(&metadata.description)
        ));
    }
    if cover.is_some() {
        meta.push_str("    <meta name=\"cover\" content=\"cover-img\"/>\n");
    }

    let opf = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" unique-identifier="book-id" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
{meta}  </metadata>
  <manifest>
{items}  </manifest>
  <spine toc="ncx">
{spine}  </spine>
</package>
"#
    );

    zip.start_file(format!("{}content.opf", OEBPS_PREFIX), options)?;
    zip.write_all(opf.as_bytes())?;
    Ok(())
}

fn write_nav_xhtml(
    manifest: &BookManifest,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let mut nav_links = String::new();
    for (i, ch) in manifest.chapters().iter().enumerate() {
        nav_links.push_str(&format!(
            "      <li><a href=\"{}\">{}</a></li>\n",
            chapter_file(i),
            xml_escape(&ch.title)
        ));
    }
    let nav = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
  <meta charset="UTF-8"/>
  <title>Table of Contents</title>
</head>
<body>
  <nav epub:type="toc">
    <h1>Contents</h1>
    <ol>
{nav_links}    </ol>
  </nav>
</body>
</html>
"#
    );
    zip.start_file(format!("{}nav.xhtml", OEBPS_PREFIX), options)?;
    zip.write_all(nav.as_bytes())?;
    Ok(())
}

fn write_ncx(
    manifest: &BookManifest,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let mut nav_points = String::new();
    for (i, ch) in manifest.chapters().iter().enumerate() {
        nav_points.push_str(&format!(
            r#"    <navPoint id="navpoint-{n}" playOrder="{n}">
      <navLabel><text>{label}</text></navLabel>
      <content src="{src}"/>
    </navPoint>
"#,
            n = i + 1,
            label = xml_escape(&ch.title),
            src = chapter_file(i)
        ));
    }
    let ncx = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{uid}"/>
  </head>
  <docTitle>
    <text>{title}</text>
  </docTitle>
  <navMap>
{nav_points}  </navMap>
</ncx>
"#,
        uid = xml_escape(&manifest.metadata().source_url),
        title = xml_escape(&manifest.metadata().title),
    );
    zip.start_file(format!("{}toc.ncx", OEBPS_PREFIX), options)?;
    zip.write_all(ncx.as_bytes())?;
    Ok(())
}

fn write_cover_xhtml(
    kind: CoverKind,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let cover_xhtml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <meta charset="UTF-8"/>
  <title>Cover</title>
</head>
<body>
  <div style="text-align: center;">
    <img src="images/cover.{}" alt="Cover" style="max-width: 100%; height: auto;"/>
  </div>
</body>
</html>
"#,
        kind.ext()
    );
    zip.start_file(format!("{}cover.xhtml", OEBPS_PREFIX), options)?;
    zip.write_all(cover_xhtml.as_bytes())?;
    Ok(())
}

/// Chapter body: `<h1>` title then one `<p>` per text line.
fn chapter_xhtml(chapter: &ChapterResult) -> String {
    let title = xml_escape(&chapter.title);
    let paragraphs: String = chapter
        .text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("  <p>{}</p>\n", xml_escape(line)))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" lang="en">
<head>
  <meta charset="UTF-8"/>
  <title>{title}</title>
</head>
<body>
  <h1>{title}</h1>
{paragraphs}</body>
</html>
"#
    )
}

fn write_chapters(
    manifest: &BookManifest,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    for (i, ch) in manifest.chapters().iter().enumerate() {
        trace!(number = ch.number, title = %ch.title, "Adding chapter to EPUB");
        zip.start_file(format!("{}{}", OEBPS_PREFIX, chapter_file(i)), options)?;
        zip.write_all(chapter_xhtml(ch).as_bytes())?;
    }
    Ok(())
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
