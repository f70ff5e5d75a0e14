//! Writes a [`Deck`] as a PowerPoint (`.pptx`) package.
//!
//! Every content slide is laid out with [`slide_core::SlideLayout`], the same
//! rule the terminal preview uses, followed by a closing "Thank You!" slide.
//! Images are linked by URL, not downloaded.

mod parts;
mod shape;
mod slide;

use regex::Regex;
use slide_common::Deck;
use slide_core::colors_for;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info};
use zip::write::{SimpleFileOptions, ZipWriter};

pub use parts::{SLIDE_HEIGHT, SLIDE_WIDTH};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build XML: {0}")]
    Xml(#[from] std::fmt::Error),
}

/// Appended to the sanitized deck title.
pub const FILE_SUFFIX: &str = "_Presentation.pptx";

#[allow(clippy::unwrap_used)]
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// `"Renewable Energy"` becomes `Renewable_Energy_Presentation.pptx`.
///
/// Path separators are replaced as well so the name always stays inside the
/// output directory.
pub fn file_name_for(title: &str) -> String {
    let stem = WHITESPACE.replace_all(title, "_").replace(['/', '\\'], "_");
    let stem = if stem.is_empty() { "Untitled" } else { stem.as_str() };
    format!("{stem}{FILE_SUFFIX}")
}

/// Number of slide parts an export of `deck` contains.
pub fn exported_slide_count(deck: &Deck) -> usize {
    deck.slide_count() + 1
}

/// Zip package writer for OOXML parts.
struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl PackageWriter {
    fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated),
        }
    }

    fn add(&mut self, path: &str, content: &str) -> Result<(), ExportError> {
        self.zip.start_file(path, self.options)?;
        self.zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        Ok(self.zip.finish()?.into_inner())
    }
}

/// Render `deck` to the bytes of a `.pptx` file.
pub fn export_deck(deck: &Deck) -> Result<Vec<u8>, ExportError> {
    let palette = colors_for(deck.theme);
    let total = deck.slide_count();
    let part_count = exported_slide_count(deck);
    debug!(title = %deck.title, slides = total, theme = %deck.theme, "exporting deck");

    let mut package = PackageWriter::new();
    package.add("[Content_Types].xml", &parts::content_types_xml(part_count)?)?;
    package.add("_rels/.rels", &parts::root_rels_xml()?)?;
    package.add("docProps/core.xml", &parts::core_props_xml(&deck.title)?)?;
    package.add("docProps/app.xml", &parts::app_props_xml(part_count)?)?;
    package.add("ppt/presentation.xml", &parts::presentation_xml(part_count)?)?;
    package.add(
        "ppt/_rels/presentation.xml.rels",
        &parts::presentation_rels_xml(part_count)?,
    )?;
    package.add("ppt/slideMasters/slideMaster1.xml", &parts::slide_master_xml()?)?;
    package.add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &parts::slide_master_rels_xml()?,
    )?;
    package.add("ppt/slideLayouts/slideLayout1.xml", &parts::slide_layout_xml()?)?;
    package.add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        &parts::slide_layout_rels_xml()?,
    )?;
    package.add(
        "ppt/theme/theme1.xml",
        &parts::theme_xml(deck.theme.as_str(), &palette)?,
    )?;

    for (index, content) in deck.slides.iter().enumerate() {
        let part = slide::render_slide(content, index, total, &palette)?;
        write_slide(&mut package, index + 1, &part)?;
    }
    write_slide(&mut package, part_count, &slide::render_closing(&palette)?)?;

    package.finish()
}

fn write_slide(
    package: &mut PackageWriter,
    number: usize,
    part: &slide::SlidePart,
) -> Result<(), ExportError> {
    package.add(&format!("ppt/slides/slide{number}.xml"), &part.xml)?;
    package.add(&format!("ppt/slides/_rels/slide{number}.xml.rels"), &part.rels)
}

/// Export `deck` into `dir` (created if missing) and return the written path.
pub fn write_deck(deck: &Deck, dir: &Path) -> Result<PathBuf, ExportError> {
    let bytes = export_deck(deck)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name_for(&deck.title));
    std::fs::write(&path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "presentation written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_collapses_whitespace() {
        assert_eq!(
            file_name_for("Renewable Energy"),
            "Renewable_Energy_Presentation.pptx"
        );
        assert_eq!(file_name_for("A \t  B\nC"), "A_B_C_Presentation.pptx");
        assert_eq!(file_name_for(" Edge "), "_Edge__Presentation.pptx");
    }

    #[test]
    fn file_name_stays_in_directory() {
        assert_eq!(file_name_for("CI/CD"), "CI_CD_Presentation.pptx");
        assert_eq!(file_name_for(""), "Untitled_Presentation.pptx");
    }
}
