//! Slide part rendering. Geometry is in hundredths of an inch on a 13.33" x 7.5" page.

use slide_common::Slide;
use slide_core::layout::{numbered, split_columns, CHART_SERIES};
use slide_core::{LayoutKind, Palette, SlideLayout};
use std::fmt::Write as FmtWrite;

use crate::parts::{relationships_xml, Relationship, REL_IMAGE, REL_SLIDE_LAYOUT, XML_HEADER};
use crate::shape::{Align, Frame, ShapeTree, TextStyle};
use crate::ExportError;

const TITLE: Frame = Frame::inches(50, 40, 1233, 100);
const TITLE_RULE: Frame = Frame::inches(50, 140, 200, 5);
const BODY_LEFT: Frame = Frame::inches(50, 170, 720, 470);
const IMAGE_RIGHT: Frame = Frame::inches(820, 170, 460, 345);
const COLUMN_LEFT: Frame = Frame::inches(50, 170, 600, 290);
const COLUMN_RIGHT: Frame = Frame::inches(683, 170, 600, 290);
const IMAGE_BELOW: Frame = Frame::inches(492, 470, 350, 197);
const PANEL: Frame = Frame::inches(50, 170, 720, 470);
const PANEL_TEXT: Frame = Frame::inches(75, 190, 670, 430);
const IMAGE_FRAMED: Frame = Frame::inches(830, 180, 420, 315);
const FOOTER_BRAND: Frame = Frame::inches(50, 690, 400, 40);
const FOOTER_PAGE: Frame = Frame::inches(1083, 690, 200, 40);

const TITLE_SIZE: u32 = 36;
const BODY_SIZE: u32 = 18;
const FOOTER_SIZE: u32 = 12;

const BRANDING: &str = "WebMind AI";
pub(crate) const CLOSING_TEXT: &str = "Thank You!";

/// Chart plot area: bars stand on `CHART_BASELINE`, a value of 100 is `CHART_HEIGHT` tall.
const CHART_LEFT: i64 = 200;
const CHART_BASELINE: i64 = 600;
const CHART_HEIGHT: i64 = 380;
const CHART_BAR_WIDTH: i64 = 160;
const CHART_BAR_STEP: i64 = 260;

/// A rendered slide part and its relationships part.
pub(crate) struct SlidePart {
    pub xml: String,
    pub rels: String,
}

struct Colors<'a> {
    background: &'a str,
    text: &'a str,
    accent: &'a str,
}

impl<'a> From<&'a Palette> for Colors<'a> {
    fn from(palette: &'a Palette) -> Self {
        Self {
            background: Palette::bare(palette.background),
            text: Palette::bare(palette.text),
            accent: Palette::bare(palette.accent),
        }
    }
}

/// Content slide `index` of `total`.
pub(crate) fn render_slide(
    slide: &Slide,
    index: usize,
    total: usize,
    palette: &Palette,
) -> Result<SlidePart, ExportError> {
    let colors = Colors::from(palette);
    let mut tree = ShapeTree::new();

    tree.text_box(
        TITLE,
        &[slide.title.as_str()],
        TextStyle::new(TITLE_SIZE, colors.accent).bold(),
    )?;
    tree.rect(TITLE_RULE, Some(colors.accent), None)?;

    match SlideLayout::for_slide(index, slide) {
        SlideLayout::Chart => draw_chart(&mut tree, &colors)?,
        SlideLayout::Standard(kind) => draw_content(&mut tree, slide, kind, &colors)?,
    }

    tree.text_box(
        FOOTER_BRAND,
        &[BRANDING],
        TextStyle::new(FOOTER_SIZE, colors.accent).bold(),
    )?;
    tree.text_box(
        FOOTER_PAGE,
        &[format!("{}/{total}", index + 1)],
        TextStyle::new(FOOTER_SIZE, colors.text).align(Align::Right),
    )?;

    finish(tree, colors.background)
}

/// Closing slide appended after the last content slide.
pub(crate) fn render_closing(palette: &Palette) -> Result<SlidePart, ExportError> {
    let colors = Colors::from(palette);
    let mut tree = ShapeTree::new();
    tree.text_box(
        Frame::inches(0, 300, 1333, 150),
        &[CLOSING_TEXT],
        TextStyle::new(48, colors.accent).bold().align(Align::Center),
    )?;
    finish(tree, colors.background)
}

fn draw_content(
    tree: &mut ShapeTree,
    slide: &Slide,
    kind: LayoutKind,
    colors: &Colors<'_>,
) -> Result<(), ExportError> {
    let bullets = TextStyle::new(BODY_SIZE, colors.text).bulleted();
    let image = slide.image_url.as_deref();

    match kind {
        LayoutKind::ContentWithImage => {
            tree.text_box(BODY_LEFT, &slide.content, bullets)?;
            if let Some(url) = image {
                tree.linked_picture(IMAGE_RIGHT, url, &slide.image_prompt)?;
            }
        }
        LayoutKind::TwoColumn => {
            let (left, right) = split_columns(&slide.content);
            tree.text_box(COLUMN_LEFT, left, bullets)?;
            tree.text_box(COLUMN_RIGHT, right, bullets)?;
            if let Some(url) = image {
                tree.linked_picture(IMAGE_BELOW, url, &slide.image_prompt)?;
            }
        }
        LayoutKind::NumberedPanel => {
            tree.rect(PANEL, None, Some(colors.accent))?;
            tree.text_box(
                PANEL_TEXT,
                &numbered(&slide.content),
                TextStyle::new(BODY_SIZE, colors.text),
            )?;
            if let Some(url) = image {
                tree.rect(IMAGE_FRAMED.offset(15, 15), Some(colors.accent), None)?;
                tree.linked_picture(IMAGE_FRAMED, url, &slide.image_prompt)?;
            }
        }
    }
    Ok(())
}

fn draw_chart(tree: &mut ShapeTree, colors: &Colors<'_>) -> Result<(), ExportError> {
    let max = CHART_SERIES.iter().map(|(_, v)| *v).max().unwrap_or(1).max(100);
    let axis_width = CHART_BAR_STEP * CHART_SERIES.len() as i64;
    tree.rect(
        Frame::inches(CHART_LEFT - 30, CHART_BASELINE, axis_width, 2),
        Some(colors.text),
        None,
    )?;

    for (i, (label, value)) in CHART_SERIES.iter().enumerate() {
        let x = CHART_LEFT + CHART_BAR_STEP * i as i64;
        let height = (*value as i64 * CHART_HEIGHT) / max as i64;
        let top = CHART_BASELINE - height;
        tree.rect(
            Frame::inches(x, top, CHART_BAR_WIDTH, height),
            Some(colors.accent),
            None,
        )?;
        tree.text_box(
            Frame::inches(x - 20, top - 45, CHART_BAR_WIDTH + 40, 40),
            &[value.to_string()],
            TextStyle::new(14, colors.text).bold().align(Align::Center),
        )?;
        tree.text_box(
            Frame::inches(x - 20, CHART_BASELINE + 10, CHART_BAR_WIDTH + 40, 40),
            &[*label],
            TextStyle::new(14, colors.text).align(Align::Center),
        )?;
    }
    Ok(())
}

fn finish(tree: ShapeTree, background: &str) -> Result<SlidePart, ExportError> {
    let (shapes, images) = tree.finish();

    let mut xml = String::with_capacity(shapes.len() + 1024);
    xml.push_str(XML_HEADER);
    xml.push_str(concat!(
        r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
        r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#,
    ));
    write!(
        xml,
        r#"<p:cSld><p:bg><p:bgPr><a:solidFill><a:srgbClr val="{background}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#
    )?;
    xml.push_str(concat!(
        r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
        r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
    ));
    xml.push_str(&shapes);
    xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");

    let mut rels = vec![Relationship {
        id: "rId1".into(),
        kind: REL_SLIDE_LAYOUT,
        target: "../slideLayouts/slideLayout1.xml",
        external: false,
    }];
    rels.extend(images.iter().enumerate().map(|(i, url)| Relationship {
        id: format!("rId{}", i + 2),
        kind: REL_IMAGE,
        target: url,
        external: true,
    }));

    Ok(SlidePart {
        xml,
        rels: relationships_xml(&rels)?,
    })
}
