//! DrawingML shape tree for one slide.

use std::fmt::Write as FmtWrite;

use crate::ExportError;

/// EMU per hundredth of an inch (914400 EMU = 1 inch).
const EMU_PER_HUNDREDTH: i64 = 9144;

/// Position and size in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    /// Build a frame from hundredths of an inch.
    pub(crate) const fn inches(x: i64, y: i64, w: i64, h: i64) -> Self {
        Self {
            x: x * EMU_PER_HUNDREDTH,
            y: y * EMU_PER_HUNDREDTH,
            cx: w * EMU_PER_HUNDREDTH,
            cy: h * EMU_PER_HUNDREDTH,
        }
    }

    pub(crate) const fn offset(self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx * EMU_PER_HUNDREDTH,
            y: self.y + dy * EMU_PER_HUNDREDTH,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn as_attr(self) -> &'static str {
        match self {
            Align::Left => "l",
            Align::Center => "ctr",
            Align::Right => "r",
        }
    }
}

/// Run formatting shared by every paragraph of a text box.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextStyle<'a> {
    /// Points.
    pub size: u32,
    pub bold: bool,
    /// Bare `RRGGBB`.
    pub color: &'a str,
    pub align: Align,
    pub bullets: bool,
}

impl<'a> TextStyle<'a> {
    pub(crate) fn new(size: u32, color: &'a str) -> Self {
        Self {
            size,
            bold: false,
            color,
            align: Align::Left,
            bullets: false,
        }
    }

    pub(crate) fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub(crate) fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub(crate) fn bulleted(mut self) -> Self {
        self.bullets = true;
        self
    }
}

/// Escapes markup and drops characters XML 1.0 cannot carry at all.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c < '\u{20}' || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

/// Accumulates `<p:spTree>` children and the external image links they use.
#[derive(Debug)]
pub(crate) struct ShapeTree {
    xml: String,
    next_id: u32,
    images: Vec<String>,
}

impl ShapeTree {
    pub(crate) fn new() -> Self {
        Self {
            xml: String::with_capacity(4096),
            // id 1 is the group shape itself
            next_id: 2,
            images: Vec::new(),
        }
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn write_xfrm(&mut self, frame: Frame) -> Result<(), ExportError> {
        write!(
            self.xml,
            r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            frame.x, frame.y, frame.cx, frame.cy
        )?;
        Ok(())
    }

    pub(crate) fn text_box<S: AsRef<str>>(
        &mut self,
        frame: Frame,
        paragraphs: &[S],
        style: TextStyle<'_>,
    ) -> Result<(), ExportError> {
        let id = self.take_id();
        self.xml.push_str("<p:sp><p:nvSpPr>");
        write!(self.xml, r#"<p:cNvPr id="{id}" name="Text Box {id}"/>"#)?;
        self.xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>"#);
        self.write_xfrm(frame)?;
        self.xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#);
        self.xml.push_str(r#"<p:txBody><a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#);

        for text in paragraphs {
            write!(self.xml, r#"<a:p><a:pPr algn="{}""#, style.align.as_attr())?;
            if style.bullets {
                self.xml.push_str(r#" marL="285750" indent="-285750"><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/>"#);
            } else {
                self.xml.push_str("><a:buNone/>");
            }
            self.xml.push_str("</a:pPr><a:r>");
            write!(self.xml, r#"<a:rPr lang="en-US" sz="{}""#, style.size * 100)?;
            if style.bold {
                self.xml.push_str(r#" b="1""#);
            }
            write!(
                self.xml,
                r#" dirty="0"><a:solidFill><a:srgbClr val="{}"/></a:solidFill></a:rPr><a:t>{}</a:t></a:r></a:p>"#,
                style.color,
                escape_xml(text.as_ref())
            )?;
        }
        if paragraphs.is_empty() {
            self.xml.push_str(r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#);
        }

        self.xml.push_str("</p:txBody></p:sp>");
        Ok(())
    }

    /// Rectangle with optional fill and outline colours (bare hex).
    pub(crate) fn rect(
        &mut self,
        frame: Frame,
        fill: Option<&str>,
        outline: Option<&str>,
    ) -> Result<(), ExportError> {
        let id = self.take_id();
        self.xml.push_str("<p:sp><p:nvSpPr>");
        write!(self.xml, r#"<p:cNvPr id="{id}" name="Rectangle {id}"/>"#)?;
        self.xml.push_str("<p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>");
        self.write_xfrm(frame)?;
        self.xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
        match fill {
            Some(color) => write!(self.xml, r#"<a:solidFill><a:srgbClr val="{color}"/></a:solidFill>"#)?,
            None => self.xml.push_str("<a:noFill/>"),
        }
        match outline {
            Some(color) => write!(
                self.xml,
                r#"<a:ln w="19050"><a:solidFill><a:srgbClr val="{color}"/></a:solidFill></a:ln>"#
            )?,
            None => self.xml.push_str("<a:ln><a:noFill/></a:ln>"),
        }
        self.xml.push_str("</p:spPr></p:sp>");
        Ok(())
    }

    /// Picture linked to an external URL rather than embedded.
    pub(crate) fn linked_picture(
        &mut self,
        frame: Frame,
        url: &str,
        description: &str,
    ) -> Result<(), ExportError> {
        let id = self.take_id();
        self.images.push(url.to_string());
        // rId1 is the slide layout
        let rel_id = format!("rId{}", self.images.len() + 1);

        self.xml.push_str("<p:pic><p:nvPicPr>");
        write!(
            self.xml,
            r#"<p:cNvPr id="{id}" name="Picture {id}" descr="{}"/>"#,
            escape_xml(description)
        )?;
        self.xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#);
        write!(
            self.xml,
            r#"<p:blipFill><a:blip r:link="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#
        )?;
        self.xml.push_str("<p:spPr>");
        self.write_xfrm(frame)?;
        self.xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
        Ok(())
    }

    /// Shape XML and the image URLs in relationship order (`rId2`, `rId3`, ...).
    pub(crate) fn finish(self) -> (String, Vec<String>) {
        (self.xml, self.images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_converts_hundredths_of_inch() {
        let frame = Frame::inches(100, 50, 200, 25);
        assert_eq!(frame.x, 914400);
        assert_eq!(frame.y, 457200);
        assert_eq!(frame.cx, 1828800);
        assert_eq!(frame.offset(100, 0).x, 1828800);
    }

    #[test]
    fn text_is_escaped_and_ids_increase() {
        let mut tree = ShapeTree::new();
        let style = TextStyle::new(18, "333333").bulleted();
        tree.text_box(Frame::inches(0, 0, 100, 100), &["R&D <fast>"], style)
            .unwrap();
        tree.rect(Frame::inches(0, 0, 10, 10), Some("4F46E5"), None)
            .unwrap();
        let (xml, images) = tree.finish();
        assert!(xml.contains("R&amp;D &lt;fast&gt;"));
        assert!(xml.contains(r#"id="2""#));
        assert!(xml.contains(r#"id="3""#));
        assert!(xml.contains(r#"sz="1800""#));
        assert!(xml.contains("buChar"));
        assert!(images.is_empty());
    }

    #[test]
    fn pictures_are_linked_not_embedded() {
        let mut tree = ShapeTree::new();
        tree.linked_picture(Frame::inches(0, 0, 10, 10), "https://x.test/a?b=1&c=2", "a \"view\"")
            .unwrap();
        let (xml, images) = tree.finish();
        assert!(xml.contains(r#"r:link="rId2""#));
        assert!(!xml.contains("r:embed"));
        assert!(xml.contains("a &quot;view&quot;"));
        assert_eq!(images, vec!["https://x.test/a?b=1&c=2".to_string()]);
    }

    #[test]
    fn control_characters_are_dropped() {
        assert_eq!(escape_xml("bell\u{7}here\u{1}"), "bellhere");
        assert_eq!(escape_xml("a\tb\nc\r"), "a\tb\nc\r");
        assert_eq!(escape_xml("x\u{FFFE}\u{FFFF}y"), "xy");
        assert_eq!(escape_xml("café ✓"), "café ✓");
    }
}
