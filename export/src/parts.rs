//! Package parts that do not depend on slide content.

use slide_core::Palette;
use std::fmt::Write as FmtWrite;

use crate::shape::escape_xml;
use crate::ExportError;

pub(crate) const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub(crate) const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub(crate) const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub(crate) const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

/// 16:9 widescreen, 13.333" x 7.5".
pub const SLIDE_WIDTH: i64 = 12_192_000;
pub const SLIDE_HEIGHT: i64 = 6_858_000;

/// First id in `p:sldIdLst`; lower values are reserved.
const FIRST_SLIDE_ID: usize = 256;

/// One `<Relationship>` entry.
pub(crate) struct Relationship<'a> {
    pub id: String,
    pub kind: &'a str,
    pub target: &'a str,
    pub external: bool,
}

pub(crate) fn relationships_xml(rels: &[Relationship<'_>]) -> Result<String, ExportError> {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_HEADER);
    write!(xml, r#"<Relationships xmlns="{NS_PKG_RELS}">"#)?;
    for rel in rels {
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}""#,
            rel.id,
            rel.kind,
            escape_xml(rel.target)
        )?;
        if rel.external {
            xml.push_str(r#" TargetMode="External""#);
        }
        xml.push_str("/>");
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

pub(crate) fn content_types_xml(slide_count: usize) -> Result<String, ExportError> {
    let mut xml = String::with_capacity(1024 + slide_count * 160);
    xml.push_str(XML_HEADER);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#);
    xml.push_str(r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#);
    xml.push_str(r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#);
    xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
    xml.push_str(r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#);
    for n in 1..=slide_count {
        write!(
            xml,
            r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        )?;
    }
    xml.push_str("</Types>");
    Ok(xml)
}

pub(crate) fn root_rels_xml() -> Result<String, ExportError> {
    relationships_xml(&[
        Relationship {
            id: "rId1".into(),
            kind: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
            target: "ppt/presentation.xml",
            external: false,
        },
        Relationship {
            id: "rId2".into(),
            kind: "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
            target: "docProps/core.xml",
            external: false,
        },
        Relationship {
            id: "rId3".into(),
            kind: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties",
            target: "docProps/app.xml",
            external: false,
        },
    ])
}

pub(crate) fn core_props_xml(title: &str) -> Result<String, ExportError> {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_HEADER);
    write!(
        xml,
        concat!(
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{}</dc:title><dc:creator>WebMind AI</dc:creator></cp:coreProperties>"
        ),
        escape_xml(title)
    )?;
    Ok(xml)
}

pub(crate) fn app_props_xml(slide_count: usize) -> Result<String, ExportError> {
    let mut xml = String::with_capacity(256);
    xml.push_str(XML_HEADER);
    write!(
        xml,
        r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>slide</Application><Slides>{slide_count}</Slides></Properties>"#
    )?;
    Ok(xml)
}

/// `ppt/presentation.xml`; the master is `rId1`, slides follow from `rId2`.
pub(crate) fn presentation_xml(slide_count: usize) -> Result<String, ExportError> {
    let mut xml = String::with_capacity(1024 + slide_count * 48);
    xml.push_str(XML_HEADER);
    write!(
        xml,
        r#"<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1">"#
    )?;
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
    xml.push_str("<p:sldIdLst>");
    for i in 0..slide_count {
        write!(
            xml,
            r#"<p:sldId id="{}" r:id="rId{}"/>"#,
            FIRST_SLIDE_ID + i,
            i + 2
        )?;
    }
    xml.push_str("</p:sldIdLst>");
    write!(
        xml,
        r#"<p:sldSz cx="{SLIDE_WIDTH}" cy="{SLIDE_HEIGHT}"/><p:notesSz cx="6858000" cy="9144000"/>"#
    )?;
    xml.push_str("</p:presentation>");
    Ok(xml)
}

pub(crate) fn presentation_rels_xml(slide_count: usize) -> Result<String, ExportError> {
    let targets: Vec<String> = (1..=slide_count)
        .map(|n| format!("slides/slide{n}.xml"))
        .collect();
    let mut rels = vec![Relationship {
        id: "rId1".into(),
        kind: REL_SLIDE_MASTER,
        target: "slideMasters/slideMaster1.xml",
        external: false,
    }];
    rels.extend(targets.iter().enumerate().map(|(i, target)| Relationship {
        id: format!("rId{}", i + 2),
        kind: REL_SLIDE,
        target,
        external: false,
    }));
    rels.push(Relationship {
        id: format!("rId{}", slide_count + 2),
        kind: REL_THEME,
        target: "theme/theme1.xml",
        external: false,
    });
    relationships_xml(&rels)
}

const EMPTY_SHAPE_TREE: &str = concat!(
    r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
);

pub(crate) fn slide_master_xml() -> Result<String, ExportError> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_HEADER);
    write!(xml, r#"<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">"#)?;
    write!(xml, "<p:cSld>{EMPTY_SHAPE_TREE}</p:spTree></p:cSld>")?;
    xml.push_str(r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#);
    xml.push_str(r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#);
    xml.push_str("</p:sldMaster>");
    Ok(xml)
}

pub(crate) fn slide_master_rels_xml() -> Result<String, ExportError> {
    relationships_xml(&[
        Relationship {
            id: "rId1".into(),
            kind: REL_SLIDE_LAYOUT,
            target: "../slideLayouts/slideLayout1.xml",
            external: false,
        },
        Relationship {
            id: "rId2".into(),
            kind: REL_THEME,
            target: "../theme/theme1.xml",
            external: false,
        },
    ])
}

pub(crate) fn slide_layout_xml() -> Result<String, ExportError> {
    let mut xml = String::with_capacity(768);
    xml.push_str(XML_HEADER);
    write!(
        xml,
        r#"<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" type="blank" preserve="1">"#
    )?;
    write!(xml, r#"<p:cSld name="Blank">{EMPTY_SHAPE_TREE}</p:spTree></p:cSld>"#)?;
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>");
    Ok(xml)
}

pub(crate) fn slide_layout_rels_xml() -> Result<String, ExportError> {
    relationships_xml(&[Relationship {
        id: "rId1".into(),
        kind: REL_SLIDE_MASTER,
        target: "../slideMasters/slideMaster1.xml",
        external: false,
    }])
}

/// Theme part whose colour scheme mirrors the deck palette.
pub(crate) fn theme_xml(name: &str, palette: &Palette) -> Result<String, ExportError> {
    let bg = Palette::bare(palette.background);
    let text = Palette::bare(palette.text);
    let accent = Palette::bare(palette.accent);

    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_HEADER);
    write!(xml, r#"<a:theme xmlns:a="{NS_A}" name="{}">"#, escape_xml(name))?;
    write!(xml, r#"<a:themeElements><a:clrScheme name="{}">"#, escape_xml(name))?;
    write!(
        xml,
        concat!(
            r#"<a:dk1><a:srgbClr val="{text}"/></a:dk1><a:lt1><a:srgbClr val="{bg}"/></a:lt1>"#,
            r#"<a:dk2><a:srgbClr val="{text}"/></a:dk2><a:lt2><a:srgbClr val="{bg}"/></a:lt2>"#,
            r#"<a:accent1><a:srgbClr val="{accent}"/></a:accent1><a:accent2><a:srgbClr val="{accent}"/></a:accent2>"#,
            r#"<a:accent3><a:srgbClr val="{accent}"/></a:accent3><a:accent4><a:srgbClr val="{accent}"/></a:accent4>"#,
            r#"<a:accent5><a:srgbClr val="{accent}"/></a:accent5><a:accent6><a:srgbClr val="{accent}"/></a:accent6>"#,
            r#"<a:hlink><a:srgbClr val="{accent}"/></a:hlink><a:folHlink><a:srgbClr val="{accent}"/></a:folHlink>"#,
        ),
        text = text,
        bg = bg,
        accent = accent
    )?;
    xml.push_str("</a:clrScheme>");
    xml.push_str(concat!(
        r#"<a:fontScheme name="Office">"#,
        r#"<a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
        r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
        "</a:fontScheme>",
        r#"<a:fmtScheme name="Office"><a:fillStyleLst>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
        "</a:fillStyleLst><a:lnStyleLst>",
        r#"<a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
        r#"<a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
        r#"<a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
        "</a:lnStyleLst><a:effectStyleLst>",
        "<a:effectStyle><a:effectLst/></a:effectStyle>",
        "<a:effectStyle><a:effectLst/></a:effectStyle>",
        "<a:effectStyle><a:effectLst/></a:effectStyle>",
        "</a:effectStyleLst><a:bgFillStyleLst>",
        r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
        "</a:bgFillStyleLst></a:fmtScheme>",
        "</a:themeElements></a:theme>",
    ));
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slide_common::ThemeId;
    use slide_core::colors_for;

    #[test]
    fn presentation_lists_every_slide_in_order() {
        let xml = presentation_xml(3).unwrap();
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId2"/>"#));
        assert!(xml.contains(r#"<p:sldId id="258" r:id="rId4"/>"#));
        assert!(xml.contains(r#"cx="12192000" cy="6858000""#));

        let rels = presentation_rels_xml(3).unwrap();
        assert!(rels.contains(r#"Id="rId4""#));
        assert!(rels.contains(r#"Id="rId5""#) && rels.contains("theme1.xml"));
    }

    #[test]
    fn external_targets_are_marked() {
        let xml = relationships_xml(&[Relationship {
            id: "rId2".into(),
            kind: REL_IMAGE,
            target: "https://a.test/i?x=1&y=2",
            external: true,
        }])
        .unwrap();
        assert!(xml.contains(r#"TargetMode="External""#));
        assert!(xml.contains("x=1&amp;y=2"));
    }

    #[test]
    fn theme_uses_palette_colours() {
        let xml = theme_xml("midnight", &colors_for(ThemeId::Midnight)).unwrap();
        assert!(xml.contains(r#"<a:lt1><a:srgbClr val="1A1A2E"/></a:lt1>"#));
        assert!(xml.contains(r#"<a:accent1><a:srgbClr val="E94560"/></a:accent1>"#));
    }
}
