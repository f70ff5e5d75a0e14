use slide_common::{Deck, Slide, ThemeId};
use slide_export::{export_deck, file_name_for, write_deck, SLIDE_HEIGHT, SLIDE_WIDTH};
use std::io::{Cursor, Read};
use zip::ZipArchive;

fn renewable_energy_deck() -> Deck {
    let titles = [
        "Why Renewables Matter",
        "Solar Power",
        "Wind Energy",
        "Storage and the Grid",
        "Investment Trends",
    ];
    Deck {
        title: "Renewable Energy".into(),
        theme: ThemeId::Skywave,
        slides: titles
            .iter()
            .enumerate()
            .map(|(i, title)| Slide {
                title: title.to_string(),
                content: vec![
                    "Costs keep falling".into(),
                    "Adoption is accelerating".into(),
                    "Policy support matters".into(),
                ],
                image_prompt: format!("renewable energy {title}"),
                image_url: Some(format!("https://placehold.co/800x450/eab308/ffffff?text=Img{i}")),
            })
            .collect(),
    }
}

fn read_part(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
    let mut text = String::new();
    archive
        .by_name(name)
        .unwrap_or_else(|e| panic!("missing {name}: {e}"))
        .read_to_string(&mut text)
        .unwrap();
    text
}

#[test]
fn five_slide_deck_exports_six_slides() {
    let bytes = export_deck(&renewable_energy_deck()).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

    let slide_parts = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .count();
    assert_eq!(slide_parts, 6);

    let presentation = read_part(&mut archive, "ppt/presentation.xml");
    assert_eq!(presentation.matches("<p:sldId ").count(), 6);
    assert!(presentation.contains(&format!(r#"<p:sldSz cx="{SLIDE_WIDTH}" cy="{SLIDE_HEIGHT}"/>"#)));
    assert_eq!(SLIDE_WIDTH * 9, SLIDE_HEIGHT * 16);

    let closing = read_part(&mut archive, "ppt/slides/slide6.xml");
    assert!(closing.contains("Thank You!"));

    // index 4 carries three bullets, so it becomes the chart slide
    let chart = read_part(&mut archive, "ppt/slides/slide5.xml");
    assert!(chart.contains("<a:t>Q4</a:t>"));
    assert!(!chart.contains("Costs keep falling"));
    assert!(chart.contains("<a:t>5/5</a:t>"));

    let first_rels = read_part(&mut archive, "ppt/slides/_rels/slide1.xml.rels");
    assert!(first_rels.contains("text=Img0"));
    assert!(first_rels.contains(r#"TargetMode="External""#));

    let content_types = read_part(&mut archive, "[Content_Types].xml");
    assert!(content_types.contains("/ppt/slides/slide6.xml"));
}

#[test]
fn theme_colours_reach_every_slide() {
    let mut deck = renewable_energy_deck();
    deck.theme = ThemeId::Midnight;
    let bytes = export_deck(&deck).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    for n in 1..=6 {
        let xml = read_part(&mut archive, &format!("ppt/slides/slide{n}.xml"));
        assert!(xml.contains(r#"<a:srgbClr val="1A1A2E"/>"#), "slide {n}");
    }
}

#[test]
fn write_deck_uses_title_based_name() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("decks");
    let path = write_deck(&renewable_energy_deck(), &out).unwrap();
    assert_eq!(path, out.join("Renewable_Energy_Presentation.pptx"));
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some(file_name_for("Renewable Energy").as_str())
    );
    let bytes = std::fs::read(&path).unwrap();
    assert!(ZipArchive::new(Cursor::new(bytes)).is_ok());
}

#[test]
fn empty_deck_still_has_closing_slide() {
    let deck = Deck {
        title: "Empty".into(),
        theme: ThemeId::Light,
        slides: Vec::new(),
    };
    let bytes = export_deck(&deck).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert!(read_part(&mut archive, "ppt/slides/slide1.xml").contains("Thank You!"));
}
