use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest slide count a caller may request.
pub const MIN_SLIDES: usize = 4;
/// Largest slide count a caller may request.
pub const MAX_SLIDES: usize = 10;

/// Raw slide content as returned by the text-generation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    pub slides: Vec<SlideDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDraft {
    pub title: String,
    pub content: Vec<String>,
    pub image_prompt: String,
}

/// A fully resolved presentation, ready for preview or export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub title: String,
    #[serde(default)]
    pub theme: ThemeId,
    pub slides: Vec<Slide>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub title: String,
    pub content: Vec<String>,
    pub image_prompt: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<SlideDraft> for Slide {
    fn from(draft: SlideDraft) -> Self {
        Self {
            title: draft.title,
            content: draft.content,
            image_prompt: draft.image_prompt,
            image_url: None,
        }
    }
}

impl Deck {
    /// Deck with every slide present but no image attached yet.
    pub fn from_outline(outline: Outline, theme: ThemeId) -> Self {
        Self {
            title: outline.title,
            theme,
            slides: outline.slides.into_iter().map(Slide::from).collect(),
        }
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Number of slides that already carry an image.
    pub fn images_attached(&self) -> usize {
        self.slides.iter().filter(|s| s.image_url.is_some()).count()
    }
}

/// Presentation colour theme.
///
/// Parsing never fails: an unrecognized name falls back to [`ThemeId::Light`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    #[default]
    Light,
    Dark,
    Midnight,
    Skywave,
    Mint,
    Sunset,
    Ocean,
    Forest,
    Royal,
}

impl ThemeId {
    pub const ALL: [ThemeId; 9] = [
        ThemeId::Light,
        ThemeId::Dark,
        ThemeId::Midnight,
        ThemeId::Skywave,
        ThemeId::Mint,
        ThemeId::Sunset,
        ThemeId::Ocean,
        ThemeId::Forest,
        ThemeId::Royal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeId::Light => "light",
            ThemeId::Dark => "dark",
            ThemeId::Midnight => "midnight",
            ThemeId::Skywave => "skywave",
            ThemeId::Mint => "mint",
            ThemeId::Sunset => "sunset",
            ThemeId::Ocean => "ocean",
            ThemeId::Forest => "forest",
            ThemeId::Royal => "royal",
        }
    }

    /// Strict lookup, `None` for names outside the enumerated set.
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(name))
    }
}

impl FromStr for ThemeId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::lookup(s).unwrap_or_default())
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Saved decks and config files may carry theme names from newer builds.
impl<'de> Deserialize<'de> for ThemeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::lookup(&name).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_theme_falls_back_to_light() {
        let theme: ThemeId = "unknown-theme".parse().unwrap();
        assert_eq!(theme, ThemeId::Light);
        assert_eq!(ThemeId::lookup("unknown-theme"), None);
    }

    #[test]
    fn theme_names_are_case_insensitive() {
        assert_eq!(ThemeId::lookup(" Midnight "), Some(ThemeId::Midnight));
        for theme in ThemeId::ALL {
            assert_eq!(theme.to_string().parse::<ThemeId>().unwrap(), theme);
        }
    }

    #[test]
    fn deck_json_uses_camel_case_and_tolerates_bad_theme() {
        let json = r#"{
            "title": "Deck",
            "theme": "neon",
            "slides": [{"title": "A", "content": ["x"], "imagePrompt": "p", "imageUrl": null}]
        }"#;
        let deck: Deck = serde_json::from_str(json).unwrap();
        assert_eq!(deck.theme, ThemeId::Light);
        assert_eq!(deck.slides[0].image_prompt, "p");
        assert_eq!(deck.images_attached(), 0);

        let out = serde_json::to_string(&deck).unwrap();
        assert!(out.contains("\"imagePrompt\""));
        assert!(out.contains("\"theme\":\"light\""));
    }

    #[test]
    fn from_outline_keeps_order_and_leaves_images_empty() {
        let outline = Outline {
            title: "T".into(),
            slides: vec![
                SlideDraft { title: "one".into(), content: vec![], image_prompt: "a".into() },
                SlideDraft { title: "two".into(), content: vec![], image_prompt: "b".into() },
            ],
        };
        let deck = Deck::from_outline(outline, ThemeId::Ocean);
        assert_eq!(deck.slide_count(), 2);
        assert_eq!(deck.slides[1].title, "two");
        assert!(deck.slides.iter().all(|s| s.image_url.is_none()));
        assert_eq!(deck.theme, ThemeId::Ocean);
    }
}
