use slide_common::ThemeId;

/// Colours applied to every slide of a deck, as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub text: &'static str,
    pub accent: &'static str,
}

const LIGHT: Palette = Palette {
    background: "#FFFFFF",
    text: "#333333",
    accent: "#4F46E5",
};

const PALETTES: [(ThemeId, Palette); 9] = [
    (ThemeId::Light, LIGHT),
    (
        ThemeId::Dark,
        Palette {
            background: "#1F2937",
            text: "#F9FAFB",
            accent: "#6366F1",
        },
    ),
    (
        ThemeId::Midnight,
        Palette {
            background: "#1A1A2E",
            text: "#EEEEEE",
            accent: "#E94560",
        },
    ),
    (
        ThemeId::Skywave,
        Palette {
            background: "#ECF3FF",
            text: "#334155",
            accent: "#3B82F6",
        },
    ),
    (
        ThemeId::Mint,
        Palette {
            background: "#F0FFF4",
            text: "#065F46",
            accent: "#34D399",
        },
    ),
    (
        ThemeId::Sunset,
        Palette {
            background: "#FFF7ED",
            text: "#7C2D12",
            accent: "#F97316",
        },
    ),
    (
        ThemeId::Ocean,
        Palette {
            background: "#0C4A6E",
            text: "#E0F2FE",
            accent: "#22D3EE",
        },
    ),
    (
        ThemeId::Forest,
        Palette {
            background: "#14261C",
            text: "#E8F5E9",
            accent: "#4CAF50",
        },
    ),
    (
        ThemeId::Royal,
        Palette {
            background: "#F5F3FF",
            text: "#2E1065",
            accent: "#7C3AED",
        },
    ),
];

/// Palette for a theme. Anything not in the table gets the light palette.
pub fn colors_for(theme: ThemeId) -> Palette {
    PALETTES
        .iter()
        .find(|(id, _)| *id == theme)
        .map_or(LIGHT, |(_, palette)| *palette)
}

/// Palette for a free-form theme name, falling back to light.
pub fn colors_for_name(name: &str) -> Palette {
    colors_for(ThemeId::lookup(name).unwrap_or_default())
}

impl Palette {
    /// `RRGGBB` without the leading `#`, as OOXML `srgbClr` wants it.
    pub fn bare(color: &str) -> &str {
        color.trim_start_matches('#')
    }

    /// Parse `#RRGGBB` into components. Malformed input yields black.
    pub fn rgb(color: &str) -> (u8, u8, u8) {
        let hex = Self::bare(color);
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .unwrap_or(0)
        };
        (channel(0..2), channel(2..4), channel(4..6))
    }
}
