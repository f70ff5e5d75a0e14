//! Per-slide layout choice shared by the terminal preview and the exporter.
//!
//! Both renderers call [`SlideLayout::for_slide`] so that what is previewed is
//! what gets written to disk.

use slide_common::Slide;

/// Arrangement of a regular content slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// Single bullet column with the image to the right.
    ContentWithImage,
    /// Bullets split into two columns, image centred below.
    TwoColumn,
    /// Numbered bullets in a bordered panel, image framed on the right.
    NumberedPanel,
}

/// How a slide is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideLayout {
    Standard(LayoutKind),
    /// Title plus the illustrative bar chart; bullets are not drawn.
    Chart,
}

/// Bullets a slide needs before it can become a chart slide.
pub const CHART_MIN_BULLETS: usize = 3;

/// Illustrative series drawn on chart slides.
pub const CHART_SERIES: [(&str, u64); 4] = [("Q1", 45), ("Q2", 62), ("Q3", 78), ("Q4", 91)];

pub fn layout_for(index: usize) -> LayoutKind {
    match index % 3 {
        0 => LayoutKind::ContentWithImage,
        1 => LayoutKind::TwoColumn,
        _ => LayoutKind::NumberedPanel,
    }
}

pub fn is_chart_slide(index: usize, bullet_count: usize) -> bool {
    index > 0 && index % 4 == 0 && bullet_count >= CHART_MIN_BULLETS
}

impl SlideLayout {
    pub fn for_index(index: usize, bullet_count: usize) -> Self {
        if is_chart_slide(index, bullet_count) {
            SlideLayout::Chart
        } else {
            SlideLayout::Standard(layout_for(index))
        }
    }

    pub fn for_slide(index: usize, slide: &Slide) -> Self {
        Self::for_index(index, slide.content.len())
    }
}

/// Left column gets the larger half when the count is odd.
pub fn split_columns(bullets: &[String]) -> (&[String], &[String]) {
    bullets.split_at(bullets.len().div_ceil(2))
}

pub fn numbered(bullets: &[String]) -> Vec<String> {
    bullets
        .iter()
        .enumerate()
        .map(|(i, b)| format!("{}. {b}", i + 1))
        .collect()
}
