use slide_common::{Deck, Outline, ThemeId};
use tracing::{debug, warn};

use crate::images::{ImageSource, UsedImages};
use crate::outline::default_image_prompt;

/// Deck state after one more slide received its image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyStep {
    pub deck: Deck,
    pub completed: usize,
    pub total: usize,
    /// `round(100 * completed / total)`
    pub progress: u8,
}

/// Attaches images to an outline's slides.
pub struct DeckAssembler<'a> {
    source: &'a dyn ImageSource,
}

impl<'a> DeckAssembler<'a> {
    pub fn new(source: &'a dyn ImageSource) -> Self {
        Self { source }
    }

    /// Lazily resolve one slide per `next()`. Each call starts a fresh
    /// used-image set, so two decks never constrain each other.
    pub fn progressive(&self, outline: Outline, theme: ThemeId) -> DeckAssembly<'a> {
        DeckAssembly {
            source: self.source,
            deck: Deck::from_outline(outline, theme),
            used: UsedImages::new(),
            next: 0,
        }
    }

    pub fn assemble(&self, outline: Outline, theme: ThemeId) -> Deck {
        let mut assembly = self.progressive(outline, theme);
        assembly.by_ref().for_each(drop);
        assembly.into_deck()
    }
}

/// In-progress assembly; an iterator of [`AssemblyStep`]s.
pub struct DeckAssembly<'a> {
    source: &'a dyn ImageSource,
    deck: Deck,
    used: UsedImages,
    next: usize,
}

impl DeckAssembly<'_> {
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn into_deck(self) -> Deck {
        self.deck
    }
}

impl Iterator for DeckAssembly<'_> {
    type Item = AssemblyStep;

    fn next(&mut self) -> Option<AssemblyStep> {
        let total = self.deck.slides.len();
        let index = self.next;
        let slide = self.deck.slides.get_mut(index)?;
        self.next += 1;

        let prompt = if slide.image_prompt.trim().is_empty() {
            default_image_prompt(&slide.title, &self.deck.title)
        } else {
            slide.image_prompt.clone()
        };

        match self.source.resolve(&prompt, &mut self.used) {
            Ok(url) => {
                debug!(index, %url, "image attached");
                slide.image_url = Some(url);
            }
            Err(e) => {
                warn!(index, %prompt, "image resolution failed, leaving slide without image: {e}");
                slide.image_url = None;
            }
        }

        let completed = index + 1;
        Some(AssemblyStep {
            deck: self.deck.clone(),
            completed,
            total,
            progress: progress_percent(completed, total),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.deck.slides.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DeckAssembly<'_> {}

/// Rounded half up; 100 for an empty deck.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (200 * completed.min(total) + total) / (2 * total);
    u8::try_from(pct).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{ImageError, TopicImageResolver};
    use slide_common::SlideDraft;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn outline(n: usize) -> Outline {
        Outline {
            title: "Renewable Energy".into(),
            slides: (0..n)
                .map(|i| SlideDraft {
                    title: format!("Slide {i}"),
                    content: vec!["a".into(), "b".into(), "c".into()],
                    image_prompt: "solar farm and wind turbine".into(),
                })
                .collect(),
        }
    }

    /// Fails on every second call.
    struct Flaky(AtomicUsize);

    impl ImageSource for Flaky {
        fn resolve(&self, _prompt: &str, used: &mut UsedImages) -> Result<String, ImageError> {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 1 {
                return Err(ImageError::Unavailable("quota exceeded".into()));
            }
            let url = format!("https://img.test/{n}");
            used.insert(&url);
            Ok(url)
        }
    }

    #[test]
    fn progressive_emits_one_step_per_slide() {
        let resolver = TopicImageResolver::with_seed(42);
        let assembler = DeckAssembler::new(&resolver);
        let steps: Vec<_> = assembler.progressive(outline(3), ThemeId::Mint).collect();

        assert_eq!(steps.len(), 3);
        assert_eq!(
            steps.iter().map(|s| s.progress).collect::<Vec<_>>(),
            vec![33, 67, 100]
        );
        assert_eq!(steps[0].deck.images_attached(), 1);
        assert_eq!(steps[2].deck.images_attached(), 3);
        assert!(steps.iter().all(|s| s.deck.theme == ThemeId::Mint));
    }

    #[test]
    fn assembled_images_are_distinct() {
        let resolver = TopicImageResolver::with_seed(1);
        let deck = DeckAssembler::new(&resolver).assemble(outline(5), ThemeId::Light);
        let urls: HashSet<_> = deck.slides.iter().filter_map(|s| s.image_url.clone()).collect();
        assert_eq!(urls.len(), 5);
    }

    #[test]
    fn each_run_starts_with_a_fresh_used_set() {
        let resolver = TopicImageResolver::with_seed(1);
        let assembler = DeckAssembler::new(&resolver);
        // the energy bucket has six images; two 5-slide decks would exhaust a shared set
        let first = assembler.assemble(outline(5), ThemeId::Light);
        let second = assembler.assemble(outline(5), ThemeId::Light);
        for deck in [first, second] {
            let urls: HashSet<_> = deck.slides.iter().filter_map(|s| s.image_url.clone()).collect();
            assert_eq!(urls.len(), 5);
        }
    }

    #[test]
    fn failed_resolution_leaves_slide_without_image() {
        let source = Flaky(AtomicUsize::new(0));
        let deck = DeckAssembler::new(&source).assemble(outline(4), ThemeId::Dark);
        assert_eq!(deck.slide_count(), 4);
        assert!(deck.slides[0].image_url.is_some());
        assert!(deck.slides[1].image_url.is_none());
        assert!(deck.slides[2].image_url.is_some());
        assert!(deck.slides[3].image_url.is_none());
    }

    #[test]
    fn empty_outline_yields_empty_deck() {
        let resolver = TopicImageResolver::with_seed(0);
        let assembler = DeckAssembler::new(&resolver);
        assert_eq!(assembler.progressive(outline(0), ThemeId::Light).count(), 0);
        let deck = assembler.assemble(outline(0), ThemeId::Light);
        assert_eq!(deck.title, "Renewable Energy");
        assert!(deck.slides.is_empty());
    }

    #[test]
    fn progress_rounds_half_up() {
        assert_eq!(progress_percent(1, 8), 13);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(4, 4), 100);
    }
}
