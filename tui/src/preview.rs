use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::time::Duration;
use ratatui::{
    prelude::*,
    widgets::{BarChart, Block, BorderType, Borders, Paragraph, Wrap},
};
use slide_common::{Deck, Slide};
use slide_core::layout::{numbered, split_columns, CHART_SERIES};
use slide_core::{colors_for, LayoutKind, Palette, SlideLayout};

use crate::terminal::TerminalGuard;

/// Full-screen viewer for a finished deck.
pub struct SlidePreview {
    deck: Deck,
    current_slide: usize,
    running: bool,
}

impl SlidePreview {
    pub fn new(deck: Deck) -> Self {
        Self {
            deck,
            current_slide: 0,
            running: true,
        }
    }

    pub fn current_slide(&self) -> usize {
        self.current_slide
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut guard = TerminalGuard::enter()?;

        while self.running {
            guard.terminal().draw(|f| self.draw(f))?;

            let polled = tokio::task::spawn_blocking(|| -> std::io::Result<Option<Event>> {
                if event::poll(Duration::from_millis(250))? {
                    event::read().map(Some)
                } else {
                    Ok(None)
                }
            })
            .await??;
            if let Some(ev) = polled {
                self.handle_event(ev);
            }
        }

        guard.leave()
    }

    pub fn handle_event(&mut self, ev: Event) {
        if let Event::Key(key) = ev {
            if key.kind == KeyEventKind::Press {
                self.handle_key(key.code);
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Left | KeyCode::Char('h') => self.previous_slide(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => self.next_slide(),
            _ => {}
        }
    }

    fn draw(&self, f: &mut Frame) {
        let area = f.area();
        match self.deck.slides.get(self.current_slide) {
            Some(slide) => f.render_widget(
                SlideView::new(slide, self.current_slide, self.deck.slide_count(), colors_for(self.deck.theme)),
                area,
            ),
            None => f.render_widget(
                Paragraph::new("No slides in this presentation")
                    .block(Block::default().title(self.deck.title.as_str()).borders(Borders::ALL)),
                area,
            ),
        }
    }

    /// Wraps around to the first slide.
    pub fn next_slide(&mut self) {
        let total = self.deck.slide_count();
        if total > 0 {
            self.current_slide = (self.current_slide + 1) % total;
        }
    }

    /// Wraps around to the last slide.
    pub fn previous_slide(&mut self) {
        let total = self.deck.slide_count();
        if total > 0 {
            self.current_slide = (self.current_slide + total - 1) % total;
        }
    }
}

pub(crate) fn rgb(color: &str) -> Color {
    let (r, g, b) = Palette::rgb(color);
    Color::Rgb(r, g, b)
}

/// One slide drawn with the same layout rule the exporter uses.
pub struct SlideView<'a> {
    slide: &'a Slide,
    index: usize,
    total: usize,
    palette: Palette,
}

impl<'a> SlideView<'a> {
    pub fn new(slide: &'a Slide, index: usize, total: usize, palette: Palette) -> Self {
        Self {
            slide,
            index,
            total,
            palette,
        }
    }

    fn base(&self) -> Style {
        Style::default()
            .bg(rgb(self.palette.background))
            .fg(rgb(self.palette.text))
    }

    fn accent(&self) -> Style {
        self.base().fg(rgb(self.palette.accent))
    }

    fn bullets(&self, bullets: &[String]) -> Paragraph<'a> {
        let lines: Vec<Line> = bullets.iter().map(|b| Line::from(format!("• {b}"))).collect();
        Paragraph::new(lines).style(self.base()).wrap(Wrap { trim: true })
    }

    /// `None` when the slide has no image; the exporter leaves that space empty too.
    fn image_panel(&self, border: BorderType) -> Option<Paragraph<'a>> {
        let url = self.slide.image_url.as_ref()?;
        let text = vec![
            Line::from(self.slide.image_prompt.clone()).italic(),
            Line::default(),
            Line::from(url.clone()).style(self.accent()),
        ];
        let panel = Paragraph::new(text)
            .style(self.base())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title("Image")
                    .borders(Borders::ALL)
                    .border_type(border)
                    .border_style(self.accent()),
            );
        Some(panel)
    }

    fn render_content(&self, kind: LayoutKind, area: Rect, buf: &mut Buffer) {
        match kind {
            LayoutKind::ContentWithImage => {
                let [text, image] = Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                    .spacing(1)
                    .areas(area);
                self.bullets(&self.slide.content).render(text, buf);
                if let Some(panel) = self.image_panel(BorderType::Plain) {
                    panel.render(image, buf);
                }
            }
            LayoutKind::TwoColumn => {
                let [columns, image] = Layout::vertical([Constraint::Min(3), Constraint::Percentage(40)]).areas(area);
                let [left_area, right_area] =
                    Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                        .spacing(2)
                        .areas(columns);
                let (left, right) = split_columns(&self.slide.content);
                self.bullets(left).render(left_area, buf);
                self.bullets(right).render(right_area, buf);
                let [_, centered, _] = Layout::horizontal([
                    Constraint::Percentage(25),
                    Constraint::Percentage(50),
                    Constraint::Percentage(25),
                ])
                .areas(image);
                if let Some(panel) = self.image_panel(BorderType::Plain) {
                    panel.render(centered, buf);
                }
            }
            LayoutKind::NumberedPanel => {
                let [panel, image] = Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                    .spacing(1)
                    .areas(area);
                let lines: Vec<Line> = numbered(&self.slide.content).into_iter().map(Line::from).collect();
                Paragraph::new(lines)
                    .style(self.base())
                    .wrap(Wrap { trim: true })
                    .block(Block::default().borders(Borders::ALL).border_style(self.accent()))
                    .render(panel, buf);
                if let Some(panel) = self.image_panel(BorderType::Double) {
                    panel.render(image, buf);
                }
            }
        }
    }

    fn render_chart(&self, area: Rect, buf: &mut Buffer) {
        BarChart::default()
            .data(&CHART_SERIES[..])
            .max(100)
            .bar_width(7)
            .bar_gap(3)
            .bar_style(self.accent())
            .value_style(self.base().add_modifier(Modifier::BOLD).bg(rgb(self.palette.accent)))
            .label_style(self.base())
            .style(self.base())
            .render(area, buf);
    }
}

impl Widget for SlideView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Line::from(self.slide.title.as_str()).style(self.accent().add_modifier(Modifier::BOLD)))
            .borders(Borders::ALL)
            .border_style(self.accent())
            .style(self.base());
        let inner = block.inner(area);
        block.render(area, buf);

        let [body, footer] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

        match SlideLayout::for_slide(self.index, self.slide) {
            SlideLayout::Chart => self.render_chart(body, buf),
            SlideLayout::Standard(kind) => self.render_content(kind, body, buf),
        }

        Line::from("WebMind AI")
            .style(self.accent().add_modifier(Modifier::BOLD))
            .render(footer, buf);
        Line::from(format!("{}/{}", self.index + 1, self.total))
            .style(self.base())
            .alignment(Alignment::Right)
            .render(footer, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use slide_common::ThemeId;

    fn deck(n: usize) -> Deck {
        Deck {
            title: "Renewable Energy".into(),
            theme: ThemeId::Dark,
            slides: (0..n)
                .map(|i| Slide {
                    title: format!("Slide {i}"),
                    content: vec!["alpha".into(), "beta".into(), "gamma".into()],
                    image_prompt: "wind farm".into(),
                    image_url: Some(format!("https://img.test/{i}")),
                })
                .collect(),
        }
    }

    fn render(deck: &Deck, index: usize) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|f| {
                f.render_widget(
                    SlideView::new(&deck.slides[index], index, deck.slide_count(), colors_for(deck.theme)),
                    f.area(),
                )
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn navigation_wraps_both_ways() {
        let mut preview = SlidePreview::new(deck(3));
        preview.handle_key(KeyCode::Left);
        assert_eq!(preview.current_slide(), 2);
        preview.handle_key(KeyCode::Right);
        assert_eq!(preview.current_slide(), 0);
        preview.handle_key(KeyCode::Right);
        assert_eq!(preview.current_slide(), 1);
    }

    #[test]
    fn empty_deck_navigation_is_a_no_op() {
        let mut preview = SlidePreview::new(deck(0));
        preview.next_slide();
        preview.previous_slide();
        assert_eq!(preview.current_slide(), 0);
    }

    #[test]
    fn only_key_presses_navigate() {
        use crossterm::event::{KeyEvent, KeyEventState, KeyModifiers};

        let mut preview = SlidePreview::new(deck(3));
        preview.handle_event(Event::Key(KeyEvent::new(KeyCode::Right, KeyModifiers::NONE)));
        assert_eq!(preview.current_slide(), 1);

        let release = KeyEvent::new_with_kind_and_state(
            KeyCode::Right,
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        );
        preview.handle_event(Event::Key(release));
        preview.handle_event(Event::Resize(80, 24));
        assert_eq!(preview.current_slide(), 1);
    }

    #[test]
    fn slides_without_images_draw_no_image_panel() {
        let mut deck = deck(5);
        for slide in &mut deck.slides {
            slide.image_url = None;
        }
        for index in 0..3 {
            let text = render(&deck, index);
            assert!(!text.contains("Image"), "slide {index}");
            assert!(!text.contains("wind farm"), "slide {index}");
            assert!(text.contains("alpha"), "slide {index}");
        }
    }

    #[test]
    fn quit_keys_stop_the_loop() {
        let mut preview = SlidePreview::new(deck(1));
        preview.handle_key(KeyCode::Char('q'));
        assert!(!preview.running);
    }

    #[test]
    fn content_slide_shows_bullets_footer_and_image() {
        let text = render(&deck(5), 0);
        assert!(text.contains("Slide 0"));
        assert!(text.contains("• alpha"));
        assert!(text.contains("WebMind AI"));
        assert!(text.contains("1/5"));
        assert!(text.contains("https://img.test/0"));
    }

    #[test]
    fn numbered_layout_matches_export_numbering() {
        let text = render(&deck(5), 2);
        assert!(text.contains("1. alpha"));
        assert!(text.contains("3. gamma"));
    }

    #[test]
    fn fifth_slide_is_a_chart() {
        let text = render(&deck(5), 4);
        assert!(text.contains("Q1"));
        assert!(text.contains("Q4"));
        assert!(!text.contains("alpha"));
        assert!(text.contains("5/5"));
    }
}
