use anyhow::Result;
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
};
use slide_common::{Deck, SlideConfig, ThemeId, MAX_SLIDES, MIN_SLIDES};
use slide_core::{colors_for, Session};
use slide_protocol::{Event, Op, Seq};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::preview::SlideView;
use crate::terminal::TerminalGuard;

const HELP: &str = "Type a topic to generate a presentation. Commands: \
/slides N (4-10), /theme NAME, /export, /help, /quit. Left/Right browse slides, Ctrl+Q quits.";

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Generate(String),
    SlideCount(usize),
    Theme(String),
    Export,
    Help,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> std::result::Result<Self, String> {
        let input = input.trim();
        let Some(rest) = input.strip_prefix('/') else {
            return Ok(Command::Generate(input.to_string()));
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "slides" => arg
                .parse::<usize>()
                .ok()
                .filter(|n| (MIN_SLIDES..=MAX_SLIDES).contains(n))
                .map(Command::SlideCount)
                .ok_or_else(|| format!("Slide count must be a number from {MIN_SLIDES} to {MAX_SLIDES}.")),
            "theme" if arg.is_empty() => Err(format!("Available themes: {}", theme_list())),
            "theme" => Ok(Command::Theme(arg.to_string())),
            "export" => Ok(Command::Export),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("Unknown command /{other}. Type /help for usage.")),
        }
    }
}

fn theme_list() -> String {
    ThemeId::ALL
        .iter()
        .map(ThemeId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Chat-style front end for a generation [`Session`].
pub struct InteractiveApp {
    running: bool,
    input: String,
    messages: Vec<String>,
    session: Session,
    slide_count: usize,
    theme: ThemeId,
    output_dir: PathBuf,
    /// Request whose events are currently displayed.
    active_seq: Option<Seq>,
    deck: Option<Deck>,
    current_slide: usize,
    progress: Option<u8>,
}

impl InteractiveApp {
    pub fn new(session: Session, config: &SlideConfig) -> Self {
        Self {
            running: true,
            input: String::new(),
            messages: vec![HELP.to_string()],
            session,
            slide_count: config.slide_count,
            theme: config.theme,
            output_dir: config.output_dir.clone(),
            active_seq: None,
            deck: None,
            current_slide: 0,
            progress: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut guard = TerminalGuard::enter()?;
        let session = self.session.clone();

        while self.running {
            guard.terminal().draw(|f| self.draw(f))?;

            tokio::select! {
                ev = session.next_event() => {
                    match ev {
                        Ok(ev) => self.handle_event(ev),
                        Err(e) => {
                            warn!("session ended: {e}");
                            self.running = false;
                        }
                    }
                }
                polled = tokio::task::spawn_blocking(|| event::poll(Duration::from_millis(100))) => {
                    if let Ok(Ok(true)) = polled {
                        if let TermEvent::Key(key) = event::read()? {
                            self.handle_key(key).await;
                        }
                    }
                }
            }
        }

        let _ = session.submit(Op::Shutdown).await;
        guard.leave()
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }
            KeyCode::Esc => self.running = false,
            KeyCode::Enter => self.submit_input().await,
            KeyCode::Left => self.step_slide(false),
            KeyCode::Right => self.step_slide(true),
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            _ => {}
        }
    }

    async fn submit_input(&mut self) {
        if self.input.trim().is_empty() {
            return;
        }
        let line = std::mem::take(&mut self.input);
        self.messages.push(format!("You: {}", line.trim()));

        match Command::parse(&line) {
            Ok(Command::Generate(topic)) => {
                let op = Op::Generate {
                    topic,
                    slide_count: self.slide_count,
                    theme: self.theme,
                };
                match self.session.submit(op).await {
                    Ok(seq) => {
                        debug!(seq, "generation submitted");
                        self.active_seq = Some(seq);
                        self.progress = Some(0);
                    }
                    Err(e) => self.messages.push(format!("Error: {e}")),
                }
            }
            Ok(command) => self.apply(command),
            Err(message) => self.messages.push(message),
        }
    }

    /// Commands that do not talk to the session.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Generate(_) => {}
            Command::SlideCount(n) => {
                self.slide_count = n;
                self.messages.push(format!("Slide count set to {n}."));
            }
            Command::Theme(name) => {
                self.theme = match ThemeId::lookup(&name) {
                    Some(theme) => {
                        self.messages.push(format!("Theme set to {theme}."));
                        theme
                    }
                    None => {
                        self.messages.push(format!(
                            "Unknown theme \"{name}\", using light. Available: {}",
                            theme_list()
                        ));
                        ThemeId::Light
                    }
                };
                if let Some(deck) = self.deck.as_mut() {
                    deck.theme = self.theme;
                }
            }
            Command::Export => self.export(),
            Command::Help => self.messages.push(HELP.to_string()),
            Command::Quit => self.running = false,
        }
    }

    fn export(&mut self) {
        let Some(deck) = &self.deck else {
            self.messages.push("Nothing to export yet.".to_string());
            return;
        };
        if self.progress.is_some() {
            self.messages.push("Still generating, please wait.".to_string());
            return;
        }
        match slide_export::write_deck(deck, &self.output_dir) {
            Ok(path) => self.messages.push(format!("Saved {}", path.display())),
            Err(e) => {
                warn!("export failed: {e}");
                self.messages.push(format!("Export failed: {e}"));
            }
        }
    }

    pub fn handle_event(&mut self, ev: Event) {
        if let Some(seq) = ev.seq() {
            if Some(seq) != self.active_seq {
                debug!(seq, "ignoring event for an older request");
                return;
            }
        }

        match ev {
            Event::SessionConfigured { provider } => {
                self.messages.push(format!("Using {provider} for slide content."));
            }
            Event::GenerationStarted { topic, .. } => {
                self.messages.push(format!("Generating slides about {topic}..."));
                self.progress = Some(0);
            }
            Event::OutlineReady { deck, .. } => {
                self.messages.push(format!(
                    "Outline ready: {} ({} slides). Finding images...",
                    deck.title,
                    deck.slide_count()
                ));
                self.current_slide = 0;
                self.deck = Some(deck);
            }
            Event::SlideImageResolved { deck, progress, .. } => {
                self.progress = Some(progress);
                self.deck = Some(deck);
            }
            Event::DeckComplete { deck, .. } => {
                self.messages.push(format!(
                    "\"{}\" is ready. Use /export to save it.",
                    deck.title
                ));
                self.progress = None;
                self.deck = Some(deck);
            }
            Event::Error { message, .. } => {
                self.messages.push(format!("Error: {message}"));
                self.progress = None;
            }
            Event::ShutdownComplete => self.running = false,
        }
    }

    fn step_slide(&mut self, forward: bool) {
        let total = self.deck.as_ref().map_or(0, Deck::slide_count);
        if total == 0 {
            return;
        }
        self.current_slide = if forward {
            (self.current_slide + 1) % total
        } else {
            (self.current_slide + total - 1) % total
        };
    }

    fn draw(&self, f: &mut Frame) {
        let [chat, slide] =
            Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(f.area());

        let gauge_height = if self.progress.is_some() { 3 } else { 0 };
        let [transcript, gauge, input] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(gauge_height),
            Constraint::Length(3),
        ])
        .areas(chat);

        let visible = transcript.height.saturating_sub(2) as usize;
        let skip = self.messages.len().saturating_sub(visible);
        let items: Vec<ListItem> = self
            .messages
            .iter()
            .skip(skip)
            .map(|m| ListItem::new(m.as_str()))
            .collect();
        f.render_widget(
            List::new(items).block(Block::default().title("Chat").borders(Borders::ALL)),
            transcript,
        );

        if let Some(progress) = self.progress {
            f.render_widget(
                Gauge::default()
                    .block(Block::default().title("Images").borders(Borders::ALL))
                    .gauge_style(Style::default().fg(crate::preview::rgb(colors_for(self.theme).accent)))
                    .percent(u16::from(progress.min(100))),
                gauge,
            );
        }

        let title = format!("Input ({} slides, {} theme)", self.slide_count, self.theme);
        f.render_widget(
            Paragraph::new(self.input.as_str()).block(Block::default().title(title).borders(Borders::ALL)),
            input,
        );

        match self.deck.as_ref().and_then(|d| d.slides.get(self.current_slide).map(|s| (d, s))) {
            Some((deck, current)) => f.render_widget(
                SlideView::new(current, self.current_slide, deck.slide_count(), colors_for(deck.theme)),
                slide,
            ),
            None => f.render_widget(
                Paragraph::new("Your presentation will appear here.")
                    .block(Block::default().title("Preview").borders(Borders::ALL)),
                slide,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slide_common::Slide;
    use slide_core::{OutlineRequester, TopicImageResolver};
    use slide_provider::OfflineGenerator;
    use std::sync::Arc;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("/slides 7"), Ok(Command::SlideCount(7)));
        assert!(Command::parse("/slides 11").is_err());
        assert!(Command::parse("/slides three").is_err());
        assert_eq!(
            Command::parse("/theme  Ocean "),
            Ok(Command::Theme("Ocean".into()))
        );
        assert_eq!(Command::parse("/export"), Ok(Command::Export));
        assert_eq!(
            Command::parse(" Renewable Energy "),
            Ok(Command::Generate("Renewable Energy".into()))
        );
        assert!(Command::parse("/frobnicate").is_err());
    }

    async fn app() -> InteractiveApp {
        let requester = OutlineRequester::new(Arc::new(OfflineGenerator::new()), Duration::from_secs(5));
        let session = Session::spawn(requester, Arc::new(TopicImageResolver::with_seed(1)))
            .await
            .unwrap();
        let config = SlideConfig {
            output_dir: std::env::temp_dir(),
            ..SlideConfig::default()
        };
        InteractiveApp::new(session, &config)
    }

    fn deck(title: &str) -> Deck {
        Deck {
            title: title.into(),
            theme: ThemeId::Light,
            slides: vec![Slide {
                title: "One".into(),
                content: vec!["x".into()],
                image_prompt: "p".into(),
                image_url: None,
            }],
        }
    }

    #[tokio::test]
    async fn stale_events_are_ignored() {
        let mut app = app().await;
        app.active_seq = Some(2);
        app.handle_event(Event::DeckComplete {
            seq: 1,
            deck: deck("old"),
        });
        assert!(app.deck.is_none());
        app.handle_event(Event::DeckComplete {
            seq: 2,
            deck: deck("new"),
        });
        assert_eq!(app.deck.as_ref().map(|d| d.title.as_str()), Some("new"));
        assert_eq!(app.progress, None);
    }

    #[tokio::test]
    async fn unknown_theme_falls_back_to_light() {
        let mut app = app().await;
        app.apply(Command::Theme("midnight".into()));
        assert_eq!(app.theme, ThemeId::Midnight);
        app.apply(Command::Theme("neon".into()));
        assert_eq!(app.theme, ThemeId::Light);
    }

    #[tokio::test]
    async fn theme_change_restyles_current_deck() {
        let mut app = app().await;
        app.active_seq = Some(1);
        app.handle_event(Event::DeckComplete {
            seq: 1,
            deck: deck("d"),
        });
        app.apply(Command::Theme("forest".into()));
        assert_eq!(app.deck.as_ref().map(|d| d.theme), Some(ThemeId::Forest));
    }

    #[tokio::test]
    async fn export_without_deck_reports_it() {
        let mut app = app().await;
        app.apply(Command::Export);
        assert_eq!(app.messages.last().map(String::as_str), Some("Nothing to export yet."));
    }

    #[tokio::test]
    async fn error_event_clears_progress() {
        let mut app = app().await;
        app.active_seq = Some(1);
        app.progress = Some(40);
        app.handle_event(Event::Error {
            seq: 1,
            kind: slide_protocol::ErrorKind::Generation,
            message: "Generation failed".into(),
        });
        assert_eq!(app.progress, None);
        assert!(app.messages.last().unwrap().contains("Generation failed"));
    }
}
