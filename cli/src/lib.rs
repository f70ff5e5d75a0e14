use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use slide_common::{Deck, ProviderKind, SlideConfig, ThemeId};
use slide_core::{colors_for, DeckAssembler, ErrorReporter, OutlineRequester, Session, TopicImageResolver};
use slide_tui::{InteractiveApp, SlidePreview};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slide", version)]
#[command(about = "Generate presentation decks from a topic")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Content provider: gemini | openai | offline
    #[arg(long, global = true)]
    pub provider: Option<ProviderKind>,

    /// Override model (e.g., gemini-1.5-pro, gpt-4o)
    #[arg(long, global = true)]
    pub model: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat-style generation with live preview
    Interactive,
    /// Generate a deck without the TUI and write it as .pptx
    Generate {
        /// What the presentation is about
        topic: String,
        /// Number of slides (4-10)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(4..=10))]
        count: Option<u8>,
        /// Colour theme (see `slide themes`)
        #[arg(short, long)]
        theme: Option<String>,
        /// Directory for the generated files
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also save the deck as JSON next to the .pptx
        #[arg(long)]
        json: bool,
    },
    /// Preview a deck saved with `generate --json`
    Preview {
        /// Path to the deck JSON
        file: PathBuf,
    },
    /// List available themes
    Themes,
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_warnings) = match SlideConfig::load().await {
        Ok(loaded) => loaded,
        Err(e) => {
            let mut config = SlideConfig::default();
            let mut warnings = vec![format!("could not locate config, using defaults: {e}")];
            warnings.extend(config.apply_env());
            (config, warnings)
        }
    };
    if let Some(provider) = cli.provider {
        config.set_provider(provider);
    }
    if let Some(model) = cli.model {
        config.model = Some(model);
    }

    init_tracing(&config.log_path, cli.debug);
    for warning in &config_warnings {
        warn!("{warning}");
        eprintln!("warning: {warning}");
    }
    info!(provider = %config.provider, model = config.model_name(), "slide starting");

    match cli.command {
        Some(Commands::Interactive) | None => run_interactive(config).await,
        Some(Commands::Generate {
            topic,
            count,
            theme,
            output,
            json,
        }) => {
            if let Some(count) = count {
                config.slide_count = usize::from(count);
            }
            if let Some(name) = theme {
                config.theme = parse_theme(&name);
            }
            if let Some(dir) = output {
                config.output_dir = dir;
            }
            generate(&config.normalized(), &topic, json).await
        }
        Some(Commands::Preview { file }) => preview(&file).await,
        Some(Commands::Themes) => {
            print_themes();
            Ok(())
        }
    }
}

/// Log to a file so the TUI owns the terminal.
fn init_tracing(log_path: &Path, debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file = OpenOptions::new().create(true).append(true).open(log_path);
    let result = match file {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        Err(e) => {
            eprintln!("warning: cannot open log file {}: {e}", log_path.display());
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .try_init()
        }
    };
    if let Err(e) = result {
        eprintln!("warning: logging disabled: {e}");
    }
}

fn parse_theme(name: &str) -> ThemeId {
    ThemeId::lookup(name).unwrap_or_else(|| {
        eprintln!("warning: unknown theme \"{name}\", using light");
        ThemeId::Light
    })
}

fn requester(config: &SlideConfig) -> Result<OutlineRequester> {
    let generator = slide_provider::from_config(config).map_err(|e| {
        anyhow!(ErrorReporter::format_user_error(&e.into()))
    })?;
    Ok(OutlineRequester::new(
        Arc::from(generator),
        Duration::from_secs(config.request_timeout_secs),
    ))
}

async fn run_interactive(config: SlideConfig) -> Result<()> {
    let session = Session::spawn(requester(&config)?, Arc::new(TopicImageResolver::new())).await?;
    InteractiveApp::new(session, &config).run().await
}

async fn generate(config: &SlideConfig, topic: &str, json: bool) -> Result<()> {
    let requester = requester(config)?;
    println!(
        "Generating {} slides about \"{topic}\" with {}...",
        config.slide_count,
        requester.provider_name()
    );

    let outline = match requester.request(topic, config.slide_count).await {
        Ok(outline) => outline,
        Err(e) => {
            warn!("generation failed: {e}");
            return Err(anyhow!(ErrorReporter::format_user_error(&e)));
        }
    };
    println!("Outline ready: {}", outline.title);

    let resolver = TopicImageResolver::new();
    let assembler = DeckAssembler::new(&resolver);
    let mut assembly = assembler.progressive(outline, config.theme);
    for step in assembly.by_ref() {
        let title = step
            .deck
            .slides
            .get(step.completed - 1)
            .map_or("", |s| s.title.as_str());
        println!(
            "[{:>3}%] {}/{} {title}",
            step.progress, step.completed, step.total
        );
    }
    let deck = assembly.into_deck();

    let path = slide_export::write_deck(&deck, &config.output_dir)
        .with_context(|| format!("failed to write presentation to {}", config.output_dir.display()))?;
    println!("Saved {}", path.display());

    if json {
        let json_path = path.with_extension("json");
        let body = serde_json::to_string_pretty(&deck)?;
        tokio::fs::write(&json_path, body)
            .await
            .with_context(|| format!("failed to write {}", json_path.display()))?;
        println!("Saved {}", json_path.display());
    }
    Ok(())
}

async fn preview(file: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let deck: Deck = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a saved deck", file.display()))?;
    SlidePreview::new(deck).run().await
}

fn print_themes() {
    for theme in ThemeId::ALL {
        let palette = colors_for(theme);
        println!(
            "{:<10} background {}  text {}  accent {}",
            theme.as_str(),
            palette.background,
            palette.text,
            palette.accent
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn count_is_range_checked() {
        assert!(Cli::try_parse_from(["slide", "generate", "x", "-c", "3"]).is_err());
        assert!(Cli::try_parse_from(["slide", "generate", "x", "-c", "11"]).is_err());
        let cli = Cli::try_parse_from(["slide", "--provider", "offline", "generate", "x", "-c", "10"]).unwrap();
        assert_eq!(cli.provider, Some(ProviderKind::Offline));
        assert!(matches!(cli.command, Some(Commands::Generate { count: Some(10), .. })));
    }

    #[test]
    fn unknown_theme_name_is_light() {
        assert_eq!(parse_theme("Sunset"), ThemeId::Sunset);
        assert_eq!(parse_theme("vaporwave"), ThemeId::Light);
    }
}
