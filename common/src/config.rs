use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::types::{ThemeId, MAX_SLIDES, MIN_SLIDES};

/// Which text-generation backend produces outlines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    /// Canned outlines, no network.
    Offline,
}

impl ProviderKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Offline => "offline",
        }
    }

    /// Environment variable holding this provider's API key, if it needs one.
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Offline => None,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai" | "chatgpt" => Ok(ProviderKind::OpenAi),
            "offline" | "stub" => Ok(ProviderKind::Offline),
            other => Err(anyhow::anyhow!(
                "unknown provider '{other}' (expected gemini, openai or offline)"
            )),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Offline => "offline",
        };
        f.write_str(name)
    }
}

/// Slide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideConfig {
    pub provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model name; `None` means the provider default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub theme: ThemeId,
    pub slide_count: usize,
    pub output_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub log_path: PathBuf,
}

impl Default for SlideConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: None,
            model: None,
            theme: ThemeId::default(),
            slide_count: 5,
            output_dir: PathBuf::from("."),
            request_timeout_secs: 60,
            log_path: PathBuf::from("/tmp/slide.log"),
        }
    }
}

impl SlideConfig {
    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find config directory"))?
            .join("slide");
        Ok(config_dir.join("config.json"))
    }

    /// Load configuration from the default location, then apply environment overrides.
    ///
    /// A missing file yields defaults; a malformed one is ignored. Problems come back as
    /// warnings so the caller can report them once logging is set up.
    pub async fn load() -> Result<(Self, Vec<String>)> {
        let path = Self::config_path()?;
        Ok(Self::load_with(&path, |name| {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        })
        .await)
    }

    async fn load_with(path: &Path, var: impl Fn(&str) -> Option<String>) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let mut config = match Self::load_from(path).await {
            Ok(config) => config,
            Err(e) => {
                warnings.push(format!("ignoring unreadable config {}: {e}", path.display()));
                Self::default()
            }
        };
        warnings.extend(config.apply_vars(var));
        (config, warnings)
    }

    /// Load configuration from file
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let config: SlideConfig = serde_json::from_str(&content)?;
        Ok(config.normalized())
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Overlay `SLIDE_*` and provider key variables from the process environment.
    ///
    /// Returns a warning for every variable that was set but ignored.
    pub fn apply_env(&mut self) -> Vec<String> {
        self.apply_vars(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(provider) = var("SLIDE_PROVIDER") {
            match provider.parse() {
                Ok(kind) => self.provider = kind,
                Err(e) => warnings.push(format!("SLIDE_PROVIDER ignored: {e}")),
            }
        }
        if let Some(env_var) = self.provider.api_key_env_var() {
            if let Some(key) = var(env_var) {
                self.api_key = Some(key);
            }
        }
        if let Some(model) = var("SLIDE_MODEL") {
            self.model = Some(model);
        }
        if let Some(theme) = var("SLIDE_THEME") {
            self.theme = theme.parse().unwrap_or_default();
        }
        if let Some(count) = var("SLIDE_COUNT") {
            match count.parse::<usize>() {
                Ok(n) => self.slide_count = n,
                Err(_) => warnings.push(format!("SLIDE_COUNT is not a number: {count}")),
            }
        }
        if let Some(dir) = var("SLIDE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(secs) = var("SLIDE_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(n) => self.request_timeout_secs = n,
                Err(_) => warnings.push(format!("SLIDE_TIMEOUT_SECS is not a number: {secs}")),
            }
        }
        if let Some(path) = var("SLIDE_LOG_PATH") {
            self.log_path = PathBuf::from(path);
        }
        *self = std::mem::take(self).normalized();
        warnings
    }

    pub fn normalized(mut self) -> Self {
        self.slide_count = self.slide_count.clamp(MIN_SLIDES, MAX_SLIDES);
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = Self::default().request_timeout_secs;
        }
        self
    }

    /// Switch provider, picking up that provider's key from the environment.
    pub fn set_provider(&mut self, provider: ProviderKind) {
        if provider == self.provider {
            return;
        }
        self.provider = provider;
        self.api_key = provider
            .api_key_env_var()
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.is_empty());
    }

    /// The configured model, or the provider's default.
    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}
