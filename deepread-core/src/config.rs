//! Configuration system for deepread.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/deepread/config.toml` and/or `.deepread/config.toml`
//! in the workspace directory.

use crate::types::ReportMode;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Key under which the generation API key is kept in the credential store.
pub const GENERATION_CREDENTIAL_KEY: &str = "openai_api_key";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepReadConfig {
    pub search: SearchConfig,
    pub reader: ReaderConfig,
    pub generation: GenerationConfig,
    pub research: ResearchConfig,
}

/// Format requested from the search provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchResponseFormat {
    /// Numbered `[N] Field: value` blocks.
    #[default]
    Text,
    /// `{ "data": [...] }` JSON.
    Json,
}

impl std::fmt::Display for SearchResponseFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchResponseFormat::Text => write!(f, "text"),
            SearchResponseFormat::Json => write!(f, "json"),
        }
    }
}

/// Search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    /// Environment variable holding the bearer credential.
    pub api_key_env: String,
    /// Inline credential; takes precedence over `api_key_env`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub response_format: SearchResponseFormat,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://s.jina.ai".to_string(),
            api_key_env: "JINA_API_KEY".to_string(),
            api_key: None,
            response_format: SearchResponseFormat::Text,
            timeout_secs: 30,
        }
    }
}

impl SearchConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), &self.api_key_env)
    }
}

/// Reader provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub base_url: String,
    pub api_key_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://r.jina.ai".to_string(),
            api_key_env: "JINA_API_KEY".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl ReaderConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), &self.api_key_env)
    }
}

/// Generation (LLM) provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub base_url: String,
    /// Model identifier (e.g., "gpt-4", "gpt-4o").
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f32,
    /// Environment variable consulted when neither an inline key nor a stored
    /// credential is present.
    pub api_key_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Account name in the OS credential store.
    pub credential_store_key: String,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            max_tokens: 4000,
            temperature: 0.3,
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            credential_store_key: GENERATION_CREDENTIAL_KEY.to_string(),
            timeout_secs: 180,
        }
    }
}

impl GenerationConfig {
    /// Validate this config and return any warnings.
    ///
    /// Returns an empty Vec if the config is valid. Problems are reported as
    /// human-readable messages rather than errors.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.max_tokens == 0 {
            warnings.push("generation.max_tokens is 0; completions will be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            warnings.push(format!(
                "generation.temperature ({}) is outside the typical range 0.0-2.0",
                self.temperature
            ));
        }
        if self.model.trim().is_empty() {
            warnings.push("generation.model is empty".to_string());
        }
        warnings
    }
}

/// Research workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Report structure requested from the generation provider.
    pub mode: ReportMode,
    /// How many top search results a bulk research run fetches.
    pub default_fetch_count: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            mode: ReportMode::LongForm,
            default_fetch_count: 5,
        }
    }
}

impl DeepReadConfig {
    /// Validate the whole configuration, collecting warnings from every section.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.generation.validate();
        for (name, base_url) in [
            ("search", &self.search.base_url),
            ("reader", &self.reader.base_url),
            ("generation", &self.generation.base_url),
        ] {
            if let Err(e) = url::Url::parse(base_url) {
                warnings.push(format!("{name}.base_url '{base_url}' is not a valid URL: {e}"));
            }
        }
        if self.research.default_fetch_count == 0 {
            warnings.push("research.default_fetch_count is 0; research runs fetch nothing".into());
        }
        warnings
    }
}

fn resolve_key(inline: Option<&str>, env_var: &str) -> Option<String> {
    inline
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok().filter(|k| !k.trim().is_empty()))
}

/// Path of the user-level config file, if a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "deepread", "deepread")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Path of the workspace-level config file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".deepread").join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `DEEPREAD_`)
/// 3. An explicit config file (`--config`)
/// 4. Workspace-local config (`.deepread/config.toml`)
/// 5. User config (`~/.config/deepread/config.toml`)
/// 6. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
    overrides: Option<&DeepReadConfig>,
) -> Result<DeepReadConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(DeepReadConfig::default()));

    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    }

    // Environment variables (DEEPREAD_GENERATION__MODEL, DEEPREAD_RESEARCH__MODE, etc.)
    figment = figment.merge(Env::prefixed("DEEPREAD_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Check whether any deepread configuration file exists (user-level or workspace-level).
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if user_config_path().is_some_and(|p| p.exists()) {
        return true;
    }
    workspace.is_some_and(|ws| workspace_config_path(ws).exists())
}
