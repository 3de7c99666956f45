//! Configuration — YAML config + env var overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::document::DuplicatePolicy;

/// Known provider presets
const PROVIDER_PRESETS: &[(&str, Option<&str>)] = &[
    ("openai", Some("https://api.openai.com/v1")),
    ("openrouter", Some("https://openrouter.ai/api/v1")),
];

/// Provider-specific API key env vars (checked before OPENAI_API_KEY fallback)
const PROVIDER_KEY_ENV_VARS: &[(&str, &str)] = &[("openrouter", "OPENROUTER_API_KEY")];

pub const ACCESS_TOKEN_ENV_VAR: &str = "AAS_AGENT_ACCESS_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// "openai" | "openrouter" | "custom"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// LLM model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API key (set here or via env var)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for Chat Completions API (auto-set for known providers)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Max output tokens per LLM call
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Max tool rounds per user message
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    /// Conversation turns kept per chat
    #[serde(default = "default_max_history_messages")]
    pub max_history_messages: usize,

    /// Where save/load resolve filenames. Relative to the config file.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// Bearer token clients must present to the chat API
    #[serde(default)]
    pub access_token: Option<String>,

    /// Resolved project root (set at load time, not serialized from YAML)
    #[serde(skip)]
    pub project_root: PathBuf,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_max_output_tokens() -> u32 {
    1000
}
fn default_max_tool_rounds() -> usize {
    8
}
fn default_max_history_messages() -> usize {
    20
}
fn default_storage_dir() -> String {
    "aas_files".into()
}

impl Config {
    /// Load config from a YAML file with env var overrides.
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;

        let mut config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config.yaml")?;

        let root = config_path.parent().unwrap_or(Path::new("."));
        config.project_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

        config.apply_env(|var| std::env::var(var).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load `config.yaml` from `project_root`, falling back to defaults (plus
    /// env overrides) when the file does not exist.
    pub fn load_from_dir(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join("config.yaml");
        if config_path.exists() {
            return Self::load(&config_path);
        }

        let mut config = Config {
            project_root: project_root.to_path_buf(),
            ..Config::default()
        };
        config.apply_env(|var| std::env::var(var).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides. `lookup` stands in for `std::env::var`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Provider (env var override)
        if let Some(p) = lookup("AAS_AGENT_PROVIDER") {
            self.provider = p;
        }

        // Base URL: env var > config > provider preset
        if let Some(url) = lookup("AAS_AGENT_BASE_URL") {
            self.base_url = Some(url);
        } else if self.base_url.is_none() {
            self.base_url = PROVIDER_PRESETS
                .iter()
                .find(|(p, _)| *p == self.provider)
                .and_then(|(_, url)| url.map(String::from));
        }

        // API key: provider-specific env var > OPENAI_API_KEY > config
        if let Some(key) = self.provider_key_var().and_then(&lookup) {
            self.api_key = Some(key);
        } else if let Some(key) = lookup("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }

        if let Some(m) = lookup("AAS_AGENT_MODEL") {
            self.model = m;
        }
        if let Some(token) = lookup(ACCESS_TOKEN_ENV_VAR) {
            self.access_token = Some(token);
        }
        if let Some(dir) = lookup("AAS_AGENT_STORAGE_DIR") {
            self.storage_dir = dir;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.provider == "custom" && self.base_url.is_none() {
            anyhow::bail!(
                "Provider 'custom' requires base_url in config.yaml or AAS_AGENT_BASE_URL env var"
            );
        }
        Ok(())
    }

    fn provider_key_var(&self) -> Option<&'static str> {
        PROVIDER_KEY_ENV_VARS
            .iter()
            .find(|(p, _)| *p == self.provider)
            .map(|(_, var)| *var)
    }

    /// Env vars that still need to be set before the agent can run.
    /// Local `custom` providers (Ollama) don't need an API key.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.is_none() && self.provider != "custom" {
            missing.push(self.provider_key_var().unwrap_or("OPENAI_API_KEY"));
        }
        if self.access_token.is_none() {
            missing.push(ACCESS_TOKEN_ENV_VAR);
        }
        missing
    }

    /// Absolute storage directory.
    pub fn resolve_storage_dir(&self) -> PathBuf {
        let p = Path::new(&self.storage_dir);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.project_root.join(p)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
            max_output_tokens: default_max_output_tokens(),
            max_tool_rounds: default_max_tool_rounds(),
            max_history_messages: default_max_history_messages(),
            storage_dir: default_storage_dir(),
            duplicate_policy: DuplicatePolicy::default(),
            access_token: None,
            project_root: PathBuf::new(),
        }
    }
}
