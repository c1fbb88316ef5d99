//! Paper Bartender configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `storage.data-dir`
pub const DATA_DIR_ENV: &str = "PAPER_BARTENDER_DATA_DIR";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the state file lives
    pub storage: StorageConfig,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Decomposition tuning
    pub decomposition: DecompositionConfig,
}

impl Config {
    /// Check that the LLM API key is available
    ///
    /// Only commands that call the LLM need this, so it is not part of `load`.
    pub fn validate_llm(&self) -> Result<()> {
        self.llm.get_api_key().map(|_| ())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;

        if let Ok(dir) = std::env::var(DATA_DIR_ENV)
            && !dir.trim().is_empty()
        {
            tracing::debug!(%dir, "Config::load: data dir overridden from environment");
            config.storage.data_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .paper-bartender.yml
        let local_config = PathBuf::from(".paper-bartender.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/paper-bartender/paper-bartender.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("paper-bartender").join("paper-bartender.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Full path of the state file
    pub fn state_file(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.file_name)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the state file and its backup
    #[serde(rename = "data-dir")]
    pub data_dir: PathBuf,

    /// State file name inside `data-dir`
    #[serde(rename = "file-name")]
    pub file_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/paper-bartender on Linux)
        let data_dir = dirs::data_dir()
            .map(|d| d.join("paper-bartender"))
            .unwrap_or_else(|| PathBuf::from(".paper-bartender"));

        Self {
            data_dir,
            file_name: "papers.json".to_string(),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "anthropic" or "openai"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.api_key_env
            )),
        }
    }
}

/// Decomposition tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompositionConfig {
    /// Hours assumed for a task when the LLM gives no estimate
    #[serde(rename = "default-task-hours")]
    pub default_task_hours: f32,

    /// How many schedulable days are listed individually in the prompt
    #[serde(rename = "max-prompt-days")]
    pub max_prompt_days: usize,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            default_task_hours: 2.0,
            max_prompt_days: 14,
        }
    }
}
