//! Configuration settings for ToolScout.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub youtube: YoutubeSettings,
    pub discovery: DiscoverySettings,
    pub filters: FilterSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level used when no -v flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model for keyword generation, curation and translation.
    pub model: String,
    /// Model for the conversational layer.
    pub chat_model: String,
    /// Sampling temperature for plain completions.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            timeout_secs: 300,
        }
    }
}

/// YouTube Data API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// YouTube Data API key. Falls back to `YOUTUBE_API_KEY`.
    pub api_key: Option<String>,
    /// API base URL.
    pub base_url: String,
    /// Maximum search results requested per keyword.
    pub max_results: u32,
    /// Duration bucket (any, short, medium, long).
    pub video_duration: String,
    /// Relevance language hint.
    pub relevance_language: String,
    /// Region hint.
    pub region_code: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            max_results: 10,
            video_duration: "medium".to_string(),
            relevance_language: "en".to_string(),
            region_code: "US".to_string(),
            timeout_secs: 30,
        }
    }
}

impl YoutubeSettings {
    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("YOUTUBE_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Discovery pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Maximum curated tools per run (capped at 5).
    pub max_tools: usize,
    /// Number of keyword searches issued concurrently.
    pub search_batch_size: usize,
    /// Delay between search batches and between details batches.
    pub batch_delay_ms: u64,
    /// Video ids per statistics lookup (API maximum is 50).
    pub details_batch_size: usize,
    /// Character cap for cleaned descriptions.
    pub description_max_chars: usize,
    /// Default display language for translation (None = no translation).
    pub default_language: Option<String>,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            max_tools: 5,
            search_batch_size: 3,
            batch_delay_ms: 500,
            details_batch_size: 50,
            description_max_chars: 160,
            default_language: None,
        }
    }
}

/// Heuristic filters applied to search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Title phrases that mark listicle or comparison content.
    pub deny_phrases: Vec<String>,
    /// Keywords of which at least one must appear in title or description.
    pub allow_keywords: Vec<String>,
    /// Description lines containing these are treated as promotional.
    pub promotional_phrases: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            deny_phrases: owned(&[
                "top 10",
                "top 5",
                "top 7",
                "tools for",
                "tools of",
                "tools in",
                "tools to",
                "every developer",
                "every programmer",
                "every coder",
                "list of",
                "collection of",
                "best ai tools",
                "must have",
                "ranking",
                " vs ",
                "versus",
                "comparison",
            ]),
            allow_keywords: owned(&[
                "ai",
                "gpt",
                "neural",
                "copilot",
                "llm",
                "ml",
                "machine learning",
                "deep learning",
                "artificial intelligence",
                "assistant",
                "automation",
                "chatbot",
                "generative",
                "openai",
                "diffusion",
            ]),
            promotional_phrases: owned(&[
                "subscribe",
                "discount",
                "sign up",
                "coupon",
                "promo code",
                "use code",
                "affiliate",
                "sponsored",
                "patreon",
                "follow me",
                "link in bio",
                "like this video",
                "check out my",
                "download now",
                "click here",
                "join my",
            ]),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Sessions kept in memory before the least recently used is evicted.
    pub max_sessions: usize,
    /// Seconds without a request after which a session expires.
    pub session_idle_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_sessions: 1000,
            session_idle_secs: 3600,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ScoutError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("toolscout")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Effective tool cap, never above five.
    pub fn max_tools(&self) -> usize {
        self.discovery.max_tools.clamp(1, 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.discovery.search_batch_size, 3);
        assert_eq!(settings.discovery.details_batch_size, 50);
        assert!(settings.filters.deny_phrases.contains(&"top 10".to_string()));
        assert_eq!(settings.max_tools(), 5);
    }

    #[test]
    fn test_max_tools_is_capped() {
        let mut settings = Settings::default();
        settings.discovery.max_tools = 12;
        assert_eq!(settings.max_tools(), 5);
        settings.discovery.max_tools = 0;
        assert_eq!(settings.max_tools(), 1);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[discovery]
batch_delay_ms = 0

[youtube]
region_code = "NO"
"#,
        )
        .unwrap();
        assert_eq!(settings.discovery.batch_delay_ms, 0);
        assert_eq!(settings.discovery.search_batch_size, 3);
        assert_eq!(settings.youtube.region_code, "NO");
        assert_eq!(settings.youtube.max_results, 10);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.server.port = 8088;
        settings.discovery.default_language = Some("Norwegian".to_string());
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 8088);
        assert_eq!(loaded.discovery.default_language.as_deref(), Some("Norwegian"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load_from(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(loaded.server.host, "127.0.0.1");
    }
}
