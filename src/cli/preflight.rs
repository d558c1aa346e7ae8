//! Pre-flight checks before discovery runs.
//!
//! Validates that required API keys are available before starting
//! operations that would otherwise silently produce no results.

use crate::config::Settings;
use crate::error::{Result, ScoutError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Discovery needs both the LLM and the video API.
    Discover,
    /// The server initializes providers lazily, so nothing is required up front.
    Serve,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Discover => {
            check_openai_key()?;
            check_youtube_key(settings)?;
        }
        Operation::Serve => {}
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_openai_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(ScoutError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(ScoutError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check if a YouTube Data API key is configured.
fn check_youtube_key(settings: &Settings) -> Result<()> {
    settings.youtube.resolve_api_key().map(|_| ()).ok_or_else(|| {
        ScoutError::Config(
            "YouTube API key not set. Set youtube.api_key in the config or export YOUTUBE_API_KEY".to_string(),
        )
    })
}
