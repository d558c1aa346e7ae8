//! Configuration module for ToolScout.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, CurationPrompts, KeywordPrompts, Prompts, TranslationPrompts};
pub use settings::{
    DiscoverySettings, FilterSettings, GeneralSettings, LlmSettings, PromptSettings,
    ServerSettings, Settings, YoutubeSettings,
};
