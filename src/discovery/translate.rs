//! Per-field translation of display text.

use super::CuratedTool;
use crate::config::Prompts;
use crate::llm::LanguageModel;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Rewrites titles and summaries into a display language.
pub struct Translator {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
}

impl Translator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Translate one field. Returns the original text on failure.
    pub async fn translate(&self, text: &str, language: &str) -> String {
        if text.trim().is_empty() || language.trim().is_empty() {
            return text.to_string();
        }

        let mut vars = HashMap::new();
        vars.insert("language".to_string(), language.trim().to_string());
        vars.insert("text".to_string(), text.to_string());

        let system = self.prompts.render_with_custom(&self.prompts.translation.system, &vars);
        let user = self.prompts.render_with_custom(&self.prompts.translation.user, &vars);

        match self.model.complete(&system, &user).await {
            Ok(translated) if !translated.trim().is_empty() => translated.trim().to_string(),
            Ok(_) => {
                debug!("Empty translation, keeping original");
                text.to_string()
            }
            Err(e) => {
                warn!("Translation to {} failed: {}", language, e);
                text.to_string()
            }
        }
    }

    /// Translate title and summary of every tool, one call per field.
    pub async fn translate_tools(&self, tools: Vec<CuratedTool>, language: &str) -> Vec<CuratedTool> {
        let mut translated = Vec::with_capacity(tools.len());
        for mut tool in tools {
            tool.title = self.translate(&tool.title, language).await;
            tool.summary = self.translate(&tool.summary, language).await;
            translated.push(tool);
        }
        translated
    }
}
