//! Keyword generation: user query to search phrases.

use crate::config::Prompts;
use crate::llm::LanguageModel;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Expands a free-text query into short search phrases.
pub struct KeywordGenerator {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
}

impl KeywordGenerator {
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

    /// Generate search phrases. Model failures are logged and yield no phrases.
    #[instrument(skip(self))]
    pub async fn generate(&self, query: &str) -> Vec<String> {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.trim().to_string());

        let system = self.prompts.render_with_custom(&self.prompts.keywords.system, &vars);
        let user = self.prompts.render_with_custom(&self.prompts.keywords.user, &vars);

        match self.model.complete(&system, &user).await {
            Ok(response) => {
                let keywords = parse_keywords(&response);
                debug!("Generated keywords: {:?}", keywords);
                keywords
            }
            Err(e) => {
                warn!("Keyword generation failed: {}", e);
                Vec::new()
            }
        }
    }
}

/// Split a model response into one phrase per line.
pub(crate) fn parse_keywords(response: &str) -> Vec<String> {
    response
        .lines()
        .map(clean_line)
        .filter(|l| !l.is_empty())
        .collect()
}

fn clean_line(line: &str) -> String {
    let line = line.trim();
    let line = line.trim_start_matches(['-', '*', '•']).trim_start();
    // "1. x" and "2) x" are list markers, "3.5 sonnet" is not.
    let line = match line.find(['.', ')']) {
        Some(idx)
            if idx > 0
                && line[..idx].chars().all(|c| c.is_ascii_digit())
                && line[idx + 1..].chars().next().is_none_or(char::is_whitespace) =>
        {
            line[idx + 1..].trim_start()
        }
        _ => line,
    };
    line.trim_matches(['"', '\'', '`']).trim().to_string()
}
