//! Prompt templates for ToolScout.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

static VARIABLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex"));

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub keywords: KeywordPrompts,
    pub curation: CurationPrompts,
    pub translation: TranslationPrompts,
    pub chat: ChatPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for turning a user query into search phrases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordPrompts {
    pub system: String,
    pub user: String,
}

impl Default for KeywordPrompts {
    fn default() -> Self {
        Self {
            system: r#"You help people find AI-powered software tools by searching for video demonstrations of them.
You write short English search phrases for a video platform. The user may write in any language."#
                .to_string(),

            user: r#"Generate 3 to 5 short search phrases for finding videos that demonstrate a single AI tool for this need:

{{query}}

Rules:
- Each phrase should target a tutorial, demo or walkthrough of one specific tool
- Avoid phrases that lead to "top 10" lists or comparisons
- Write the phrases in English, 2 to 6 words each
- Output one phrase per line with no numbering and no extra text"#
                .to_string(),
        }
    }
}

/// Prompts for selecting relevant tools from video candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationPrompts {
    pub system: String,
    pub user: String,
}

impl Default for CurationPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a curator of AI tools. You review video search results and pick the videos that each demonstrate exactly one named, AI-powered product.

Selection rules:
- Only pick videos about a single tool. Reject lists, rankings, comparisons and roundups.
- Every pick must have a tool link: the official website of the tool, not the video URL.
- Never pick the same tool twice, even if several videos cover it.
- Pick at most {{max_tools}} videos. Fewer is fine. None is fine.
- Copy the videoLink exactly as given in the candidate list.

Respond by calling the select_tools function."#
                .to_string(),

            user: r#"User need: {{query}}

Candidate videos (JSON):
{{candidates}}"#
                .to_string(),
        }
    }
}

/// Prompts for translating display text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationPrompts {
    pub system: String,
    pub user: String,
}

impl Default for TranslationPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a translator. Translate the text you are given into {{language}}.
Keep product names, brand names and URLs unchanged. Output only the translated text."#
                .to_string(),

            user: "{{text}}".to_string(),
        }
    }
}

/// Prompts for the conversational layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    pub system: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a friendly assistant who helps people choose and use AI tools.

In this conversation:
- Answer questions about the tools listed below first, and say which one fits best and why
- Refer to tools by name and include their link when recommending one
- Remember earlier messages for follow-up questions
- If a question is about a tool that is not listed, say so honestly before giving general advice
- Keep answers short and practical
- Reply in the language the user writes in"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let keywords_path = custom_path.join("keywords.toml");
            if keywords_path.exists() {
                let content = std::fs::read_to_string(&keywords_path)?;
                prompts.keywords = toml::from_str(&content)?;
            }

            let curation_path = custom_path.join("curation.toml");
            if curation_path.exists() {
                let content = std::fs::read_to_string(&curation_path)?;
                prompts.curation = toml::from_str(&content)?;
            }

            let translation_path = custom_path.join("translation.toml");
            if translation_path.exists() {
                let content = std::fs::read_to_string(&translation_path)?;
                prompts.translation = toml::from_str(&content)?;
            }

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass over the template, so placeholders inside
    /// substituted values stay literal. Unknown placeholders are left as is.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        VARIABLE_REGEX
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
