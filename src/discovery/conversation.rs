//! Conversational layer grounded on the curated tool list.

use super::{ConversationTurn, CuratedTool, Role};
use crate::config::Prompts;
use crate::llm::LanguageModel;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Answers follow-up questions about curated tools.
pub struct Conversation {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
}

impl Conversation {
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

    /// Persona prompt followed by one line per tool.
    pub fn system_instruction(&self, tools: &[CuratedTool]) -> String {
        let persona = self
            .prompts
            .render_with_custom(&self.prompts.chat.system, &Default::default());

        if tools.is_empty() {
            return format!("{}\n\nNo tools have been found yet.", persona);
        }

        let lines = tools
            .iter()
            .map(|t| {
                format!(
                    "- {}: {} (tool: {}, video: {})",
                    t.title, t.summary, t.tool_link, t.video_link
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!("{}\n\nAvailable tools:\n{}", persona, lines)
    }

    /// Flatten prior turns plus the new message into role-prefixed lines.
    pub fn flatten(transcript: &[ConversationTurn], message: &str) -> String {
        transcript
            .iter()
            .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
            .chain(std::iter::once(format!("{}: {}", Role::User.label(), message)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Produce a reply. Model failures are logged and yield an empty reply.
    #[instrument(skip(self, tools, transcript), fields(turns = transcript.len()))]
    pub async fn reply(
        &self,
        tools: &[CuratedTool],
        transcript: &[ConversationTurn],
        message: &str,
    ) -> String {
        let system = self.system_instruction(tools);
        let conversation = Self::flatten(transcript, message);

        match self.model.converse(&system, &conversation).await {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                warn!("Chat reply failed: {}", e);
                String::new()
            }
        }
    }
}
