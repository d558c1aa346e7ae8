//! AI tool discovery pipeline.
//!
//! A user query flows through the stages in order:
//!
//! 1. `KeywordGenerator` expands it into search phrases
//! 2. `SearchClient` (in `video`) finds and filters candidate videos per phrase
//! 3. `RelevanceCurator` selects at most five single-tool videos
//! 4. `Translator` optionally rewrites titles and summaries
//!
//! `Conversation` then answers follow-up questions grounded on the result.

mod conversation;
mod curator;
mod keywords;
mod pipeline;
mod translate;

pub use conversation::Conversation;
pub use curator::{RelevanceCurator, MAX_TOOLS};
pub use keywords::KeywordGenerator;
pub use pipeline::{DiscoveryOutcome, DiscoveryPipeline};
pub use translate::Translator;

use serde::{Deserialize, Serialize};

/// A video about exactly one AI tool, with the tool's own link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuratedTool {
    pub title: String,
    pub summary: String,
    /// External URL of the tool itself.
    pub tool_link: String,
    pub video_link: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    /// Prefix used when flattening a transcript.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Bot => "Bot",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Bot => write!(f, "bot"),
        }
    }
}

/// One message in a session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
        }
    }

    pub fn bot(content: &str) -> Self {
        Self {
            role: Role::Bot,
            content: content.to_string(),
        }
    }
}
