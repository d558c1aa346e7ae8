//! Language model abstraction.
//!
//! The discovery stages talk to the model through three call shapes: plain
//! completion (keywords, translation), function calling (curation) and
//! conversation (chat).

mod openai;

pub use openai::OpenAIModel;

use crate::error::Result;
use async_trait::async_trait;

/// A function the model is forced to call, described by a JSON schema.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Trait for language model providers.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Plain-text completion.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    /// Schema-constrained completion. Returns the raw JSON arguments of the
    /// function call, or None if the model did not call the function.
    async fn call_function(
        &self,
        system: &str,
        prompt: &str,
        function: &FunctionSpec,
    ) -> Result<Option<String>>;

    /// Conversational reply given a system block and a flattened transcript.
    async fn converse(&self, system: &str, conversation: &str) -> Result<String>;
}
