//! OpenAI chat completion implementation.

use super::{FunctionSpec, LanguageModel};
use crate::config::LlmSettings;
use crate::error::{Result, ScoutError};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionNamedToolChoice, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolChoiceOption, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, FunctionName, FunctionObject,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI-backed language model.
pub struct OpenAIModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    chat_model: String,
    temperature: f32,
}

impl OpenAIModel {
    /// Create a model from settings.
    pub fn with_config(settings: &LlmSettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_secs))?,
            model: settings.model.clone(),
            chat_model: settings.chat_model.clone(),
            temperature: settings.temperature,
        })
    }

    fn messages(system: &str, user: &str) -> Result<Vec<ChatCompletionRequestMessage>> {
        Ok(vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| ScoutError::Llm(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| ScoutError::Llm(e.to_string()))?
                .into(),
        ])
    }

    async fn text_completion(
        &self,
        model: &str,
        temperature: f32,
        system: &str,
        user: &str,
    ) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(Self::messages(system, user)?)
            .temperature(temperature)
            .build()
            .map_err(|e| ScoutError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ScoutError::OpenAI(format!("Completion failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .unwrap_or_default();

        debug!(
            "Completion response: {}",
            content.chars().take(200).collect::<String>()
        );
        Ok(content)
    }
}

#[async_trait]
impl LanguageModel for OpenAIModel {
    #[instrument(skip_all)]
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        self.text_completion(&self.model, self.temperature, system, prompt)
            .await
    }

    #[instrument(skip(self, system, prompt), fields(function = %function.name))]
    async fn call_function(
        &self,
        system: &str,
        prompt: &str,
        function: &FunctionSpec,
    ) -> Result<Option<String>> {
        let tool = ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: function.name.clone(),
                description: Some(function.description.clone()),
                parameters: Some(function.parameters.clone()),
                strict: None,
            },
        };

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(Self::messages(system, prompt)?)
            .tools(vec![tool])
            .tool_choice(ChatCompletionToolChoiceOption::Named(
                ChatCompletionNamedToolChoice {
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionName {
                        name: function.name.clone(),
                    },
                },
            ))
            .temperature(0.0)
            .build()
            .map_err(|e| ScoutError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ScoutError::OpenAI(format!("Function call failed: {}", e)))?;

        let arguments = response
            .choices
            .first()
            .and_then(|c| c.message.tool_calls.as_ref())
            .and_then(|calls| calls.iter().find(|c| c.function.name == function.name))
            .map(|c| c.function.arguments.clone());

        Ok(arguments)
    }

    #[instrument(skip_all)]
    async fn converse(&self, system: &str, conversation: &str) -> Result<String> {
        self.text_completion(&self.chat_model, 0.7, system, conversation)
            .await
    }
}
