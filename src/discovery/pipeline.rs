//! Pipeline coordination for one discovery request.

use super::{Conversation, CuratedTool, KeywordGenerator, RelevanceCurator, Translator};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::llm::{LanguageModel, OpenAIModel};
use crate::video::{SearchClient, VideoCandidate, VideoFilter, VideoPlatform, YoutubeClient};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Result of one discovery run.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryOutcome {
    /// The query was empty; nothing was requested.
    Idle,
    Completed {
        keywords: Vec<String>,
        candidates: Vec<VideoCandidate>,
        tools: Vec<CuratedTool>,
    },
}

impl DiscoveryOutcome {
    /// Curated tools, empty when idle.
    pub fn tools(&self) -> &[CuratedTool] {
        match self {
            DiscoveryOutcome::Idle => &[],
            DiscoveryOutcome::Completed { tools, .. } => tools,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, DiscoveryOutcome::Idle)
    }
}

/// Keywords → search → curate → translate.
pub struct DiscoveryPipeline {
    keywords: KeywordGenerator,
    search: SearchClient,
    curator: RelevanceCurator,
    translator: Translator,
    conversation: Conversation,
    max_results: u32,
    search_batch_size: usize,
    batch_delay: Duration,
    default_language: Option<String>,
}

impl DiscoveryPipeline {
    /// Build the pipeline against OpenAI and YouTube.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let model: Arc<dyn LanguageModel> = Arc::new(OpenAIModel::with_config(&settings.llm)?);
        let platform: Arc<dyn VideoPlatform> = Arc::new(YoutubeClient::with_config(&settings.youtube)?);

        info!("Using {} for discovery, {} for chat", settings.llm.model, settings.llm.chat_model);

        Ok(Self::with_components(settings, prompts, model, platform))
    }

    /// Build the pipeline with custom components.
    pub fn with_components(
        settings: &Settings,
        prompts: Prompts,
        model: Arc<dyn LanguageModel>,
        platform: Arc<dyn VideoPlatform>,
    ) -> Self {
        let batch_delay = Duration::from_millis(settings.discovery.batch_delay_ms);
        let filter = VideoFilter::new(&settings.filters, settings.discovery.description_max_chars);

        Self {
            keywords: KeywordGenerator::new(model.clone()).with_prompts(prompts.clone()),
            search: SearchClient::new(platform, filter)
                .with_details_batch_size(settings.discovery.details_batch_size)
                .with_batch_delay(batch_delay),
            curator: RelevanceCurator::new(model.clone())
                .with_prompts(prompts.clone())
                .with_max_tools(settings.max_tools()),
            translator: Translator::new(model.clone()).with_prompts(prompts.clone()),
            conversation: Conversation::new(model).with_prompts(prompts),
            max_results: settings.youtube.max_results,
            search_batch_size: settings.discovery.search_batch_size.max(1),
            batch_delay,
            default_language: settings
                .discovery
                .default_language
                .clone()
                .filter(|l| !l.trim().is_empty()),
        }
    }

    /// The conversational layer sharing this pipeline's model and prompts.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Run discovery for a query. An empty query issues no calls.
    #[instrument(skip(self))]
    pub async fn run(&self, query: &str, language: Option<&str>) -> DiscoveryOutcome {
        let query = query.trim();
        if query.is_empty() {
            return DiscoveryOutcome::Idle;
        }

        let keywords = self.keywords.generate(query).await;
        if keywords.is_empty() {
            info!("No keywords generated for '{}'", query);
            return DiscoveryOutcome::Completed {
                keywords,
                candidates: Vec::new(),
                tools: Vec::new(),
            };
        }

        let candidates = self.search_all(&keywords).await;
        info!("{} keywords produced {} unique candidates", keywords.len(), candidates.len());

        let mut tools = self.curator.curate(query, &candidates).await;

        let language = language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .or(self.default_language.as_deref());
        if let Some(language) = language {
            tools = self.translator.translate_tools(tools, language).await;
        }

        DiscoveryOutcome::Completed {
            keywords,
            candidates,
            tools,
        }
    }

    /// Search every keyword in concurrent batches; dedup by video id in keyword order.
    pub async fn search_all(&self, keywords: &[String]) -> Vec<VideoCandidate> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for (i, batch) in keywords.chunks(self.search_batch_size).enumerate() {
            if i > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let results = join_all(
                batch
                    .iter()
                    .map(|keyword| self.search.search(keyword, self.max_results)),
            )
            .await;

            for candidate in results.into_iter().flatten() {
                if seen.insert(candidate.video_id.clone()) {
                    candidates.push(candidate);
                }
            }
        }

        candidates
    }
}
