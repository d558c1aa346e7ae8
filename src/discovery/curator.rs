//! Relevance curation: pick single-tool videos with a tool link.

use super::CuratedTool;
use crate::config::Prompts;
use crate::error::{Result, ScoutError};
use crate::llm::{FunctionSpec, LanguageModel};
use crate::video::{extract_video_id, VideoCandidate};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Hard upper bound on curated tools per run.
pub const MAX_TOOLS: usize = 5;

const FUNCTION_NAME: &str = "select_tools";

/// Selects a bounded, deduplicated set of tool videos from candidates.
pub struct RelevanceCurator {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    max_tools: usize,
}

#[derive(Debug, Deserialize)]
struct Selection {
    #[serde(default)]
    tools: Vec<SelectedTool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectedTool {
    #[serde(default)]
    title: String,
    #[serde(default)]
    video_link: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    tool_link: String,
}

/// Candidate as shown to the model.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptCandidate<'a> {
    title: &'a str,
    description: &'a str,
    video_link: &'a str,
    channel: &'a str,
    views: &'a str,
}

impl RelevanceCurator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            prompts: Prompts::default(),
            max_tools: MAX_TOOLS,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the tool cap (never above `MAX_TOOLS`).
    pub fn with_max_tools(mut self, max_tools: usize) -> Self {
        self.max_tools = max_tools.clamp(1, MAX_TOOLS);
        self
    }

    /// JSON schema the model must fill.
    pub fn function_spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: FUNCTION_NAME.to_string(),
            description: "Return the selected single-tool videos.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "tools": {
                        "type": "array",
                        "maxItems": self.max_tools,
                        "items": {
                            "type": "object",
                            "properties": {
                                "title": {
                                    "type": "string",
                                    "description": "Name of the tool followed by a short headline"
                                },
                                "videoLink": {
                                    "type": "string",
                                    "description": "The video URL exactly as given in the candidate list"
                                },
                                "summary": {
                                    "type": "string",
                                    "description": "One or two sentences on what the tool does"
                                },
                                "toolLink": {
                                    "type": "string",
                                    "description": "Official website of the tool"
                                }
                            },
                            "required": ["title", "videoLink", "summary", "toolLink"]
                        }
                    }
                },
                "required": ["tools"]
            }),
        }
    }

    /// Curate candidates. Failures are logged and yield no tools.
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub async fn curate(&self, query: &str, candidates: &[VideoCandidate]) -> Vec<CuratedTool> {
        if candidates.is_empty() {
            return Vec::new();
        }

        match self.try_curate(query, candidates).await {
            Ok(tools) => {
                info!("Curated {} tools from {} candidates", tools.len(), candidates.len());
                tools
            }
            Err(e) => {
                warn!("Curation failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_curate(&self, query: &str, candidates: &[VideoCandidate]) -> Result<Vec<CuratedTool>> {
        let listing: Vec<PromptCandidate> = candidates
            .iter()
            .map(|c| PromptCandidate {
                title: &c.title,
                description: &c.description,
                video_link: &c.url,
                channel: &c.channel,
                views: &c.views,
            })
            .collect();

        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.trim().to_string());
        vars.insert("max_tools".to_string(), self.max_tools.to_string());
        vars.insert("candidates".to_string(), serde_json::to_string_pretty(&listing)?);

        let system = self.prompts.render_with_custom(&self.prompts.curation.system, &vars);
        let user = self.prompts.render_with_custom(&self.prompts.curation.user, &vars);

        let arguments = self
            .model
            .call_function(&system, &user, &self.function_spec())
            .await?;

        let Some(arguments) = arguments else {
            debug!("Model returned no function call");
            return Ok(Vec::new());
        };

        let selection: Selection = serde_json::from_str(&arguments)
            .map_err(|e| ScoutError::Llm(format!("Malformed curation arguments: {}", e)))?;

        Ok(finalize(selection.tools, candidates, self.max_tools))
    }
}

/// Drop link-less entries, dedup by tool link, cap, and reconcile video links.
fn finalize(
    selected: Vec<SelectedTool>,
    candidates: &[VideoCandidate],
    max_tools: usize,
) -> Vec<CuratedTool> {
    let by_id: HashMap<&str, &VideoCandidate> =
        candidates.iter().map(|c| (c.video_id.as_str(), c)).collect();

    let mut seen_links = HashSet::new();
    let mut tools = Vec::new();

    for entry in selected {
        let tool_link = entry.tool_link.trim().to_string();
        if tool_link.is_empty() {
            debug!("Dropping '{}' without tool link", entry.title);
            continue;
        }
        if !seen_links.insert(normalize_link(&tool_link)) {
            debug!("Dropping duplicate tool link {}", tool_link);
            continue;
        }

        let matched = extract_video_id(&entry.video_link).and_then(|id| by_id.get(id.as_str()).copied());

        let tool = match matched {
            Some(candidate) => CuratedTool {
                title: entry.title.trim().to_string(),
                summary: entry.summary.trim().to_string(),
                tool_link,
                video_link: candidate.url.clone(),
                description: Some(candidate.description.clone()),
                url: Some(candidate.url.clone()),
            },
            None => CuratedTool {
                title: entry.title.trim().to_string(),
                summary: entry.summary.trim().to_string(),
                tool_link,
                video_link: entry.video_link.trim().to_string(),
                description: None,
                url: None,
            },
        };
        tools.push(tool);

        if tools.len() >= max_tools {
            break;
        }
    }

    tools
}

/// Normalize a tool link for identity comparison.
pub(crate) fn normalize_link(link: &str) -> String {
    let lowered = link.trim().to_lowercase();
    let parsed = url::Url::parse(&lowered)
        .or_else(|_| url::Url::parse(&format!("https://{}", lowered)));

    match parsed {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default();
            let host = host.strip_prefix("www.").unwrap_or(host);
            format!("{}{}", host, url.path().trim_end_matches('/'))
        }
        Err(_) => lowered.trim_end_matches('/').to_string(),
    }
}
