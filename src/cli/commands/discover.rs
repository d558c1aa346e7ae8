//! Discover command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::discovery::{DiscoveryOutcome, DiscoveryPipeline};
use anyhow::Result;
use console::style;
use serde::Serialize;

#[derive(Serialize)]
struct DiscoverOutput<'a> {
    query: &'a str,
    keywords: &'a [String],
    candidate_count: usize,
    tools: &'a [crate::discovery::CuratedTool],
}

/// Run the discover command.
pub async fn run_discover(
    query: &str,
    language: Option<String>,
    json: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Discover, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'toolscout doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let pipeline = DiscoveryPipeline::from_settings(&settings)?;

    let spinner = (!json).then(|| Output::spinner(&format!("Looking for tools: {}", query)));
    let outcome = pipeline.run(query, language.as_deref()).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let DiscoveryOutcome::Completed {
        keywords,
        candidates,
        tools,
    } = &outcome
    else {
        Output::warning("Empty query, nothing to search for.");
        return Ok(());
    };

    if json {
        let output = DiscoverOutput {
            query: query.trim(),
            keywords,
            candidate_count: candidates.len(),
            tools,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    Output::header("Keywords");
    for keyword in keywords {
        Output::list_item(keyword);
    }

    println!(
        "\n{}",
        style(format!("{} candidate videos reviewed", candidates.len())).dim()
    );

    if tools.is_empty() {
        Output::warning("No tools found. Try rephrasing the query.");
        return Ok(());
    }

    Output::header("Tools");
    for (i, tool) in tools.iter().enumerate() {
        Output::tool(i + 1, tool);
    }
    println!();

    Ok(())
}
