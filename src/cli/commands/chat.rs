//! Interactive chat command.
//!
//! Runs one discovery, then answers questions grounded in the curated tools.
//! `search <query>` starts a new discovery in the same session.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::discovery::DiscoveryPipeline;
use crate::session::DiscoverySession;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Run the interactive chat command.
pub async fn run_chat(query: Option<String>, language: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Discover, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'toolscout doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let pipeline = DiscoveryPipeline::from_settings(&settings)?;
    let session = DiscoverySession::new();
    debug!("Chat session {}", session.id());

    println!("\n{}", style("ToolScout Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about the tools, 'search <query>' to look again, 'clear' to reset the conversation, 'exit' to quit.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    let query = match query.filter(|q| !q.trim().is_empty()) {
        Some(q) => q,
        None => {
            print!("{} ", style("What do you want to do?").green().bold());
            stdout.flush()?;
            let mut input = String::new();
            stdin.lock().read_line(&mut input)?;
            input.trim().to_string()
        }
    };

    search(&pipeline, &session, &query, language.as_deref()).await;

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session.clear_transcript().await;
            Output::info("Conversation history cleared.");
            continue;
        }

        if let Some(query) = input.strip_prefix("search ") {
            search(&pipeline, &session, query, language.as_deref()).await;
            continue;
        }

        let reply = session.chat(pipeline.conversation(), input).await;
        if reply.is_empty() {
            Output::warning("No reply. Try asking again.");
        } else {
            println!("\n{} {}\n", style("Bot:").cyan().bold(), reply);
        }
    }

    Ok(())
}

async fn search(pipeline: &DiscoveryPipeline, session: &DiscoverySession, query: &str, language: Option<&str>) {
    if query.trim().is_empty() {
        Output::warning("Empty query, nothing to search for.");
        return;
    }

    let ticket = session.begin_search();
    let spinner = Output::spinner(&format!("Looking for tools: {}", query.trim()));
    let outcome = pipeline.run(query, language).await;
    spinner.finish_and_clear();

    if !session.apply(ticket, query, &outcome).await {
        return;
    }

    let tools = outcome.tools();
    if tools.is_empty() {
        Output::warning("No tools found. Try 'search' with a different query.");
        return;
    }

    Output::header("Tools");
    for (i, tool) in tools.iter().enumerate() {
        Output::tool(i + 1, tool);
    }
    println!();
}
