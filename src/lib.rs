//! ToolScout - AI tool discovery
//!
//! Turns a free-form request ("photo editing tools", "quitar fondo de fotos")
//! into a short list of AI tools, each with a demonstration video and a link
//! to the tool itself, then answers follow-up questions about that list.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `llm` - Language model abstraction (OpenAI)
//! - `video` - Video platform abstraction (YouTube), filtering and search
//! - `discovery` - Keyword generation, curation, translation and conversation
//! - `session` - Per-session state with stale-result protection
//! - `cli` - Command line interface and HTTP API
//!
//! # Example
//!
//! ```rust,no_run
//! use toolscout::config::Settings;
//! use toolscout::discovery::DiscoveryPipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = DiscoveryPipeline::from_settings(&settings)?;
//!
//!     let outcome = pipeline.run("photo editing tools", None).await;
//!     for tool in outcome.tools() {
//!         println!("{} - {}", tool.title, tool.tool_link);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod llm;
pub mod openai;
pub mod session;
pub mod video;

pub use error::{Result, ScoutError};
