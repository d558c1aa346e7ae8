//! Doctor command - verify API keys and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::discovery::MAX_TOOLS;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: Option<&str>) -> anyhow::Result<()> {
    Output::header("ToolScout Doctor");
    println!();
    println!("Checking API keys and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Keys").bold());
    let key_checks = vec![
        check_openai_api_key(std::env::var("OPENAI_API_KEY").ok().as_deref()),
        check_youtube_api_key(settings),
    ];
    for check in &key_checks {
        check.print();
    }
    checks.extend(key_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let path = config_path
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let config_checks = vec![
        check_config_file(&path),
        check_prompts_dir(settings),
        check_discovery_limits(settings),
    ];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using ToolScout.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! ToolScout is ready to use.");
    }

    Ok(())
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(7).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key(key: Option<&str>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask(key)))
        }
        Some("") => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check if a YouTube Data API key is available from config or environment.
fn check_youtube_api_key(settings: &Settings) -> CheckResult {
    let source = if settings.youtube.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        "config"
    } else {
        "YOUTUBE_API_KEY"
    };

    match settings.youtube.resolve_api_key() {
        Some(key) if key.len() > 11 => {
            CheckResult::ok("YouTube API key", &format!("configured via {} ({})", source, mask(&key)))
        }
        Some(_) => CheckResult::warning(
            "YouTube API key",
            "set but looks too short",
            "Create a key at https://console.cloud.google.com/apis/credentials",
        ),
        None => CheckResult::error(
            "YouTube API key",
            "not set",
            "Set youtube.api_key in the config or export YOUTUBE_API_KEY",
        ),
    }
}

/// Check if config file exists.
fn check_config_file(path: &Path) -> CheckResult {
    if path.exists() {
        CheckResult::ok("Config file", &format!("{}", path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: toolscout config edit",
        )
    }
}

/// Check the custom prompts directory, if one is configured.
fn check_prompts_dir(settings: &Settings) -> CheckResult {
    match &settings.prompts.custom_dir {
        None => CheckResult::ok("Prompts", "built-in templates"),
        Some(dir) => {
            let path = Settings::expand_path(dir);
            if path.is_dir() {
                CheckResult::ok("Prompts", &format!("custom templates in {}", path.display()))
            } else {
                CheckResult::warning(
                    "Prompts",
                    &format!("{} not found, using built-in templates", path.display()),
                    "Fix prompts.custom_dir or create the directory",
                )
            }
        }
    }
}

/// Check discovery limits for values that get clamped.
fn check_discovery_limits(settings: &Settings) -> CheckResult {
    let configured = settings.discovery.max_tools;
    if configured == 0 || configured > MAX_TOOLS {
        CheckResult::warning(
            "Discovery",
            &format!("max_tools = {} will be clamped to {}", configured, settings.max_tools()),
            &format!("Use a value between 1 and {}", MAX_TOOLS),
        )
    } else {
        CheckResult::ok(
            "Discovery",
            &format!(
                "up to {} tools, {} results per keyword",
                configured, settings.youtube.max_results
            ),
        )
    }
}
