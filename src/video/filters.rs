//! Heuristic filters and formatting for video search results.

use crate::config::FilterSettings;

/// Placeholder used when a description has no usable text.
pub const NO_DESCRIPTION: &str = "No description available";

/// Descriptions shorter than this look past the first usable line.
const MIN_DESCRIPTION_CHARS: usize = 50;

/// Keyword filters and description cleanup for search hits.
#[derive(Debug, Clone)]
pub struct VideoFilter {
    deny_phrases: Vec<String>,
    allow_keywords: Vec<String>,
    promotional_phrases: Vec<String>,
    description_max_chars: usize,
}

fn lowercased(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.to_lowercase())
        .filter(|s| !s.trim().is_empty())
        .collect()
}

impl VideoFilter {
    pub fn new(settings: &FilterSettings, description_max_chars: usize) -> Self {
        Self {
            deny_phrases: lowercased(&settings.deny_phrases),
            allow_keywords: lowercased(&settings.allow_keywords),
            promotional_phrases: lowercased(&settings.promotional_phrases),
            description_max_chars: description_max_chars.max(16),
        }
    }

    /// True if the title reads like a listicle or comparison.
    pub fn is_listicle(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.deny_phrases.iter().any(|p| title.contains(p.as_str()))
    }

    /// True if title or description mention at least one AI keyword.
    pub fn is_ai_related(&self, title: &str, description: &str) -> bool {
        let text = format!("{} {}", title, description).to_lowercase();
        self.allow_keywords.iter().any(|k| text.contains(k.as_str()))
    }

    /// Apply both filters.
    pub fn accepts(&self, title: &str, description: &str) -> bool {
        !self.is_listicle(title) && self.is_ai_related(title, description)
    }

    fn is_promotional(&self, line: &str) -> bool {
        let line = line.to_lowercase();
        self.promotional_phrases.iter().any(|p| line.contains(p.as_str()))
    }

    /// Pick the first non-promotional description line and shorten it.
    ///
    /// A short result is replaced by the first non-promotional line after the
    /// opening one, which skips a bare title line above the real description.
    pub fn clean_description(&self, description: &str) -> String {
        let lines: Vec<&str> = description
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let Some(chosen) = lines
            .iter()
            .find(|l| !self.is_promotional(l))
            .or_else(|| lines.first())
        else {
            return NO_DESCRIPTION.to_string();
        };

        let cleaned = truncate_at_boundary(&decode_entities(chosen), self.description_max_chars);
        if cleaned.chars().count() >= MIN_DESCRIPTION_CHARS {
            return cleaned;
        }

        match lines.iter().skip(1).find(|l| !self.is_promotional(l)) {
            Some(line) => truncate_at_boundary(&decode_entities(line), self.description_max_chars),
            None => cleaned,
        }
    }
}

/// Format a raw view count for display.
pub fn format_view_count(count: u64) -> String {
    // Tenths of a thousand, as the K label would round them.
    let tenths_of_k = (count as f64 / 100.0).round();
    if count < 1_000 {
        format!("{} views", count)
    } else if tenths_of_k < 10_000.0 {
        format!("{:.1}K views", tenths_of_k / 10.0)
    } else {
        format!("{:.1}M views", count as f64 / 1_000_000.0)
    }
}

/// Shorten text to at most `max_chars` characters.
///
/// Prefers a sentence end (`.`, `!` or `?` followed by whitespace) in the
/// second half of the window. Otherwise cuts at a word boundary and appends
/// `...` within the same limit.
pub(crate) fn truncate_at_boundary(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }

    let sentence_end = (max_chars / 2..max_chars).rev().find(|&i| {
        matches!(chars[i], '.' | '!' | '?') && chars.get(i + 1).is_some_and(|c| c.is_whitespace())
    });
    if let Some(idx) = sentence_end {
        return chars[..=idx].iter().collect::<String>().trim_end().to_string();
    }

    let budget = max_chars.saturating_sub(ELLIPSIS.len());
    let window = &chars[..budget];
    let head: String = match window.iter().rposition(|c| c.is_whitespace()) {
        Some(idx) if idx > 0 => window[..idx].iter().collect(),
        _ => window.iter().collect(),
    };
    format!("{}{}", head.trim_end(), ELLIPSIS)
}

const ELLIPSIS: &str = "...";

/// Decode the HTML entities the search API leaves in snippets.
pub(crate) fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
