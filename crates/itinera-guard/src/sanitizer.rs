//! Text sanitization for user-supplied trip fields.

use regex::Regex;

use crate::error::Result;

/// Maximum characters kept for a trip title.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum characters kept for a region.
pub const MAX_REGION_LEN: usize = 100;
/// Maximum characters kept for free-form notes.
pub const MAX_NOTES_LEN: usize = 2000;
/// Maximum characters kept for amendment text.
pub const MAX_AMENDMENTS_LEN: usize = 1000;

/// Fragments that should never reach a prompt verbatim, even after sanitization.
const UNSAFE_FRAGMENTS: &[&str] = &[
    "<script",
    "javascript:",
    "data:text/html",
    "vbscript:",
    "{{",
    "${",
    "<|",
];

/// Strips markup, control characters and noise from free text.
///
/// Patterns are compiled once in [`InputSanitizer::new`]; the sanitizer is
/// cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct InputSanitizer {
    control_chars: Regex,
    script_blocks: Regex,
    html_tags: Regex,
    symbol_runs: Regex,
    whitespace: Regex,
}

impl InputSanitizer {
    /// Compile the sanitizer patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            control_chars: Regex::new(r"[\p{Cc}&&[^\r\n\t]]")?,
            script_blocks: Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>")?,
            html_tags: Regex::new(r"(?s)</?[A-Za-z!][^>]*>")?,
            symbol_runs: Regex::new(r"[^\p{L}\p{M}\p{N}\p{Z}\p{P}\s]{10,}")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Sanitize `input` and truncate the result to `max_len` characters.
    pub fn sanitize(&self, input: &str, max_len: usize) -> String {
        let text = self.control_chars.replace_all(input, "");
        let text = self.script_blocks.replace_all(&text, "");
        let text = self.html_tags.replace_all(&text, "");
        let text = self.symbol_runs.replace_all(&text, "");
        let text = self.whitespace.replace_all(&text, " ");
        let trimmed = text.trim();

        if trimmed.chars().count() <= max_len {
            return trimmed.to_string();
        }
        tracing::debug!(max_len, "Truncating sanitized input");
        trimmed
            .chars()
            .take(max_len)
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    /// Sanitize a trip title.
    pub fn sanitize_title(&self, input: &str) -> String {
        self.sanitize(input, MAX_TITLE_LEN)
    }

    /// Sanitize a region name.
    pub fn sanitize_region(&self, input: &str) -> String {
        self.sanitize(input, MAX_REGION_LEN)
    }

    /// Sanitize free-form notes.
    pub fn sanitize_notes(&self, input: &str) -> String {
        self.sanitize(input, MAX_NOTES_LEN)
    }

    /// Sanitize amendment text.
    pub fn sanitize_amendments(&self, input: &str) -> String {
        self.sanitize(input, MAX_AMENDMENTS_LEN)
    }

    /// Sanitize a list of short strings.
    ///
    /// Keeps at most `max_items` input entries, sanitizes each to `max_len`
    /// characters, drops entries that end up empty and removes duplicates
    /// while preserving first-seen order.
    pub fn sanitize_string_list(
        &self,
        items: &[String],
        max_items: usize,
        max_len: usize,
    ) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(items.len().min(max_items));
        for item in items.iter().take(max_items) {
            let cleaned = self.sanitize(item, max_len);
            if !cleaned.is_empty() && !out.contains(&cleaned) {
                out.push(cleaned);
            }
        }
        out
    }

    /// Returns `false` when the text still carries markup or template syntax.
    pub fn is_safe_for_llm(&self, input: &str) -> bool {
        let lowered = input.to_lowercase();
        !UNSAFE_FRAGMENTS.iter().any(|f| lowered.contains(f))
    }
}
