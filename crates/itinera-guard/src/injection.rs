//! Prompt-injection screening.
//!
//! The detector grades text into a [`ThreatLevel`]. Callers decide the
//! policy; the server rejects `Medium` and above and only warns on `Low`.

use std::collections::HashSet;
use std::fmt;

use regex::{Regex, RegexSet};

use crate::error::Result;

/// Inputs longer than this are flagged as unusual.
pub const MAX_REASONABLE_LEN: usize = 10_000;

/// Severity of a detected pattern, ordered from harmless to hostile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ThreatLevel {
    /// Nothing suspicious.
    None,
    /// Unusual shape, worth a warning.
    Low,
    /// Likely an attempt to smuggle instructions.
    Medium,
    /// Explicit attempt to take over the model.
    High,
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThreatLevel::None => "none",
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
        };
        f.write_str(s)
    }
}

/// Result of screening one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Highest severity found.
    pub level: ThreatLevel,
    /// Which check fired, empty when clean.
    pub reason: String,
}

impl Detection {
    fn clean() -> Self {
        Self {
            level: ThreatLevel::None,
            reason: String::new(),
        }
    }

    fn new(level: ThreatLevel, reason: impl Into<String>) -> Self {
        Self {
            level,
            reason: reason.into(),
        }
    }

    /// True when anything at all was detected.
    pub fn is_threat(&self) -> bool {
        self.level > ThreatLevel::None
    }
}

const HIGH_RISK_PATTERNS: &[(&str, &str)] = &[
    (
        r"(?i)\b(ignore|disregard|forget|override)\b.{0,40}\b(previous|prior|above|earlier|all|any|your)\b.{0,40}\b(instructions?|prompts?|rules|directions|context)\b",
        "instruction override",
    ),
    (
        r"(?im)^\s*(system|assistant|developer)\s*:",
        "role marker",
    ),
    (
        r"(?i)<\|?(system|im_start|im_end|endoftext)\|?>|\[/?inst\]",
        "chat template token",
    ),
    (
        r"(?i)\b(you are now|from now on,? you|pretend (to be|you are)|new instructions)\b",
        "role reassignment",
    ),
    (
        r"(?i)(<script|javascript:|\beval\s*\(|\bexec\s*\(|\bimport\s+os\b|\bsubprocess\b|\brm\s+-rf\b|\bsudo\s+\w|```)",
        "code payload",
    ),
    (
        r"(?i)\b(jailbreak|dan mode|developer mode|do anything now)\b|\bbypass\s+(your|all|the|any)?\s*(safety|filters?|restrictions|guidelines|guardrails)\b|\breveal\s+(your|the)\s+(system\s+)?(prompt|instructions)\b",
        "jailbreak phrasing",
    ),
];

const SUSPICIOUS_WORDS: &[&str] = &[
    "ignore",
    "instructions",
    "system",
    "prompt",
    "override",
    "bypass",
    "admin",
    "execute",
    "command",
    "reveal",
    "password",
    "secret",
    "token",
    "root",
    "unrestricted",
    "uncensored",
];

/// Distinct suspicious words needed before the vocabulary check fires.
const SUSPICIOUS_WORD_THRESHOLD: usize = 4;
/// Consecutive repetitions of one word that count as a flooding attempt.
const REPEATED_WORD_THRESHOLD: usize = 4;
/// Length of a single-character run that counts as noise.
const REPEATED_CHAR_THRESHOLD: usize = 11;

/// Grades free text for prompt-injection patterns.
#[derive(Debug, Clone)]
pub struct PromptInjectionDetector {
    high_risk: RegexSet,
    base64_run: Regex,
    hex_run: Regex,
}

impl PromptInjectionDetector {
    /// Compile the detection patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            high_risk: RegexSet::new(HIGH_RISK_PATTERNS.iter().map(|(p, _)| *p))?,
            base64_run: Regex::new(r"[A-Za-z0-9+/]{24,}={0,2}")?,
            hex_run: Regex::new(r"\b(?:0x)?[0-9A-Fa-f]{20,}\b")?,
        })
    }

    /// Screen `input` and return the most severe finding.
    pub fn detect(&self, input: &str) -> Detection {
        if input.trim().is_empty() {
            return Detection::clean();
        }

        let matches = self.high_risk.matches(input);
        if let Some(idx) = matches.iter().next() {
            return Detection::new(ThreatLevel::High, HIGH_RISK_PATTERNS[idx].1);
        }
        if has_repeated_word(input) {
            return Detection::new(ThreatLevel::High, "repeated word flooding");
        }

        if self.has_encoded_payload(input) {
            return Detection::new(ThreatLevel::Medium, "encoded payload");
        }
        if suspicious_word_count(input) >= SUSPICIOUS_WORD_THRESHOLD {
            return Detection::new(ThreatLevel::Medium, "suspicious vocabulary density");
        }

        if input.chars().count() > MAX_REASONABLE_LEN {
            return Detection::new(ThreatLevel::Low, "excessive length");
        }
        if is_punctuation_heavy(input) || has_repeated_char(input) {
            return Detection::new(ThreatLevel::Low, "unusual character pattern");
        }

        Detection::clean()
    }

    fn has_encoded_payload(&self, input: &str) -> bool {
        let base64 = self.base64_run.find_iter(input).any(|m| {
            let s = m.as_str();
            s.ends_with('=')
                || (s.chars().any(|c| c.is_ascii_digit() || c == '+' || c == '/')
                    && s.chars().any(|c| c.is_ascii_uppercase())
                    && s.chars().any(|c| c.is_ascii_lowercase()))
        });
        if base64 {
            return true;
        }
        self.hex_run.find_iter(input).any(|m| {
            let s = m.as_str().trim_start_matches("0x");
            s.chars().any(|c| c.is_ascii_digit()) && s.chars().any(|c| c.is_ascii_alphabetic())
        })
    }
}

fn words(input: &str) -> impl Iterator<Item = String> + '_ {
    input
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

fn has_repeated_word(input: &str) -> bool {
    let mut prev = String::new();
    let mut run = 0usize;
    for word in words(input) {
        if word.chars().count() >= 3 && word == prev {
            run += 1;
            if run >= REPEATED_WORD_THRESHOLD {
                return true;
            }
        } else {
            run = 1;
        }
        prev = word;
    }
    false
}

fn suspicious_word_count(input: &str) -> usize {
    words(input)
        .filter(|w| SUSPICIOUS_WORDS.contains(&w.as_str()))
        .collect::<HashSet<_>>()
        .len()
}

fn is_punctuation_heavy(input: &str) -> bool {
    let visible: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();
    if visible.len() < 20 {
        return false;
    }
    let punct = visible.iter().filter(|c| c.is_ascii_punctuation()).count();
    punct * 2 > visible.len()
}

fn has_repeated_char(input: &str) -> bool {
    let mut prev = None;
    let mut run = 0usize;
    for c in input.chars() {
        if Some(c) == prev && !c.is_whitespace() {
            run += 1;
            if run >= REPEATED_CHAR_THRESHOLD {
                return true;
            }
        } else {
            run = 1;
        }
        prev = Some(c);
    }
    false
}
