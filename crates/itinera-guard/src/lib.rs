//! # itinera-guard
//!
//! Screening for user text that ends up inside language-model prompts.
//!
//! Two independent pieces:
//!
//! - [`InputSanitizer`] strips control characters, script blocks, HTML tags
//!   and symbol noise, normalizes whitespace and enforces per-field length
//!   limits.
//! - [`PromptInjectionDetector`] grades text into a [`ThreatLevel`] based on
//!   instruction-override phrasing, role markers, code payloads, encoded
//!   blobs and flooding patterns.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use itinera_guard::{InputSanitizer, PromptInjectionDetector, ThreatLevel};
//!
//! let sanitizer = InputSanitizer::new()?;
//! let detector = PromptInjectionDetector::new()?;
//!
//! let title = sanitizer.sanitize_title("<b>Summer in Porto</b>");
//! assert_eq!(title, "Summer in Porto");
//! assert_eq!(detector.detect(&title).level, ThreatLevel::None);
//! ```
//!
//! Both types hold compiled patterns only and are safe to share across
//! threads.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod injection;
pub mod sanitizer;

// Re-exports for convenience
pub use error::{Error, Result};
pub use injection::{Detection, PromptInjectionDetector, ThreatLevel};
pub use sanitizer::{
    InputSanitizer, MAX_AMENDMENTS_LEN, MAX_NOTES_LEN, MAX_REGION_LEN, MAX_TITLE_LEN,
};
