//! Documentation synthesis via an external text-generation endpoint.
//!
//! This crate provides:
//! - [`DocSynthesizer`]: one best-effort generation call per file
//! - [`Synthesis`]: generated text, or a placeholder plus the error behind it
//! - [`build_prompt`] / [`placeholder`]: the deterministic text around the call

mod prompt;
mod protocol;
mod synthesizer;

pub use prompt::{PLACEHOLDER_MARKER, build_prompt, placeholder, truncate_content};
pub use synthesizer::{DocSynthesizer, Synthesis};
