//! `mordomo-locale` — the four supported response languages, phone-prefix
//! inference, timezone tables, and every user-facing template.
//!
//! Templates are plain functions over [`Lang`] so the compiler catches a
//! missing language; free-form text generation stays in the LLM layer.

pub mod commands;
pub mod lang;
pub mod templates;
pub mod tz;

pub use lang::{parse_language_switch_request, phone_to_default_language, Lang};
