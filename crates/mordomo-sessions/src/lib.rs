//! `mordomo-sessions` — per-chat conversation history with bounded size.
//!
//! One JSON file per session key under `session/`, written atomically
//! (temp file + rename). When the history reaches 45 messages the first 25
//! are replaced by a single summary message; the summarisation text itself
//! comes from the agent loop, this crate only provides the mechanics.

pub mod error;
pub mod manager;
pub mod types;

pub use error::{Result, SessionError};
pub use manager::SessionManager;
pub use types::{Session, SessionMessage, COMPRESS_BATCH, COMPRESS_THRESHOLD};
