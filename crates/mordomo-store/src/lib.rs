//! `mordomo-store` — SQLite persistence for users, lists, events, audit log,
//! reminder history, bookmarks, notes, and the small organisation tables.
//!
//! One connection behind a `Mutex`; multi-statement mutations (item + audit,
//! event + audit) run inside transactions so a cancelled turn never leaves a
//! half-applied change.

pub mod db;
pub mod error;
pub mod manager;
pub mod types;

pub use error::{Result, StoreError};
pub use manager::Store;
pub use types::{AuditEntry, Event, List, ListItem, User};
