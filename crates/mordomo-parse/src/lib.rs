//! `mordomo-parse` — deterministic parsing of dates, times, recurrence,
//! and the intent-classification ontology.
//!
//! Everything here is regex + table lookup: zero tokens spent. The parser
//! LLM only enters the picture for free-form analytic messages, via the
//! [`intent`] types.

pub mod calling;
pub mod intent;
pub mod normalize;
pub mod onboarding_time;
pub mod recurring;
pub mod time;

pub use intent::{EntityType, ExtractedEntity, IntentClassification, TaskType};
pub use recurring::{RecurringEnd, WeeklyPattern};
pub use time::TimeSpec;
