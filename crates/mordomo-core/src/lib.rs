//! `mordomo-core` — shared types, configuration, paths, and the message bus.
//!
//! Everything here is transport- and storage-agnostic: the bus carries
//! normalised messages between the WhatsApp adapter, the agent loop, and the
//! scheduler; the config is the single figment-backed source of truth for
//! every other crate.

pub mod bus;
pub mod config;
pub mod error;
pub mod paths;
pub mod types;

pub use bus::MessageBus;
pub use config::MordomoConfig;
pub use error::{MordomoError, Result};
pub use types::{ChatRef, InboundMessage, OutboundMessage, Reaction};
