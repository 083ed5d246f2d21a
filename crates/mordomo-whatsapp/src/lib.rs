//! `mordomo-whatsapp` — adapter for the external WhatsApp bridge.
//!
//! The bridge exposes a WebSocket producing normalised inbound events and
//! consuming outbound sends. This crate turns bridge frames into
//! [`InboundMessage`]s (dropping groups, resolving reactions back to job
//! ids) and drains the outbound queue to the socket.

pub mod adapter;
pub mod wire;

pub use adapter::{run_bridge, BridgeError};
