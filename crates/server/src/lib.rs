//! HTTP surface of the convertino conversion service.
//!
//! The binary in `main.rs` wires configuration and collaborators together;
//! everything reachable from the router lives here so it can be driven
//! in-process by the integration tests.

pub mod api;
pub mod delivery;
pub mod files;
pub mod metrics;
pub mod state;
