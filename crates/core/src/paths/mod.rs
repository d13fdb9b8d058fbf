//! Filesystem paths for conversion outputs.
//!
//! - `PathResolver` picks the target path and prepares its directory
//! - `atomic` holds the write-then-rename helpers shared by the cache and the orchestrator

pub mod atomic;
mod resolver;

pub use resolver::{default_target, normalize_format, PathResolver};
