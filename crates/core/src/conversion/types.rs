//! Types for conversion results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which path produced the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// Copied from a cache entry.
    CacheHit,
    /// A file was already present at the target path.
    TargetReuse,
    /// Converted by the remote backend.
    RemoteConvert,
}

impl ConversionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheHit => "cache_hit",
            Self::TargetReuse => "target_reuse",
            Self::RemoteConvert => "remote_convert",
        }
    }
}

impl std::fmt::Display for ConversionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one successful conversion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub outcome: ConversionOutcome,
    /// Whether this call wrote the artifact into the cache.
    pub cached: bool,
    pub duration_ms: u64,
}
