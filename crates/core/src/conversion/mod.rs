//! Conversion orchestration.
//!
//! A `ConversionRequest` describes one call; the `ConversionOrchestrator`
//! turns it into an artifact at the target path by taking exactly one of:
//!
//! - **cache hit**: a cache key is set and the cache holds a usable entry
//! - **target reuse**: no cache key and a file already sits at the target path
//! - **remote convert**: everything else, or whenever `uncached` is set
//!
//! # Example
//!
//! ```ignore
//! use convertino_core::conversion::{ConversionOrchestrator, ConversionRequest};
//!
//! let orchestrator = ConversionOrchestrator::new(client, cache).with_audit(audit);
//!
//! let request = ConversionRequest::builder()
//!     .file("/docs/report.docx")
//!     .format("pdf")
//!     .cache_key("report-v3")
//!     .option("pages", "1-2")
//!     .build()?;
//!
//! let artifact = orchestrator.convert(&request).await?;
//! println!("{} via {}", artifact.path.display(), artifact.outcome);
//! ```

mod error;
mod options;
mod orchestrator;
mod request;
mod types;

pub use error::ConvertError;
pub use options::ConversionOptions;
pub use orchestrator::{ConversionOrchestrator, AUDIT_SCOPE};
pub use request::{ConversionRequest, ConversionRequestBuilder};
pub use types::{ConversionOutcome, ConvertedArtifact};
