//! Remote conversion backend.
//!
//! This module provides the `ConversionClient` trait and a CloudConvert v2
//! implementation. A conversion is one job of three tasks:
//!
//! - `import-file`: the source bytes, inlined as base64 or uploaded to a signed form
//! - `convert-file`: `operation = "convert"` plus the caller's options
//! - `export-file`: `export/url`, whose result carries the download URL
//!
//! # Example
//!
//! ```ignore
//! use convertino_core::cloudconvert::{CloudConvertClient, CloudConvertConfig, ConversionClient, RemoteJob};
//!
//! let client = CloudConvertClient::new(CloudConvertConfig::with_api_key("..."))?;
//! let stream = client
//!     .convert(RemoteJob {
//!         source: PathBuf::from("/docs/report.docx"),
//!         output_format: "pdf".to_string(),
//!         options: ConversionOptions::new(),
//!         sandbox: false,
//!     })
//!     .await?;
//! ```

mod client;
mod config;
mod error;
mod traits;
mod types;

pub use client::CloudConvertClient;
pub use config::{CloudConvertConfig, ImportMethod};
pub use error::ClientError;
pub use traits::ConversionClient;
pub use types::{
    build_job_payload, AccountInfo, ExportedFile, JobData, RemoteJob, ResultStream, TaskData,
    TaskResult, UploadForm, CONVERT_TASK, EXPORT_TASK, IMPORT_TASK,
};
