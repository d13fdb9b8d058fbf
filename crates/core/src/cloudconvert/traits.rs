//! Trait definitions for conversion backends.

use async_trait::async_trait;

use super::error::ClientError;
use super::types::{AccountInfo, RemoteJob, ResultStream};

/// A remote service that converts files.
#[async_trait]
pub trait ConversionClient: Send + Sync {
    /// Returns the name of this client implementation.
    fn name(&self) -> &str;

    /// Runs one job to completion and returns the converted bytes.
    ///
    /// The stream is lazy: nothing is downloaded until it is polled.
    async fn convert(&self, job: RemoteJob) -> Result<ResultStream, ClientError>;

    /// Fetches the account behind the configured (or sandbox) API key.
    async fn current_user(&self, sandbox: bool) -> Result<AccountInfo, ClientError>;
}
