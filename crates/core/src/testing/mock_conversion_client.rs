//! Mock conversion client for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cloudconvert::{AccountInfo, ClientError, ConversionClient, RemoteJob, ResultStream};

/// Mock implementation of the ConversionClient trait.
///
/// Provides controllable behavior for testing:
/// - Track submitted jobs for assertions
/// - Simulate failures and empty results
/// - Control the converted bytes and account info
///
/// # Example
///
/// ```rust,ignore
/// use convertino_core::testing::MockConversionClient;
///
/// let client = Arc::new(MockConversionClient::new());
/// client.set_output(b"%PDF-1.4".to_vec()).await;
///
/// let orchestrator = ConversionOrchestrator::new(client.clone(), cache);
/// orchestrator.convert(&request).await?;
///
/// assert_eq!(client.convert_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockConversionClient {
    /// Jobs passed to `convert`, including failed ones.
    jobs: Arc<RwLock<Vec<RemoteJob>>>,
    /// Bytes returned by `convert`; `None` derives them from the job.
    output: Arc<RwLock<Option<Vec<u8>>>>,
    /// Number of chunks the output is split into.
    chunks: Arc<RwLock<usize>>,
    /// If set, the next `convert` will fail with this error.
    next_error: Arc<RwLock<Option<ClientError>>>,
    account: Arc<RwLock<AccountInfo>>,
    /// If set, the next `current_user` will fail with this error.
    next_account_error: Arc<RwLock<Option<ClientError>>>,
    account_calls: Arc<RwLock<usize>>,
}

impl Default for MockConversionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConversionClient {
    /// Create a new mock client.
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            output: Arc::new(RwLock::new(None)),
            chunks: Arc::new(RwLock::new(2)),
            next_error: Arc::new(RwLock::new(None)),
            account: Arc::new(RwLock::new(AccountInfo {
                username: "mock-user".to_string(),
                email: "mock@example.com".to_string(),
                credits: 1000,
            })),
            next_account_error: Arc::new(RwLock::new(None)),
            account_calls: Arc::new(RwLock::new(0)),
        }
    }

    /// Get all submitted jobs.
    pub async fn recorded_jobs(&self) -> Vec<RemoteJob> {
        self.jobs.read().await.clone()
    }

    /// Get the number of `convert` calls.
    pub async fn convert_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Get the number of `current_user` calls.
    pub async fn account_call_count(&self) -> usize {
        *self.account_calls.read().await
    }

    /// Fix the bytes every conversion returns. An empty vec yields an empty stream.
    pub async fn set_output(&self, bytes: Vec<u8>) {
        *self.output.write().await = Some(bytes);
    }

    /// Split the output into this many chunks (at least one).
    pub async fn set_chunks(&self, chunks: usize) {
        *self.chunks.write().await = chunks.max(1);
    }

    /// Configure the next conversion to fail with the given error.
    pub async fn set_next_error(&self, error: ClientError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn set_account(&self, account: AccountInfo) {
        *self.account.write().await = account;
    }

    pub async fn set_credits(&self, credits: i64) {
        self.account.write().await.credits = credits;
    }

    /// Configure the next account lookup to fail with the given error.
    pub async fn set_next_account_error(&self, error: ClientError) {
        *self.next_account_error.write().await = Some(error);
    }

    /// Deterministic output for a job when none is configured.
    pub fn default_output(job: &RemoteJob) -> Vec<u8> {
        format!("{} converted to {}", job.filename(), job.output_format).into_bytes()
    }
}

#[async_trait]
impl ConversionClient for MockConversionClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(&self, job: RemoteJob) -> Result<ResultStream, ClientError> {
        self.jobs.write().await.push(job.clone());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let bytes = match self.output.read().await.as_ref() {
            Some(bytes) => bytes.clone(),
            None => Self::default_output(&job),
        };

        let chunk_count = *self.chunks.read().await;
        let chunk_size = bytes.len().div_ceil(chunk_count).max(1);
        let chunks: Vec<Result<Bytes, ClientError>> = bytes
            .chunks(chunk_size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();

        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn current_user(&self, _sandbox: bool) -> Result<AccountInfo, ClientError> {
        *self.account_calls.write().await += 1;

        if let Some(err) = self.next_account_error.write().await.take() {
            return Err(err);
        }
        Ok(self.account.read().await.clone())
    }
}
