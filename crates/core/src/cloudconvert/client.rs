//! CloudConvert v2 HTTP client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::TryStreamExt;
use reqwest::{multipart, Body, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::types::{build_job_payload, Envelope, JobData, UploadForm};
use super::{
    AccountInfo, ClientError, CloudConvertConfig, ConversionClient, ImportMethod, RemoteJob,
    ResultStream,
};

/// Client for the CloudConvert v2 REST API.
pub struct CloudConvertClient {
    client: Client,
    config: CloudConvertConfig,
}

impl CloudConvertClient {
    /// Create a new client with the given configuration.
    pub fn new(config: CloudConvertConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("convertino/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CloudConvertConfig {
        &self.config
    }

    /// Base URL and API key for the live or sandbox endpoint.
    fn endpoint(&self, sandbox: bool) -> Result<(&str, &str), ClientError> {
        if sandbox {
            let key = self
                .config
                .sandbox_api_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    ClientError::Configuration(
                        "sandbox mode requested but no sandbox_api_key is configured".to_string(),
                    )
                })?;
            Ok((self.config.sandbox_api_url.trim_end_matches('/'), key))
        } else {
            Ok((self.config.api_url.trim_end_matches('/'), &self.config.api_key))
        }
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// Turns a non-2xx response into the matching error.
    async fn check_status(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| body.chars().take(200).collect());

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(ClientError::AuthenticationFailed(message))
        } else {
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }

    async fn import_task(&self, job: &RemoteJob) -> Result<Value, ClientError> {
        match self.config.import_method {
            ImportMethod::Base64 => {
                let bytes = tokio::fs::read(&job.source).await?;
                Ok(json!({
                    "operation": ImportMethod::Base64.operation(),
                    "file": STANDARD.encode(bytes),
                    "filename": job.filename(),
                }))
            }
            ImportMethod::Upload => Ok(json!({
                "operation": ImportMethod::Upload.operation(),
            })),
        }
    }

    async fn create_job(&self, sandbox: bool, payload: &Value) -> Result<JobData, ClientError> {
        let (base, key) = self.endpoint(sandbox)?;
        let response = self
            .client
            .post(format!("{}/jobs", base))
            .bearer_auth(key)
            .timeout(self.request_timeout())
            .json(payload)
            .send()
            .await?;

        Self::decode(Self::check_status(response).await?).await
    }

    async fn get_job(&self, sandbox: bool, job_id: &str) -> Result<JobData, ClientError> {
        let (base, key) = self.endpoint(sandbox)?;
        let response = self
            .client
            .get(format!("{}/jobs/{}", base, job_id))
            .bearer_auth(key)
            .timeout(self.request_timeout())
            .send()
            .await?;

        Self::decode(Self::check_status(response).await?).await
    }

    /// Posts the source file to the signed form of an `import/upload` task.
    async fn upload(&self, form: &UploadForm, job: &RemoteJob) -> Result<(), ClientError> {
        let mut multipart = multipart::Form::new();
        for (name, value) in &form.parameters {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            multipart = multipart.text(name.clone(), value);
        }

        let file = tokio::fs::File::open(&job.source).await?;
        let length = file.metadata().await?.len();
        let part = multipart::Part::stream_with_length(Body::from(file), length)
            .file_name(job.filename());
        multipart = multipart.part("file", part);

        let response = self
            .client
            .post(&form.url)
            .timeout(self.request_timeout())
            .multipart(multipart)
            .send()
            .await?;
        Self::check_status(response).await?;

        debug!(bytes = length, "Uploaded source file");
        Ok(())
    }

    /// Polls until the job is `finished` or `error`, bounded by `timeout_secs`.
    async fn wait_for_job(&self, sandbox: bool, job_id: &str) -> Result<JobData, ClientError> {
        let deadline = Instant::now() + Duration::from_secs(self.config.timeout_secs);
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            let job = self.get_job(sandbox, job_id).await?;
            if job.is_finished() || job.is_error() {
                return Ok(job);
            }
            if Instant::now() >= deadline {
                warn!(job_id, status = %job.status, "Job did not finish in time");
                return Err(ClientError::Timeout);
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn download(&self, url: &str) -> Result<ResultStream, ClientError> {
        // The timeout also bounds reading the body.
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout())
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(Box::pin(response.bytes_stream().map_err(ClientError::from)))
    }
}

#[async_trait]
impl ConversionClient for CloudConvertClient {
    fn name(&self) -> &str {
        "cloudconvert"
    }

    async fn convert(&self, job: RemoteJob) -> Result<ResultStream, ClientError> {
        let import = self.import_task(&job).await?;
        let payload = build_job_payload(&self.config.job_tag, import, &job.output_format, &job.options);

        let created = self.create_job(job.sandbox, &payload).await?;
        debug!(job_id = %created.id, format = %job.output_format, sandbox = job.sandbox, "Created job");

        if self.config.import_method == ImportMethod::Upload {
            let form = created.upload_form().ok_or_else(|| {
                ClientError::Decode("import task did not return an upload form".to_string())
            })?;
            self.upload(form, &job).await?;
        }

        let finished = self.wait_for_job(job.sandbox, &created.id).await?;
        if finished.is_error() {
            return Err(ClientError::JobFailed {
                job_id: finished.id.clone(),
                reason: finished.failure_reason(),
            });
        }

        let url = finished
            .export_urls()
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::NoExportUrl {
                job_id: finished.id.clone(),
            })?;

        info!(job_id = %finished.id, "Job finished, downloading result");
        self.download(&url).await
    }

    async fn current_user(&self, sandbox: bool) -> Result<AccountInfo, ClientError> {
        let (base, key) = self.endpoint(sandbox)?;
        let response = self
            .client
            .get(format!("{}/users/me", base))
            .bearer_auth(key)
            .timeout(self.request_timeout())
            .send()
            .await?;

        Self::decode(Self::check_status(response).await?).await
    }
}
