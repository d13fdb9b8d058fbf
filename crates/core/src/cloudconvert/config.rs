//! Configuration for the CloudConvert client.

use serde::{Deserialize, Serialize};

/// How source bytes are transferred into a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMethod {
    /// Inline the file in the job payload (`import/base64`).
    #[default]
    Base64,
    /// Create an upload task and POST the file to its signed form (`import/upload`).
    Upload,
}

impl ImportMethod {
    /// Task operation name used in the job payload.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Base64 => "import/base64",
            Self::Upload => "import/upload",
        }
    }
}

/// CloudConvert API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConvertConfig {
    /// Live API key.
    pub api_key: String,

    /// API key used when a request asks for sandbox mode.
    #[serde(default)]
    pub sandbox_api_key: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_sandbox_api_url")]
    pub sandbox_api_url: String,

    #[serde(default)]
    pub import_method: ImportMethod,

    /// Delay between job status polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound for a job to finish, and for each API request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Tag attached to every submitted job.
    #[serde(default = "default_job_tag")]
    pub job_tag: String,
}

fn default_api_url() -> String {
    "https://api.cloudconvert.com/v2".to_string()
}

fn default_sandbox_api_url() -> String {
    "https://api.sandbox.cloudconvert.com/v2".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_job_tag() -> String {
    "convertino".to_string()
}

impl CloudConvertConfig {
    /// Configuration with the given live key and defaults for everything else.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            sandbox_api_key: None,
            api_url: default_api_url(),
            sandbox_api_url: default_sandbox_api_url(),
            import_method: ImportMethod::default(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_timeout_secs(),
            job_tag: default_job_tag(),
        }
    }

    /// Points both live and sandbox endpoints at `url`.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.sandbox_api_url = url.clone();
        self.api_url = url;
        self
    }
}
