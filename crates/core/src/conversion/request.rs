//! Immutable conversion requests and their builder.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::auth::Principal;
use crate::paths::normalize_format;

use super::error::ConvertError;
use super::options::ConversionOptions;

/// Everything one conversion call needs. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    source: PathBuf,
    format: String,
    target: Option<PathBuf>,
    cache_key: Option<String>,
    uncached: bool,
    sandbox: bool,
    options: ConversionOptions,
    principal: Option<Principal>,
}

impl ConversionRequest {
    pub fn builder() -> ConversionRequestBuilder {
        ConversionRequestBuilder::default()
    }

    /// Shorthand for a request with only source and format set.
    pub fn new(source: impl Into<PathBuf>, format: &str) -> Result<Self, ConvertError> {
        Self::builder().file(source).format(format).build()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Normalized output format.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn cache_key(&self) -> Option<&str> {
        self.cache_key.as_deref()
    }

    pub fn is_uncached(&self) -> bool {
        self.uncached
    }

    pub fn is_sandbox(&self) -> bool {
        self.sandbox
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Principal id for audit records.
    pub fn principal_id(&self) -> &str {
        self.principal
            .as_ref()
            .map(|p| p.id.as_str())
            .unwrap_or(crate::auth::ANONYMOUS_PRINCIPAL)
    }

    /// Whether the cache takes part in this call.
    pub(crate) fn cache_enabled_key(&self) -> Option<&str> {
        if self.uncached {
            None
        } else {
            self.cache_key()
        }
    }
}

/// Consuming builder for [`ConversionRequest`].
#[derive(Debug, Clone, Default)]
pub struct ConversionRequestBuilder {
    source: Option<PathBuf>,
    format: Option<String>,
    target: Option<PathBuf>,
    cache_key: Option<String>,
    uncached: bool,
    sandbox: bool,
    options: ConversionOptions,
    principal: Option<Principal>,
}

impl ConversionRequestBuilder {
    /// Source file to convert.
    pub fn file(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Desired output format, e.g. `"pdf"` or `".PNG"`.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Explicit output path instead of `<source_dir>/<stem>.<format>`.
    pub fn target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Skip both cache and target reuse; always convert remotely.
    pub fn uncached(mut self, uncached: bool) -> Self {
        self.uncached = uncached;
        self
    }

    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.set(key, value);
        self
    }

    /// Replaces the whole option map.
    pub fn options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn remove_option(mut self, key: &str) -> Self {
        self.options.remove(key);
        self
    }

    pub fn clear_options(mut self) -> Self {
        self.options.clear();
        self
    }

    /// Key under which the result is cached. An empty key clears it.
    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.cache_key = if key.is_empty() { None } else { Some(key) };
        self
    }

    pub fn clear_cache_key(mut self) -> Self {
        self.cache_key = None;
        self
    }

    pub fn requested_by(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Drops every setting, as if freshly created.
    pub fn reset(self) -> Self {
        Self::default()
    }

    /// Validates the source and format and freezes the request.
    pub fn build(self) -> Result<ConversionRequest, ConvertError> {
        let source = self
            .source
            .ok_or_else(|| ConvertError::source_not_found(PathBuf::new()))?;
        check_source(&source)?;

        let raw_format = self.format.unwrap_or_default();
        let format = normalize_format(&raw_format);
        if format.is_empty() || format.contains(['/', '\\', '\0']) || format.contains("..") {
            return Err(ConvertError::InvalidFormat { format: raw_format });
        }

        Ok(ConversionRequest {
            source,
            format,
            target: self.target,
            cache_key: self.cache_key,
            uncached: self.uncached,
            sandbox: self.sandbox,
            options: self.options,
            principal: self.principal,
        })
    }
}

/// Fails unless `source` is an existing, readable regular file.
pub(crate) fn check_source(source: &Path) -> Result<(), ConvertError> {
    let readable = std::fs::metadata(source)
        .map(|meta| meta.is_file())
        .unwrap_or(false)
        && std::fs::File::open(source).is_ok();

    if readable {
        Ok(())
    } else {
        Err(ConvertError::source_not_found(source))
    }
}

/// Async form of [`check_source`] for use inside the conversion workflow.
pub(crate) async fn check_source_async(source: &Path) -> Result<(), ConvertError> {
    let is_file = tokio::fs::metadata(source)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);

    if is_file && tokio::fs::File::open(source).await.is_ok() {
        Ok(())
    } else {
        Err(ConvertError::source_not_found(source))
    }
}
