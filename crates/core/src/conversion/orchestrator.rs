//! Convert-one-file workflow: cache hit, target reuse or remote conversion.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use crate::audit::{AuditEvent, AuditSink, NoopAuditSink};
use crate::cache::ContentCache;
use crate::cloudconvert::{ConversionClient, RemoteJob, ResultStream};
use crate::metrics;
use crate::paths::{atomic, PathResolver};

use super::error::ConvertError;
use super::request::{check_source_async, ConversionRequest};
use super::types::{ConversionOutcome, ConvertedArtifact};

/// Scope recorded on audit entries written by [`ConversionOrchestrator::convert`].
pub const AUDIT_SCOPE: &str = "convertino_core::conversion::ConversionOrchestrator::convert";

/// Runs conversions against a client and a cache.
///
/// Holds no per-call state, so one instance can be shared behind `Arc`.
pub struct ConversionOrchestrator {
    client: Arc<dyn ConversionClient>,
    cache: Arc<dyn ContentCache>,
    resolver: PathResolver,
    audit: Arc<dyn AuditSink>,
}

impl ConversionOrchestrator {
    /// Create an orchestrator that does not audit.
    pub fn new(client: Arc<dyn ConversionClient>, cache: Arc<dyn ContentCache>) -> Self {
        Self {
            client,
            cache,
            resolver: PathResolver::new(),
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Set the audit sink for recording conversions.
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn client(&self) -> &Arc<dyn ConversionClient> {
        &self.client
    }

    /// Produces the requested artifact at its target path.
    ///
    /// Order: source check, target resolution, cache lookup, target reuse,
    /// remote conversion, cache store, audit. The first failure ends the call.
    pub async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConvertedArtifact, ConvertError> {
        let start = Instant::now();
        match self.run(request, start).await {
            Ok(artifact) => {
                metrics::CONVERSIONS_TOTAL
                    .with_label_values(&[artifact.outcome.as_str()])
                    .inc();
                info!(
                    source = %request.source().display(),
                    target = %artifact.path.display(),
                    outcome = %artifact.outcome,
                    cached = artifact.cached,
                    size_bytes = artifact.size_bytes,
                    duration_ms = artifact.duration_ms,
                    "Conversion completed"
                );
                self.audit.record(AuditEvent::ConversionCompleted {
                    principal: request.principal_id().to_string(),
                    scope: AUDIT_SCOPE.to_string(),
                    source: basename(request.source()),
                    target: basename(&artifact.path),
                    format: request.format().to_string(),
                    outcome: artifact.outcome.as_str().to_string(),
                    cached: artifact.cached,
                    size_bytes: artifact.size_bytes,
                    duration_ms: artifact.duration_ms,
                });
                Ok(artifact)
            }
            Err(e) => {
                metrics::CONVERSION_FAILURES
                    .with_label_values(&[e.kind()])
                    .inc();
                warn!(
                    source = %request.source().display(),
                    format = request.format(),
                    error = %e,
                    "Conversion failed"
                );
                self.audit.record(AuditEvent::ConversionFailed {
                    principal: request.principal_id().to_string(),
                    scope: AUDIT_SCOPE.to_string(),
                    source: basename(request.source()),
                    format: request.format().to_string(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &ConversionRequest,
        start: Instant,
    ) -> Result<ConvertedArtifact, ConvertError> {
        // The file may have vanished since the request was built.
        check_source_async(request.source()).await?;

        let format = request.format();
        let target = self
            .resolver
            .resolve(request.target(), request.source(), format)
            .await?;
        let cache_key = request.cache_enabled_key();

        let mut outcome = None;
        if let Some(key) = cache_key {
            if let Some(entry) = self.cache.lookup(key, format).await {
                self.cache.copy_to(&entry, &target).await?;
                debug!(cache_key = key, "Served from cache");
                outcome = Some(ConversionOutcome::CacheHit);
            }
        } else if !request.is_uncached() && is_file(&target).await {
            debug!(target = %target.display(), "Reusing existing target");
            outcome = Some(ConversionOutcome::TargetReuse);
        }

        let outcome = match outcome {
            Some(outcome) => outcome,
            None => {
                self.convert_remotely(request, &target).await?;
                ConversionOutcome::RemoteConvert
            }
        };

        let mut cached = false;
        if outcome != ConversionOutcome::CacheHit {
            if let Some(key) = cache_key {
                match self.cache.store(key, format, &target).await {
                    Ok(_) => cached = true,
                    Err(e) => warn!(cache_key = key, error = %e, "Failed to cache artifact"),
                }
            }
        }

        let size_bytes = fs::metadata(&target).await?.len();
        Ok(ConvertedArtifact {
            path: target,
            size_bytes,
            outcome,
            cached,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn convert_remotely(
        &self,
        request: &ConversionRequest,
        target: &Path,
    ) -> Result<u64, ConvertError> {
        let job = RemoteJob {
            source: request.source().to_path_buf(),
            output_format: request.format().to_string(),
            options: request.options().clone(),
            sandbox: request.is_sandbox(),
        };

        debug!(
            client = self.client.name(),
            source = %job.source.display(),
            format = %job.output_format,
            options = job.options.len(),
            "Starting remote conversion"
        );
        let start = Instant::now();
        let stream = self.client.convert(job).await?;
        let bytes = write_stream(stream, target).await?;

        metrics::REMOTE_CONVERSION_DURATION
            .with_label_values(&[request.format()])
            .observe(start.elapsed().as_secs_f64());
        metrics::BYTES_DOWNLOADED.inc_by(bytes);
        Ok(bytes)
    }
}

/// Streams `stream` into a temporary sibling of `target` and renames it into place.
///
/// Nothing is left behind when the stream fails or yields no bytes.
async fn write_stream(mut stream: ResultStream, target: &Path) -> Result<u64, ConvertError> {
    let temp = atomic::temp_sibling(target);

    let written = async {
        let mut writer = BufWriter::new(File::create(&temp).await?);
        let mut total = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            total += chunk.len() as u64;
        }
        writer.flush().await?;
        writer.get_ref().sync_all().await?;
        Ok::<_, ConvertError>(total)
    }
    .await;

    match written {
        Ok(0) => {
            atomic::remove_quietly(&temp).await;
            Err(ConvertError::CreateFileFromStream {
                path: target.to_path_buf(),
            })
        }
        Ok(total) => {
            atomic::persist(&temp, target).await?;
            Ok(total)
        }
        Err(e) => {
            atomic::remove_quietly(&temp).await;
            Err(e)
        }
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
