//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversions (outcomes, failures, remote duration, bytes downloaded)
//! - The content cache (lookups, stores)
//! - The CloudConvert account (credit checks, remaining credits)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Completed conversions by outcome.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("convertino_conversions_total", "Total completed conversions"),
        &["outcome"], // "cache_hit", "target_reuse", "remote_convert"
    )
    .unwrap()
});

/// Failed conversions by error kind.
pub static CONVERSION_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "convertino_conversion_failures_total",
            "Total failed conversions",
        ),
        &["error"],
    )
    .unwrap()
});

/// Duration of the remote leg (job submission through download).
pub static REMOTE_CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "convertino_remote_conversion_duration_seconds",
            "Duration of remote conversions including download",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["format"],
    )
    .unwrap()
});

/// Bytes written from remote result streams.
pub static BYTES_DOWNLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "convertino_bytes_downloaded_total",
        "Total bytes downloaded from conversion results",
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics
// =============================================================================

/// Cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("convertino_cache_lookups_total", "Total cache lookups"),
        &["result"], // "hit", "miss", "invalid_key"
    )
    .unwrap()
});

/// Cache stores by result.
pub static CACHE_STORES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("convertino_cache_stores_total", "Total cache stores"),
        &["result"], // "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Account Metrics
// =============================================================================

/// Account lookups by result.
pub static CREDIT_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("convertino_credit_checks_total", "Total credit checks"),
        &["result"], // "ok", "below_limit", "error"
    )
    .unwrap()
});

/// Remaining credits reported by the last successful account lookup.
pub static REMAINING_CREDITS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "convertino_remaining_credits",
        "Conversion credits remaining on the account",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Conversions
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_FAILURES.clone()),
        Box::new(REMOTE_CONVERSION_DURATION.clone()),
        Box::new(BYTES_DOWNLOADED.clone()),
        // Cache
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(CACHE_STORES.clone()),
        // Account
        Box::new(CREDIT_CHECKS.clone()),
        Box::new(REMAINING_CREDITS.clone()),
    ]
}
