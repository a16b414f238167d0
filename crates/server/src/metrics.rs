//! Prometheus metrics for the Shelfwise server.
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping.
//! Metrics carry no user, shelf or book identifiers, only aggregate counts.
//! Restrict the endpoint to scraper addresses at the network level.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Profile metrics
pub static PROFILE_CHANGES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "shelfwise_profile_changes_total",
            "Profile changes by action",
        ),
        &["action"],
    )
    .expect("metric creation failed")
});

// Shelf metrics
pub static SHELVES_CREATED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "shelfwise_shelves_created_total",
        "Total number of shelves created",
    )
    .expect("metric creation failed")
});

pub static SHELVES_DELETED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "shelfwise_shelves_deleted_total",
        "Total number of shelves deleted",
    )
    .expect("metric creation failed")
});

// Library metrics
pub static LIBRARY_UPSERTS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "shelfwise_library_upserts_total",
        "Total number of library book upserts committed",
    )
    .expect("metric creation failed")
});

pub static SHELF_ASSIGNMENT_CHANGES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "shelfwise_shelf_assignment_changes_total",
            "Single-shelf assignment changes by action",
        ),
        &["action"],
    )
    .expect("metric creation failed")
});

pub static LIBRARY_ASSEMBLY_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "shelfwise_library_assembly_duration_seconds",
            "Time taken to fetch and group a user's library",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
    )
    .expect("metric creation failed")
});

// Error metrics
pub static STORE_ERRORS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "shelfwise_store_errors_total",
            "Internal metadata store failures by operation",
        ),
        &["operation"],
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent, so tests can build as many routers as they like.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(PROFILE_CHANGES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SHELVES_CREATED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SHELVES_DELETED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(LIBRARY_UPSERTS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SHELF_ASSIGNMENT_CHANGES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(LIBRARY_ASSEMBLY_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(STORE_ERRORS.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Count an internal store failure for `operation`.
pub fn record_store_error(operation: &str) {
    STORE_ERRORS.with_label_values(&[operation]).inc();
}
