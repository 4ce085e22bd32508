//! Prometheus Metrics Module
//!
//! Provides engine-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Interaction counts by kind and outcome
//! - Notification fan-out counts by type and outcome
//! - Store conflicts (lock timeouts, unique violations, deadlocks) by table

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Interaction counter - tracks engine operations by kind and outcome
pub static INTERACTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("interactions_total", "Total number of post interactions")
            .namespace("social_engine"),
        &["kind", "outcome"],
    )
    .expect("Failed to create INTERACTIONS_TOTAL metric")
});

/// Notification counter - delivered, skipped (self) or dropped (store failure)
pub static NOTIFICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("notifications_total", "Total number of notification fan-out attempts")
            .namespace("social_engine"),
        &["type", "outcome"],
    )
    .expect("Failed to create NOTIFICATIONS_TOTAL metric")
});

/// Store conflicts caused by concurrent writers
pub static STORE_CONFLICTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("store_conflicts_total", "Concurrent modification conflicts")
            .namespace("social_engine"),
        &["table"],
    )
    .expect("Failed to create STORE_CONFLICTS_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(INTERACTIONS_TOTAL.clone()))
        .expect("Failed to register INTERACTIONS_TOTAL");
    registry
        .register(Box::new(NOTIFICATIONS_TOTAL.clone()))
        .expect("Failed to register NOTIFICATIONS_TOTAL");
    registry
        .register(Box::new(STORE_CONFLICTS_TOTAL.clone()))
        .expect("Failed to register STORE_CONFLICTS_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record an interaction outcome
pub fn record_interaction(kind: &str, outcome: &str) {
    INTERACTIONS_TOTAL.with_label_values(&[kind, outcome]).inc();
}

/// Helper to record a notification fan-out outcome
pub fn record_notification(notification_type: &str, outcome: &str) {
    NOTIFICATIONS_TOTAL
        .with_label_values(&[notification_type, outcome])
        .inc();
}

/// Helper to record a store conflict
pub fn record_store_conflict(table: &str) {
    STORE_CONFLICTS_TOTAL.with_label_values(&[table]).inc();
}
