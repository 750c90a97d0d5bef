use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Toggle calls segmented by result (liked, unliked, converged, failed).
    pub static ref ENGAGEMENT_TOGGLE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "engagement_toggle_total",
        "Like toggle calls segmented by result",
        &["result"]
    )
    .expect("failed to register engagement_toggle_total");

    /// Counter adjustments that failed after the ledger committed.
    pub static ref ENGAGEMENT_COUNTER_WARNING_TOTAL: IntCounterVec = register_int_counter_vec!(
        "engagement_counter_warning_total",
        "Non-fatal like_count adjustment failures segmented by operation",
        &["op"]
    )
    .expect("failed to register engagement_counter_warning_total");

    /// Duration of feed assembly by outcome (ok, error).
    pub static ref FEED_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "feed_request_duration_seconds",
        "Feed assembly duration segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register feed_request_duration_seconds");

    pub static ref FEED_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_request_total",
        "Feed assembly requests segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register feed_request_total");

    /// Posts whose like_count was rewritten by the reconciler.
    pub static ref COUNTER_RECONCILE_FIXED_TOTAL: IntCounter = register_int_counter!(
        "counter_reconcile_fixed_total",
        "Posts whose like_count was repaired from the like ledger"
    )
    .expect("failed to register counter_reconcile_fixed_total");
}

/// Render the default registry in the prometheus text format
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
