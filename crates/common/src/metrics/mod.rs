//! Metrics and observability utilities
//!
//! Prometheus-style metric names under a single prefix. Recording is a no-op
//! until a recorder is installed (the gateway installs the Prometheus exporter).

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

/// Metrics prefix for all DocChat metrics
pub const METRICS_PREFIX: &str = "docchat";

/// Buckets for generation latency (seconds); local models are slow
pub const GENERATION_BUCKETS: &[f64] = &[
    0.250,
    0.500,
    1.000,
    2.500,
    5.000,
    10.00,
    30.00,
    60.00,
    120.0,
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_gauge!(
        format!("{}_corpus_documents", METRICS_PREFIX),
        Unit::Count,
        "Documents indexed at startup"
    );

    // Search metrics
    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of retrieval queries"
    );

    describe_gauge!(
        format!("{}_search_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of documents with a non-zero score for the last query"
    );

    // Generation metrics
    describe_counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total generation backend requests"
    );

    describe_histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Generation latency in seconds, first byte to last"
    );

    describe_counter!(
        format!("{}_stream_chunks_total", METRICS_PREFIX),
        Unit::Count,
        "Chunks relayed to streaming clients"
    );

    tracing::info!("Metrics registered");
}

/// Record the corpus size after loading
pub fn record_corpus(documents: usize) {
    gauge!(format!("{}_corpus_documents", METRICS_PREFIX)).set(documents as f64);
}

/// Helper to record search metrics
pub fn record_search(result_count: usize) {
    counter!(format!("{}_search_queries_total", METRICS_PREFIX)).increment(1);

    gauge!(format!("{}_search_results_count", METRICS_PREFIX)).set(result_count as f64);
}

/// Helper to record generation metrics
pub fn record_generation(duration_secs: f64, mode: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        "mode" => mode.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_generation_duration_seconds", METRICS_PREFIX),
            "mode" => mode.to_string()
        )
        .record(duration_secs);
    }
}

/// Helper to record relayed chunks
pub fn record_stream_chunks(count: usize) {
    counter!(format!("{}_stream_chunks_total", METRICS_PREFIX)).increment(count as u64);
}
