use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, HistogramVec, register_counter, register_counter_vec,
    register_histogram_vec,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("gateway_requests_total", "Total number of public requests").unwrap();
    pub static ref RATE_LIMITED: Counter = register_counter!(
        "gateway_rate_limited_total",
        "Requests rejected by the rate limiter"
    )
    .unwrap();
    pub static ref RATE_STORE_ERRORS: Counter = register_counter!(
        "gateway_rate_store_errors_total",
        "Requests refused because the counter store failed"
    )
    .unwrap();
    pub static ref ENRICHMENT_SKIPPED: CounterVec = register_counter_vec!(
        "gateway_enrichment_skipped_total",
        "Listings returned without owner data",
        &["reason"]
    )
    .unwrap();
    pub static ref UPSTREAM_LATENCY: HistogramVec = register_histogram_vec!(
        "gateway_upstream_latency_seconds",
        "Collaborator call latency in seconds",
        &["collaborator"]
    )
    .unwrap();
}
