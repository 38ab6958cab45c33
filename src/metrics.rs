use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("gateway_requests_total", "Total number of requests").unwrap();
    pub static ref REQUESTS_REJECTED: Counter = register_counter!(
        "gateway_requests_rejected_total",
        "Requests rejected by the rate limiter"
    )
    .unwrap();
    pub static ref TRACKED_CLIENTS: Gauge = register_gauge!(
        "gateway_rate_limit_clients",
        "Client windows currently tracked by the rate limiter"
    )
    .unwrap();
    pub static ref PROXY_LATENCY: Histogram = register_histogram!(
        "gateway_proxy_latency_seconds",
        "Upstream proxy latency in seconds"
    )
    .unwrap();
}
