//! Client-side counters
//!
//! - `vec2_requests_total` (counter): labels `method`, `status`
//! - `vec2_token_rotations_total` (counter): label `outcome`
//!
//! Recorded through the `metrics` facade. Without an installed recorder
//! these are no-ops.

pub fn record_request(method: &str, status: u16) {
    metrics::counter!(
        "vec2_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// `outcome` is `rotated` or `tampered`.
pub fn record_rotation(outcome: &'static str) {
    metrics::counter!("vec2_token_rotations_total", "outcome" => outcome).increment(1);
}
