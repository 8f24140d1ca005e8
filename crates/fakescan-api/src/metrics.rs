//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use fakescan_models::Verdict;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "fakescan_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "fakescan_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "fakescan_http_requests_in_flight";

    // Prediction metrics
    pub const VERDICTS_TOTAL: &str = "fakescan_verdicts_total";
    pub const PREDICTION_FAILURES_TOTAL: &str = "fakescan_prediction_failures_total";
    pub const VIDEO_FRAMES_ANALYZED_TOTAL: &str = "fakescan_video_frames_analyzed_total";
    pub const PREDICTION_DURATION_SECONDS: &str = "fakescan_prediction_duration_seconds";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a verdict returned by an endpoint.
pub fn record_verdict(endpoint: &str, verdict: Verdict, duration_secs: f64) {
    let labels = [
        ("endpoint", endpoint.to_string()),
        ("verdict", verdict.as_str().to_string()),
    ];
    counter!(names::VERDICTS_TOTAL, &labels).increment(1);

    let labels = [("endpoint", endpoint.to_string())];
    histogram!(names::PREDICTION_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a prediction that ended in an error response.
pub fn record_prediction_failure(endpoint: &str, status: u16) {
    let labels = [
        ("endpoint", endpoint.to_string()),
        ("status", status.to_string()),
    ];
    counter!(names::PREDICTION_FAILURES_TOTAL, &labels).increment(1);
}

/// Record how many sampled frames a video run looked at.
pub fn record_video_frames(sampled: u64) {
    counter!(names::VIDEO_FRAMES_ANALYZED_TOTAL).increment(sampled);
}

/// Route label for a request path; unknown paths collapse to one label.
fn route_label(path: &str) -> &'static str {
    match path {
        "/predict" => "/predict",
        "/predict_video" => "/predict_video",
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        _ => "other",
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = route_label(request.uri().path());
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label() {
        assert_eq!(route_label("/predict"), "/predict");
        assert_eq!(route_label("/predict_video"), "/predict_video");
        assert_eq!(route_label("/wp-admin/setup.php"), "other");
    }
}
