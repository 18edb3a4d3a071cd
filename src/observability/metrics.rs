use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Global metrics instance.
pub static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Metrics collector for the top-up gateway.
#[derive(Debug, Clone)]
pub struct Metrics {
    initialized: bool,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self { initialized: true }
    }

    /// One verified callback delivery, labeled by how it was settled.
    pub fn record_callback_received(&self, outcome: &str) {
        counter!("topup_callbacks_total", "outcome" => outcome.to_string()).increment(1);
    }

    /// A delivery that failed signature verification.
    pub fn record_callback_rejected(&self, reason: &str) {
        counter!("topup_callbacks_rejected_total", "reason" => reason.to_string()).increment(1);
    }

    /// A status transition applied to a transaction.
    pub fn record_transition(&self, from: &str, to: &str) {
        counter!("topup_transitions_total", "from" => from.to_string(), "to" => to.to_string())
            .increment(1);
    }

    /// A wallet credited through the paid transition.
    pub fn record_wallet_credit(&self) {
        counter!("topup_wallet_credits_total").increment(1);
    }

    /// A top-up opened with the provider.
    pub fn record_topup_created(&self, method: &str) {
        counter!("topup_transactions_created_total", "method" => method.to_string()).increment(1);
    }

    /// Wall time spent processing a callback delivery end to end.
    pub fn record_callback_latency(&self, duration_ms: f64) {
        histogram!("topup_callback_duration_ms").record(duration_ms);
    }

    /// An outbound HTTP call to the provider.
    pub fn record_provider_request(&self, operation: &str, success: bool, duration_ms: f64) {
        counter!("topup_provider_requests_total", "operation" => operation.to_string(), "success" => success.to_string()).increment(1);
        histogram!("topup_provider_request_duration_ms", "operation" => operation.to_string())
            .record(duration_ms);
    }
}

/// Timer for measuring operation latency.
pub struct LatencyTimer {
    start: Instant,
}

impl LatencyTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for LatencyTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Initializes the metrics system and returns the Prometheus handle.
pub fn init_metrics() -> PrometheusHandle {
    let handle = METRICS_HANDLE.get_or_init(|| {
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .expect("Failed to install Prometheus recorder");

        describe_metrics();
        handle
    });

    METRICS.get_or_init(Metrics::new);

    handle.clone()
}

/// Describes all metrics for Prometheus.
fn describe_metrics() {
    describe_counter!(
        "topup_callbacks_total",
        Unit::Count,
        "Verified callback deliveries by outcome"
    );
    describe_counter!(
        "topup_callbacks_rejected_total",
        Unit::Count,
        "Callback deliveries rejected at signature verification"
    );
    describe_counter!(
        "topup_transitions_total",
        Unit::Count,
        "Applied transaction status transitions"
    );
    describe_counter!(
        "topup_wallet_credits_total",
        Unit::Count,
        "Wallet credits applied through the paid transition"
    );
    describe_counter!(
        "topup_transactions_created_total",
        Unit::Count,
        "Top-up transactions opened with the provider"
    );
    describe_histogram!(
        "topup_callback_duration_ms",
        Unit::Milliseconds,
        "Callback processing latency in milliseconds"
    );
    describe_counter!(
        "topup_provider_requests_total",
        Unit::Count,
        "Outbound provider HTTP requests"
    );
    describe_histogram!(
        "topup_provider_request_duration_ms",
        Unit::Milliseconds,
        "Outbound provider request latency in milliseconds"
    );
}

/// Returns the global metrics instance.
pub fn get_metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_timer() {
        let timer = LatencyTimer::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let elapsed = timer.elapsed_ms();
        assert!(elapsed >= 10.0);
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert!(metrics.initialized);
    }
}
