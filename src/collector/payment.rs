//! Instrumented HTTP client for payment-call latency
//!
//! Call sites opt into this wrapper instead of the bare client; requests
//! matching the configured payment patterns are timed and recorded whether
//! they succeed or fail. This is deliberately independent of the resource
//! timing channel so payment latency is captured even for calls the
//! resource observer never sees.

use crate::collector::RumCollector;
use std::sync::Arc;
use std::time::Instant;

/// Opt-in wrapper around `reqwest::Client` that reports payment-call
/// durations to the collector
#[derive(Clone)]
pub struct InstrumentedHttpClient {
    inner: reqwest::Client,
    collector: Arc<RumCollector>,
}

impl InstrumentedHttpClient {
    pub fn new(inner: reqwest::Client, collector: Arc<RumCollector>) -> Self {
        Self { inner, collector }
    }

    /// Execute a request, recording duration and outcome for payment URLs.
    /// The response is passed through untouched; instrumentation never
    /// alters the call's result.
    pub async fn execute(
        &self,
        request: reqwest::Request,
    ) -> reqwest::Result<reqwest::Response> {
        let url = request.url().to_string();
        let started = Instant::now();
        let result = self.inner.execute(request).await;
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        let success = matches!(&result, Ok(resp) if resp.status().is_success());
        self.collector.record_payment_call(&url, duration_ms, success);

        result
    }

    /// Access to the wrapped client for non-instrumented calls
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{MemoryAnalyticsSink, MemoryViolationReporter};
    use crate::config::CollectorConfig;
    use pulse_common::{DeviceClass, DeviceInfo};

    #[test]
    fn test_wrapper_shares_the_collector_session() {
        let collector = Arc::new(RumCollector::with_sample_draw(
            CollectorConfig::default(),
            DeviceInfo {
                class: DeviceClass::Desktop,
                os: "linux".to_string(),
                viewport_width: 1920,
            },
            None,
            Arc::new(MemoryAnalyticsSink::new()),
            Arc::new(MemoryViolationReporter::new()),
            0.0,
        ));
        collector.initialize();

        let client = InstrumentedHttpClient::new(reqwest::Client::new(), collector.clone());
        let _ = client.inner();

        // The recording path the wrapper drives after each call.
        collector.record_payment_call("https://js.stripe.com/v3/charges", 120.0, true);
        assert_eq!(collector.metrics()["payment"].len(), 1);
    }
}
