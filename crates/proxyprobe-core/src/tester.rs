// Per-proxy orchestrator: latency gate, unlock sweep, throughput.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use proxyprobe_unlock::Dispatcher;

use crate::catalog::{ProxyCatalog, ProxyIdentity};
use crate::client::{ClientFactory, TunnelClientFactory};
use crate::config::{TestConfig, TestMode};
use crate::error::{TestError, TestStage};
use crate::result::{ProxyResult, UnlockSummary};
use crate::{latency, throughput};

/// How a multi-proxy sweep ended. Cancellation is an outcome, not an
/// error; results delivered before it remain valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Completed,
    Cancelled,
}

/// Runs the full per-proxy pipeline over a catalog, delivering one
/// [`ProxyResult`] per proxy through a caller-supplied callback.
pub struct SpeedTester {
    config: TestConfig,
    factory: Arc<dyn ClientFactory>,
    dispatcher: Option<Arc<Dispatcher>>,
}

impl SpeedTester {
    /// Tester over the real tunnel factory; the unlock dispatcher is
    /// built only when the config asks for an unlock phase.
    pub fn new(config: TestConfig) -> Self {
        let config = config.normalized();
        let dispatcher = config
            .unlock_enabled()
            .then(|| Arc::new(Dispatcher::with_builtin()));
        Self {
            config,
            factory: Arc::new(TunnelClientFactory),
            dispatcher,
        }
    }

    /// Full injection seam for tests: custom client factory and
    /// (optionally) a pre-built dispatcher with stub detectors.
    pub fn with_parts(
        config: TestConfig,
        factory: Arc<dyn ClientFactory>,
        dispatcher: Option<Arc<Dispatcher>>,
    ) -> Self {
        Self {
            config: config.normalized(),
            factory,
            dispatcher,
        }
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Test every proxy in the catalog sequentially.
    pub async fn test_proxies(&self, catalog: &ProxyCatalog, mut on_result: impl FnMut(ProxyResult)) {
        for proxy in catalog.iter() {
            on_result(self.test_proxy(proxy).await);
        }
    }

    /// Like [`test_proxies`](Self::test_proxies) but checks for
    /// cancellation before each proxy. A proxy's in-flight work runs
    /// to completion once started.
    pub async fn test_proxies_cancellable(
        &self,
        catalog: &ProxyCatalog,
        cancel: &CancellationToken,
        mut on_result: impl FnMut(ProxyResult),
    ) -> TestOutcome {
        for proxy in catalog.iter() {
            if cancel.is_cancelled() {
                info!("test run cancelled, aborting remaining queue");
                return TestOutcome::Cancelled;
            }
            on_result(self.test_proxy(proxy).await);
        }
        TestOutcome::Completed
    }

    /// Run the full pipeline for one proxy. Never fails: every error
    /// collapses into sentinel fields on the returned result.
    pub async fn test_proxy(&self, proxy: &ProxyIdentity) -> ProxyResult {
        let mode = self.config.mode;
        let mut result = ProxyResult {
            proxy_name: proxy.name().to_owned(),
            proxy_type: proxy.protocol().to_string(),
            proxy_ip: proxy.server().unwrap_or_default().to_owned(),
            ..ProxyResult::default()
        };

        info!(
            proxy = proxy.name(),
            protocol = %proxy.protocol(),
            mode = mode.as_str(),
            "testing proxy"
        );

        let client = match self
            .factory
            .create(proxy, self.config.timeout_duration())
        {
            Ok(client) => client,
            Err(e) => {
                warn!(proxy = proxy.name(), error = %e, "tunnel client unavailable");
                result.packet_loss = 100.0;
                result.test_error = Some(TestError::classify(TestStage::Latency, e.to_string()));
                result.failure_stage = Some(TestStage::Latency.as_str().to_owned());
                result.failure_reason = Some(e.to_string());
                return result;
            }
        };

        let slow = proxy.protocol().is_slow();

        // ── Latency phase ──
        if mode != TestMode::UnlockOnly {
            let stats = latency::probe(&client, &self.config.server_url, slow).await;
            result.latency = stats.avg;
            result.jitter = stats.jitter;
            result.packet_loss = stats.packet_loss;
            if let Some(message) = stats.last_error {
                result.test_error = Some(TestError::classify(TestStage::Latency, message));
            }

            if mode == TestMode::SpeedOnly && self.latency_gate_fails(&result) {
                debug!(proxy = proxy.name(), "latency gate failed, ending test");
                result.failure_stage = Some(TestStage::Latency.as_str().to_owned());
                result.failure_reason = Some(self.latency_gate_reason(&result));
                return result;
            }
        }

        // ── Unlock phase ──
        if mode != TestMode::SpeedOnly
            && let Some(dispatcher) = &self.dispatcher
        {
            let sweep = dispatcher
                .detect_all(proxy.name(), &client, &self.config.unlock)
                .await;
            result.unlock_summary = UnlockSummary::from_results(&sweep);
            result.unlock_results = sweep;
            debug!(
                proxy = proxy.name(),
                supported = result.unlock_summary.total_supported,
                tested = result.unlock_summary.total_tested,
                "unlock sweep finished"
            );
        }
        if mode == TestMode::UnlockOnly {
            return result;
        }

        // ── Throughput phase ──
        if self.config.fast_mode {
            return result;
        }
        // Gate again: the speed_only path already checked, but both
        // mode reaches the throughput phase without any earlier gate.
        if self.latency_gate_fails(&result) {
            debug!(proxy = proxy.name(), "latency gate failed before throughput");
            result.failure_stage = Some(TestStage::Latency.as_str().to_owned());
            result.failure_reason = Some(self.latency_gate_reason(&result));
            return result;
        }

        let download = throughput::download(
            &client,
            &self.config.server_url,
            self.config.download_size,
            self.config.concurrent,
        )
        .await;
        result.download_size = download.bytes;
        result.download_time = download.duration;
        result.download_speed = download.speed;

        if self.config.min_download_speed > 0.0
            && download.speed < self.config.min_download_speed
        {
            debug!(
                proxy = proxy.name(),
                speed = download.speed,
                floor = self.config.min_download_speed,
                "download below minimum, skipping upload"
            );
            result.failure_stage = Some(TestStage::Download.as_str().to_owned());
            result.failure_reason = Some("download speed below configured minimum".to_owned());
            return result;
        }

        let upload = throughput::upload(
            &client,
            &self.config.server_url,
            self.config.upload_size,
            self.config.concurrent,
            slow,
        )
        .await;
        result.upload_size = upload.bytes;
        result.upload_time = upload.duration;
        result.upload_speed = upload.speed;

        result
    }

    fn latency_gate_fails(&self, result: &ProxyResult) -> bool {
        if result.packet_loss >= 100.0 {
            return true;
        }
        let max = Duration::from_millis(self.config.max_latency_ms);
        !max.is_zero() && result.latency > max
    }

    fn latency_gate_reason(&self, result: &ProxyResult) -> String {
        if result.packet_loss >= 100.0 {
            "all latency probes failed".to_owned()
        } else {
            format!(
                "latency {}ms exceeds maximum {}ms",
                result.latency.as_millis(),
                self.config.max_latency_ms
            )
        }
    }
}
