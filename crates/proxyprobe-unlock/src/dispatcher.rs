// Concurrency-bounded unlock sweep for one proxy.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::cache::{CacheKey, ResultCache};
use crate::detector::Detector;
use crate::registry::Registry;
use crate::types::{UnlockConfig, UnlockResult, UnlockStatus};

const MAX_RETRIES: u32 = 2;

/// Runs unlock sweeps: for one proxy and one tunnel client, probe the
/// requested platforms in priority order, at most `concurrent` at a
/// time, consulting the shared result cache before each probe.
pub struct Dispatcher {
    registry: Arc<Registry>,
    cache: Arc<ResultCache>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, cache: Arc<ResultCache>) -> Self {
        Self { registry, cache }
    }

    /// Dispatcher over the built-in detector set with a fresh cache.
    pub fn with_builtin() -> Self {
        Self::new(
            Arc::new(Registry::with_builtin()),
            Arc::new(ResultCache::new()),
        )
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Probe every requested platform for `proxy` through `client`.
    ///
    /// Returns one result per requested platform, in priority order
    /// (stable: platforms with equal priority keep their request
    /// order). A disabled config yields an empty sweep.
    pub async fn detect_all(
        &self,
        proxy: &str,
        client: &reqwest::Client,
        config: &UnlockConfig,
    ) -> Vec<UnlockResult> {
        if !config.enabled {
            return Vec::new();
        }
        let config = config.clone().validated();

        let mut platforms = config.platforms.clone();
        platforms.sort_by_key(|p| self.registry.priority_of(p));

        debug!(
            proxy = %proxy,
            platforms = platforms.len(),
            concurrent = config.concurrent,
            "starting unlock sweep"
        );

        let semaphore = Arc::new(Semaphore::new(config.concurrent));
        let mut handles = Vec::with_capacity(platforms.len());

        for platform in platforms {
            let key = CacheKey::new(proxy, &platform);
            if let Some(cached) = self.cache.get(&key) {
                debug!(proxy = %proxy, platform = %platform, "unlock cache hit");
                handles.push(SweepHandle::Cached(cached));
                continue;
            }

            let Some(detector) = self.registry.get(&platform) else {
                warn!(platform = %platform, "no detector registered for platform");
                handles.push(SweepHandle::Cached(UnlockResult::probe_error(
                    &platform,
                    format!("unknown platform {platform:?}"),
                )));
                continue;
            };

            let semaphore = Arc::clone(&semaphore);
            let cache = Arc::clone(&self.cache);
            let client = client.clone();
            let retry_on_error = config.retry_on_error;
            let probe_timeout = Duration::from_secs(config.timeout);

            let task = tokio::spawn(async move {
                // Semaphore closure cannot happen while the sweep holds it.
                let _permit = semaphore.acquire().await.ok();
                let result =
                    run_probe(detector.as_ref(), &client, probe_timeout, retry_on_error).await;
                cache.set(key, result.clone(), None);
                result
            });
            handles.push(SweepHandle::Spawned { platform, task });
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle {
                SweepHandle::Cached(result) => results.push(result),
                SweepHandle::Spawned { platform, task } => match task.await {
                    Ok(result) => results.push(result),
                    Err(e) => {
                        warn!(platform = %platform, error = %e, "unlock probe task panicked");
                        results.push(UnlockResult::probe_error(
                            &platform,
                            format!("probe task panicked: {e}"),
                        ));
                    }
                },
            }
        }
        results
    }
}

enum SweepHandle {
    Cached(UnlockResult),
    Spawned {
        platform: String,
        task: tokio::task::JoinHandle<UnlockResult>,
    },
}

/// One probe with timeout, latency accounting, and optional retry.
///
/// Only `error` outcomes are retried; a confident `locked` answer is a
/// final determination. Backoff doubles per attempt (1s, 2s). The
/// recorded latency is wall-clock across the whole retry sequence,
/// backoff sleeps included.
async fn run_probe(
    detector: &dyn Detector,
    client: &reqwest::Client,
    probe_timeout: Duration,
    retry_on_error: bool,
) -> UnlockResult {
    let attempts = if retry_on_error { MAX_RETRIES + 1 } else { 1 };
    let started = Utc::now();

    let mut result = attempt_probe(detector, client, probe_timeout).await;
    for retry in 1..attempts {
        if result.status != UnlockStatus::Error {
            break;
        }
        let backoff = Duration::from_secs(1 << (retry - 1));
        debug!(
            platform = detector.platform(),
            retry,
            backoff_secs = backoff.as_secs(),
            "retrying unlock probe after error"
        );
        tokio::time::sleep(backoff).await;
        result = attempt_probe(detector, client, probe_timeout).await;
    }

    if result.status == UnlockStatus::Error && retry_on_error {
        result.message = format!("{} (failed after {MAX_RETRIES} retries)", result.message);
    }

    result.latency_ms = (Utc::now() - started).num_milliseconds();
    result.checked_at = Utc::now();
    result
}

async fn attempt_probe(
    detector: &dyn Detector,
    client: &reqwest::Client,
    probe_timeout: Duration,
) -> UnlockResult {
    match timeout(probe_timeout, detector.detect(client)).await {
        Ok(result) => result,
        Err(_) => UnlockResult::probe_error(
            detector.platform(),
            format!("probe timed out after {}s", probe_timeout.as_secs()),
        ),
    }
}
