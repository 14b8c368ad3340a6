// Detector contract: one implementation per platform.

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::types::UnlockResult;

/// Default priority assigned to platforms without a registered
/// detector (1 = highest, 3 = lowest).
pub const DEFAULT_PRIORITY: u8 = 3;

/// A per-platform unlock probe.
///
/// Implementations issue one or more HTTP requests through the
/// caller-supplied tunnel client and inspect status codes, body
/// markers, redirects, or cookies for platform-specific signals.
/// A detector must never panic on malformed responses — ambiguity
/// maps to `Failed`, transport trouble to `Error`.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Probe the platform through `client` and classify the outcome.
    async fn detect(&self, client: &reqwest::Client) -> UnlockResult;

    /// Platform name this detector answers for (registry key).
    fn platform(&self) -> &str;

    /// Dispatch priority, 1 = highest.
    fn priority(&self) -> u8;
}

type ProbeFn =
    Box<dyn for<'a> Fn(&'a reqwest::Client) -> BoxFuture<'a, UnlockResult> + Send + Sync>;

/// Adapter wrapping a plain probe function in the [`Detector`]
/// interface, so the dispatcher never needs to know which shape it
/// is calling.
pub struct FnDetector {
    platform: String,
    priority: u8,
    probe: ProbeFn,
}

impl FnDetector {
    pub fn new<F>(platform: impl Into<String>, priority: u8, probe: F) -> Self
    where
        F: for<'a> Fn(&'a reqwest::Client) -> BoxFuture<'a, UnlockResult> + Send + Sync + 'static,
    {
        Self {
            platform: platform.into(),
            priority,
            probe: Box::new(probe),
        }
    }
}

#[async_trait]
impl Detector for FnDetector {
    async fn detect(&self, client: &reqwest::Client) -> UnlockResult {
        (self.probe)(client).await
    }

    fn platform(&self) -> &str {
        &self.platform
    }

    fn priority(&self) -> u8 {
        self.priority
    }
}
