// Core result and configuration types for unlock detection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome classification for one platform probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlockStatus {
    /// The platform is reachable and serving content.
    Unlocked,
    /// The platform explicitly refuses service from this exit
    /// (a confident "not available" determination, never retried).
    Locked,
    /// The probe completed but the response was ambiguous.
    Failed,
    /// The probe itself failed (transport error, unknown platform).
    /// This is the only status eligible for retry.
    Error,
}

impl UnlockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unlocked => "unlocked",
            Self::Locked => "locked",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

/// Result of probing one platform through one proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockResult {
    pub platform: String,
    pub status: UnlockStatus,
    /// Region code extracted from the platform response, empty if unknown.
    #[serde(default)]
    pub region: String,
    pub message: String,
    /// Wall-clock duration of the probe, recorded by the dispatcher.
    #[serde(rename = "latency_ms")]
    pub latency_ms: i64,
    pub checked_at: DateTime<Utc>,
}

impl UnlockResult {
    pub fn new(
        platform: impl Into<String>,
        status: UnlockStatus,
        region: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            status,
            region: region.into(),
            message: message.into(),
            latency_ms: 0,
            checked_at: Utc::now(),
        }
    }

    /// Probe-level failure (transport error, unreadable response).
    pub fn probe_error(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(platform, UnlockStatus::Error, "", message)
    }
}

/// Configuration for one unlock sweep.
///
/// Values are clamped by [`UnlockConfig::validated`] before use; both
/// the synchronous and task-based entry points go through the same
/// pass so defaults cannot drift between call sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockConfig {
    pub enabled: bool,
    /// Platform names to probe, in request order.
    pub platforms: Vec<String>,
    /// Maximum number of platform probes in flight at once.
    pub concurrent: usize,
    /// Per-probe timeout in seconds.
    pub timeout: u64,
    /// Retry probes that ended in `error` status (never `locked`).
    pub retry_on_error: bool,
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            platforms: crate::settings::default_platforms(),
            concurrent: 5,
            timeout: 10,
            retry_on_error: true,
        }
    }
}

impl UnlockConfig {
    /// Apply defaults and clamp out-of-range values.
    ///
    /// Concurrency is kept in `[1, 20]`, timeout in `[1, 60]` seconds,
    /// and an empty platform list falls back to the default set.
    pub fn validated(mut self) -> Self {
        if self.concurrent == 0 {
            self.concurrent = 5;
        }
        self.concurrent = self.concurrent.min(20);

        if self.timeout == 0 {
            self.timeout = 10;
        }
        self.timeout = self.timeout.min(60);

        if self.platforms.is_empty() {
            self.platforms = crate::settings::default_platforms();
        }

        self
    }

    /// Disabled configuration: the dispatcher becomes a no-op.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Compact human-readable summary of a sweep: unlocked platforms as
/// `"Platform:REGION"` pairs, truncated past 100 characters.
pub fn unlock_summary_text(results: &[UnlockResult]) -> String {
    if results.is_empty() {
        return "N/A".into();
    }

    let unlocked: Vec<String> = results
        .iter()
        .filter(|r| r.status == UnlockStatus::Unlocked)
        .map(|r| {
            if r.region.is_empty() {
                r.platform.clone()
            } else {
                format!("{}:{}", r.platform, r.region)
            }
        })
        .collect();

    if unlocked.is_empty() {
        return "None".into();
    }

    let mut summary = String::new();
    for (i, item) in unlocked.iter().enumerate() {
        if i > 0 {
            summary.push_str(", ");
        }
        summary.push_str(item);
        if summary.len() > 100 && i < unlocked.len() - 1 {
            summary.push_str("...");
            break;
        }
    }
    summary
}
