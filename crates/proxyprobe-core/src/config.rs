// Per-run test configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use proxyprobe_unlock::UnlockConfig;

const DEFAULT_SERVER_URL: &str = "https://speed.cloudflare.com";
const DEFAULT_DOWNLOAD_SIZE: u64 = 100 * 1024 * 1024;
const DEFAULT_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONCURRENT: usize = 4;

/// Which phases of the per-proxy pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMode {
    /// Latency and throughput only; no unlock sweep.
    #[default]
    SpeedOnly,
    /// Unlock sweep only; the latency phase is skipped.
    UnlockOnly,
    /// Full pipeline.
    Both,
}

impl TestMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SpeedOnly => "speed_only",
            Self::UnlockOnly => "unlock_only",
            Self::Both => "both",
        }
    }
}

/// Immutable description of one test run. Build it once, validate with
/// [`TestConfig::normalized`], and hand it to the tester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
    /// Comma-separated list of catalog sources (file paths or URLs).
    pub config_paths: String,
    /// Speed-test endpoint serving `/__down` and `/__up`.
    pub server_url: String,
    pub download_size: u64,
    pub upload_size: u64,
    /// Per-request timeout in seconds.
    pub timeout: u64,
    /// Worker count for each throughput direction.
    pub concurrent: usize,
    pub mode: TestMode,
    /// Skip throughput even when the mode allows it.
    pub fast_mode: bool,

    // ── Filters ──
    /// Regex the proxy name must match.
    pub name_regex: String,
    /// Case-insensitive substrings; any match keeps the proxy.
    pub include: Vec<String>,
    /// Case-insensitive substrings; any match drops the proxy.
    pub exclude: Vec<String>,
    /// Protocol tags to keep; empty keeps all.
    pub protocols: Vec<String>,
    /// Drop proxies with known-incompatible protocol/cipher combos.
    pub compatibility_filter: bool,

    // ── Acceptance thresholds ──
    /// Maximum acceptable average latency in milliseconds (0 = no limit).
    pub max_latency_ms: u64,
    /// Minimum acceptable download speed in bytes/second (0 = no floor).
    pub min_download_speed: f64,
    /// Minimum acceptable upload speed in bytes/second (0 = no floor).
    pub min_upload_speed: f64,

    pub unlock: UnlockConfig,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            config_paths: String::new(),
            server_url: DEFAULT_SERVER_URL.to_owned(),
            download_size: DEFAULT_DOWNLOAD_SIZE,
            upload_size: DEFAULT_UPLOAD_SIZE,
            timeout: DEFAULT_TIMEOUT_SECS,
            concurrent: DEFAULT_CONCURRENT,
            mode: TestMode::SpeedOnly,
            fast_mode: false,
            name_regex: String::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            protocols: Vec::new(),
            compatibility_filter: false,
            max_latency_ms: 0,
            min_download_speed: 0.0,
            min_upload_speed: 0.0,
            unlock: UnlockConfig::disabled(),
        }
    }
}

impl TestConfig {
    /// Apply defaults, then validate. Both the synchronous and the
    /// task-based entry points call this so defaults cannot drift.
    pub fn normalized(mut self) -> Self {
        if self.server_url.is_empty() {
            self.server_url = DEFAULT_SERVER_URL.to_owned();
        }
        self.server_url = self.server_url.trim_end_matches('/').to_owned();

        if self.download_size == 0 {
            self.download_size = DEFAULT_DOWNLOAD_SIZE;
        }
        if self.upload_size == 0 {
            self.upload_size = DEFAULT_UPLOAD_SIZE;
        }
        if self.timeout == 0 {
            self.timeout = DEFAULT_TIMEOUT_SECS;
        }
        if self.concurrent == 0 {
            self.concurrent = DEFAULT_CONCURRENT;
        }

        self.unlock = self.unlock.validated();
        self
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Whether the unlock phase is configured to run at all.
    pub fn unlock_enabled(&self) -> bool {
        self.mode != TestMode::SpeedOnly && self.unlock.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalization_fills_defaults() {
        let cfg = TestConfig {
            server_url: String::new(),
            download_size: 0,
            upload_size: 0,
            timeout: 0,
            concurrent: 0,
            ..TestConfig::default()
        }
        .normalized();

        assert_eq!(cfg.server_url, DEFAULT_SERVER_URL);
        assert_eq!(cfg.download_size, DEFAULT_DOWNLOAD_SIZE);
        assert_eq!(cfg.upload_size, DEFAULT_UPLOAD_SIZE);
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.concurrent, DEFAULT_CONCURRENT);
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let cfg = TestConfig {
            server_url: "https://example.com/".into(),
            ..TestConfig::default()
        }
        .normalized();
        assert_eq!(cfg.server_url, "https://example.com");
    }

    #[test]
    fn unlock_enabled_respects_mode() {
        let mut cfg = TestConfig {
            mode: TestMode::SpeedOnly,
            unlock: UnlockConfig::default(),
            ..TestConfig::default()
        };
        assert!(!cfg.unlock_enabled());

        cfg.mode = TestMode::Both;
        assert!(cfg.unlock_enabled());

        cfg.unlock = UnlockConfig::disabled();
        assert!(!cfg.unlock_enabled());
    }
}
