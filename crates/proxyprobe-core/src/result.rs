// Per-proxy result and the helpers the reporting layer applies.

use std::time::Duration;

use serde::Serialize;

use proxyprobe_unlock::{UnlockResult, UnlockStatus};

use crate::error::TestError;

/// Summary of one proxy's unlock sweep in the externally-reported
/// shape: supported platforms annotated with their region.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnlockSummary {
    pub total_tested: usize,
    pub total_supported: usize,
    /// `"Platform"` or `"Platform:REGION"` entries.
    pub supported_platforms: Vec<String>,
    pub unsupported_platforms: Vec<String>,
}

impl UnlockSummary {
    /// Fold raw sweep results into the summary shape.
    pub fn from_results(results: &[UnlockResult]) -> Self {
        let mut summary = Self {
            total_tested: results.len(),
            ..Self::default()
        };
        for result in results {
            if result.status == UnlockStatus::Unlocked {
                summary.total_supported += 1;
                if result.region.is_empty() {
                    summary.supported_platforms.push(result.platform.clone());
                } else {
                    summary
                        .supported_platforms
                        .push(format!("{}:{}", result.platform, result.region));
                }
            } else {
                summary.unsupported_platforms.push(result.platform.clone());
            }
        }
        summary
    }
}

/// Final measurement record for one proxy. Produced once by the
/// tester, immutable afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProxyResult {
    pub proxy_name: String,
    pub proxy_type: String,
    pub proxy_ip: String,

    #[serde(with = "millis")]
    pub latency: Duration,
    #[serde(with = "millis")]
    pub jitter: Duration,
    pub packet_loss: f64,

    pub download_size: u64,
    #[serde(with = "millis")]
    pub download_time: Duration,
    /// Bytes per second.
    pub download_speed: f64,

    pub upload_size: u64,
    #[serde(with = "millis")]
    pub upload_time: Duration,
    pub upload_speed: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_error: Option<TestError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    pub unlock_results: Vec<UnlockResult>,
    pub unlock_summary: UnlockSummary,
}

mod millis {
    use super::Duration;
    use serde::Serializer;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u128(value.as_millis())
    }
}

impl ProxyResult {
    pub fn format_latency(&self) -> String {
        if self.latency.is_zero() {
            "N/A".into()
        } else {
            format!("{}ms", self.latency.as_millis())
        }
    }

    pub fn format_jitter(&self) -> String {
        if self.jitter.is_zero() {
            "N/A".into()
        } else {
            format!("{}ms", self.jitter.as_millis())
        }
    }

    pub fn format_packet_loss(&self) -> String {
        format!("{:.1}%", self.packet_loss)
    }

    pub fn format_download_speed(&self) -> String {
        format_speed(self.download_speed)
    }

    pub fn format_upload_speed(&self) -> String {
        format_speed(self.upload_speed)
    }
}

/// Human-readable bytes-per-second.
pub fn format_speed(bytes_per_sec: f64) -> String {
    const UNITS: &[&str] = &["B/s", "KB/s", "MB/s", "GB/s", "TB/s"];
    let mut value = bytes_per_sec;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// Keep results meeting every active threshold. A zero threshold
/// disables that check; a zero-latency (unreachable) result never
/// passes an active latency threshold.
pub fn filter_results(
    results: Vec<ProxyResult>,
    max_latency: Duration,
    min_download_speed: f64,
    min_upload_speed: f64,
) -> Vec<ProxyResult> {
    results
        .into_iter()
        .filter(|r| {
            if !max_latency.is_zero() && (r.latency.is_zero() || r.latency > max_latency) {
                return false;
            }
            if min_download_speed > 0.0 && r.download_speed < min_download_speed {
                return false;
            }
            if min_upload_speed > 0.0 && r.upload_speed < min_upload_speed {
                return false;
            }
            true
        })
        .collect()
}
