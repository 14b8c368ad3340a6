// Latency prober: repeated small probes, mean/jitter/loss statistics.

use std::time::{Duration, Instant};

use tracing::debug;

/// Probe counts per protocol class. Slow-handshake protocols get
/// fewer samples to keep the phase bounded.
const PROBE_COUNT: usize = 6;
const SLOW_PROBE_COUNT: usize = 3;
const PROBE_PACING: Duration = Duration::from_millis(100);

/// Statistics from one latency probing run.
///
/// Zero `avg` together with 100% loss means "unreachable", not
/// zero-millisecond latency.
#[derive(Debug, Clone, Default)]
pub struct LatencyStats {
    pub avg: Duration,
    /// Population standard deviation of the successful samples.
    pub jitter: Duration,
    /// Failed probes as a percentage of attempts.
    pub packet_loss: f64,
    /// Last observed failure, for diagnostics only.
    pub last_error: Option<String>,
}

impl LatencyStats {
    pub fn unreachable(&self) -> bool {
        self.packet_loss >= 100.0
    }
}

/// Probe `{server_url}/__down?bytes=0` K times through `client` with
/// fixed pacing, counting non-200 responses and transport errors as
/// losses.
pub async fn probe(client: &reqwest::Client, server_url: &str, slow: bool) -> LatencyStats {
    let attempts = if slow { SLOW_PROBE_COUNT } else { PROBE_COUNT };
    let url = format!("{server_url}/__down?bytes=0");

    let mut samples: Vec<Duration> = Vec::with_capacity(attempts);
    let mut failed = 0_usize;
    let mut last_error: Option<String> = None;

    for attempt in 0..attempts {
        let started = Instant::now();
        match client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                samples.push(started.elapsed());
            }
            Ok(response) => {
                failed += 1;
                last_error = Some(format!("latency probe returned {}", response.status()));
            }
            Err(e) => {
                failed += 1;
                last_error = Some(e.to_string());
            }
        }
        if attempt + 1 < attempts {
            tokio::time::sleep(PROBE_PACING).await;
        }
    }

    let (avg, jitter) = stats(&samples);
    #[allow(clippy::cast_precision_loss)]
    let packet_loss = failed as f64 / attempts as f64 * 100.0;

    debug!(
        attempts,
        failed,
        avg_ms = avg.as_millis() as u64,
        jitter_ms = jitter.as_millis() as u64,
        "latency probing finished"
    );

    LatencyStats {
        avg,
        jitter,
        packet_loss,
        last_error,
    }
}

/// Mean and population standard deviation of a sample set. One or
/// zero samples yields zero jitter.
fn stats(samples: &[Duration]) -> (Duration, Duration) {
    if samples.is_empty() {
        return (Duration::ZERO, Duration::ZERO);
    }

    #[allow(clippy::cast_precision_loss)]
    let n = samples.len() as f64;
    let mean = samples.iter().map(Duration::as_secs_f64).sum::<f64>() / n;

    let jitter = if samples.len() > 1 {
        let variance = samples
            .iter()
            .map(|s| {
                let d = s.as_secs_f64() - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        variance.sqrt()
    } else {
        0.0
    };

    (
        Duration::from_secs_f64(mean),
        Duration::from_secs_f64(jitter),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn identical_samples_have_zero_jitter() {
        let samples = vec![Duration::from_millis(100); 3];
        let (avg, jitter) = stats(&samples);
        assert_eq!(avg, Duration::from_millis(100));
        assert_eq!(jitter, Duration::ZERO);
    }

    #[test]
    fn mean_of_two_samples() {
        let samples = vec![Duration::ZERO, Duration::from_millis(200)];
        let (avg, jitter) = stats(&samples);
        assert_eq!(avg, Duration::from_millis(100));
        assert!(jitter > Duration::ZERO);
    }

    #[test]
    fn empty_sample_set_is_all_zero() {
        let (avg, jitter) = stats(&[]);
        assert_eq!(avg, Duration::ZERO);
        assert_eq!(jitter, Duration::ZERO);
    }

    #[tokio::test]
    async fn all_failures_report_full_loss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = probe(&reqwest::Client::new(), &server.uri(), true).await;
        assert!(result.unreachable());
        assert_eq!(result.avg, Duration::ZERO);
        assert!(result.last_error.is_some());
    }

    #[tokio::test]
    async fn successful_probes_produce_samples() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/__down"))
            .and(query_param("bytes", "0"))
            .respond_with(ResponseTemplate::new(200))
            .expect(3)
            .mount(&server)
            .await;

        let result = probe(&reqwest::Client::new(), &server.uri(), true).await;
        assert!((result.packet_loss - 0.0).abs() < f64::EPSILON);
        assert!(result.avg > Duration::ZERO);
    }
}
