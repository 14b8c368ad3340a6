// Throughput prober: concurrent chunked download/upload transfers.

use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::future::join_all;
use tracing::{debug, warn};

/// Worker cap for uploads over slow-handshake protocols.
const SLOW_UPLOAD_WORKERS: usize = 3;
/// Chunk size of the plain zero-filled upload body.
const UPLOAD_CHUNK: usize = 64 * 1024;
/// Chunk size and pacing of the throttled upload body.
const THROTTLE_CHUNK: usize = 256 * 1024;
const THROTTLE_DELAY: Duration = Duration::from_millis(1);

/// One worker's completed transfer.
#[derive(Debug, Clone, Copy)]
struct TransferMeasurement {
    bytes: u64,
    duration: Duration,
}

/// Aggregated result for one direction. All-workers-failed (or a
/// skipped direction) leaves every field at zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectionResult {
    pub bytes: u64,
    pub duration: Duration,
    /// Bytes per second.
    pub speed: f64,
}

impl DirectionResult {
    pub fn is_zero(&self) -> bool {
        self.bytes == 0
    }
}

/// Fan out `concurrent` download workers of `total_size / concurrent`
/// bytes each and aggregate their rates.
pub async fn download(
    client: &reqwest::Client,
    server_url: &str,
    total_size: u64,
    concurrent: usize,
) -> DirectionResult {
    let chunk_size = total_size / concurrent.max(1) as u64;
    if chunk_size == 0 {
        debug!(total_size, concurrent, "download chunk size is zero, skipping direction");
        return DirectionResult::default();
    }

    let workers = (0..concurrent).map(|_| {
        let client = client.clone();
        let url = format!("{server_url}/__down?bytes={chunk_size}");
        async move { download_worker(&client, &url).await }
    });

    aggregate("download", join_all(workers).await)
}

/// Fan out upload workers posting zero-filled bodies. Slow protocols
/// are capped at three workers with a throttled body; chunk size is
/// recomputed so total bytes are preserved.
pub async fn upload(
    client: &reqwest::Client,
    server_url: &str,
    total_size: u64,
    concurrent: usize,
    slow: bool,
) -> DirectionResult {
    let workers_n = if slow {
        concurrent.min(SLOW_UPLOAD_WORKERS)
    } else {
        concurrent
    };
    let chunk_size = total_size / workers_n.max(1) as u64;
    if chunk_size == 0 {
        debug!(total_size, concurrent, "upload chunk size is zero, skipping direction");
        return DirectionResult::default();
    }

    let workers = (0..workers_n).map(|_| {
        let client = client.clone();
        let url = format!("{server_url}/__up");
        async move { upload_worker(&client, &url, chunk_size, slow).await }
    });

    aggregate("upload", join_all(workers).await)
}

/// Sum bytes across successful workers, average their durations, and
/// derive bytes/second. All-failed yields the zero result with a
/// warning; the caller treats it as a low speed, not an error.
fn aggregate(direction: &str, results: Vec<Option<TransferMeasurement>>) -> DirectionResult {
    let launched = results.len();
    let successes: Vec<TransferMeasurement> = results.into_iter().flatten().collect();
    if successes.is_empty() {
        warn!(direction, launched, "every transfer worker failed");
        return DirectionResult::default();
    }

    let bytes: u64 = successes.iter().map(|m| m.bytes).sum();
    let total_secs: f64 = successes.iter().map(|m| m.duration.as_secs_f64()).sum();
    #[allow(clippy::cast_precision_loss)]
    let avg_secs = total_secs / successes.len() as f64;

    #[allow(clippy::cast_precision_loss)]
    let speed = if avg_secs > 0.0 {
        bytes as f64 / avg_secs
    } else {
        0.0
    };

    debug!(
        direction,
        workers = successes.len(),
        launched,
        bytes,
        speed_bps = speed as u64,
        "direction aggregated"
    );

    DirectionResult {
        bytes,
        duration: Duration::from_secs_f64(avg_secs),
        speed,
    }
}

/// One download transfer; the body is discarded while counting bytes.
/// A mid-stream error keeps the bytes read so far.
async fn download_worker(client: &reqwest::Client, url: &str) -> Option<TransferMeasurement> {
    let started = Instant::now();
    let response = client.get(url).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }

    let mut bytes: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => bytes += chunk.len() as u64,
            Err(_) => break,
        }
    }

    if bytes == 0 {
        return None;
    }
    Some(TransferMeasurement {
        bytes,
        duration: started.elapsed(),
    })
}

async fn upload_worker(
    client: &reqwest::Client,
    url: &str,
    size: u64,
    throttled: bool,
) -> Option<TransferMeasurement> {
    let started = Instant::now();
    let body = if throttled {
        throttled_zero_body(size)
    } else {
        zero_body(size)
    };

    let response = client
        .post(url)
        .header(reqwest::header::CONTENT_LENGTH, size)
        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
        .body(body)
        .send()
        .await
        .ok()?;

    if !response.status().is_success() {
        return None;
    }
    Some(TransferMeasurement {
        bytes: size,
        duration: started.elapsed(),
    })
}

/// Zero-filled streaming body of exactly `size` bytes.
fn zero_body(size: u64) -> reqwest::Body {
    let stream = async_stream::stream! {
        let mut remaining = size;
        while remaining > 0 {
            let n = remaining.min(UPLOAD_CHUNK as u64);
            remaining -= n;
            yield Ok::<_, std::io::Error>(Bytes::from(vec![0_u8; n as usize]));
        }
    };
    reqwest::Body::wrap_stream(stream)
}

/// Like [`zero_body`] but with fixed 256 KiB chunks and a pacing delay
/// between writes, for protocols that fall over on burst uploads.
fn throttled_zero_body(size: u64) -> reqwest::Body {
    let stream = async_stream::stream! {
        let mut remaining = size;
        while remaining > 0 {
            let n = remaining.min(THROTTLE_CHUNK as u64);
            remaining -= n;
            yield Ok::<_, std::io::Error>(Bytes::from(vec![0_u8; n as usize]));
            if remaining > 0 {
                tokio::time::sleep(THROTTLE_DELAY).await;
            }
        }
    };
    reqwest::Body::wrap_stream(stream)
}
