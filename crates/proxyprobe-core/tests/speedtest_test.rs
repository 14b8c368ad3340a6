//! End-to-end pipeline scenarios against a mock speed-test endpoint.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use proxyprobe_core::{
    FixedClientFactory, Protocol, ProxyCatalog, ProxyIdentity, SpeedTester, TestConfig, TestMode,
    TestOutcome,
};
use proxyprobe_unlock::cache::ResultCache;
use proxyprobe_unlock::detector::FnDetector;
use proxyprobe_unlock::{Dispatcher, Registry, UnlockConfig, UnlockResult, UnlockStatus};

fn identity(name: &str) -> ProxyIdentity {
    let mut attrs: IndexMap<String, serde_yaml::Value> = IndexMap::new();
    attrs.insert("server".into(), "192.0.2.10".into());
    attrs.insert("port".into(), serde_yaml::Value::from(443_u64));
    ProxyIdentity::new(name, Protocol::Http, attrs)
}

fn catalog(names: &[&str]) -> ProxyCatalog {
    let mut catalog = ProxyCatalog::new();
    for name in names {
        catalog.insert(identity(name));
    }
    catalog
}

fn tester(config: TestConfig, dispatcher: Option<Arc<Dispatcher>>) -> SpeedTester {
    SpeedTester::with_parts(
        config,
        Arc::new(FixedClientFactory::new(reqwest::Client::new())),
        dispatcher,
    )
}

/// Mock endpoint serving latency pings, chunked downloads, and uploads.
async fn mock_speed_server(chunk_size: usize) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/__down"))
        .and(query_param("bytes", "0"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/__down"))
        .and(query_param("bytes", chunk_size.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0_u8; chunk_size]))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/__up"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn unreachable_proxy_short_circuits_in_speed_only_mode() {
    // every request fails: latency gate must end the test
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = TestConfig {
        server_url: server.uri(),
        mode: TestMode::SpeedOnly,
        max_latency_ms: 50,
        ..TestConfig::default()
    };
    let tester = tester(config, None);

    let result = tester.test_proxy(&identity("dead-node")).await;

    assert!((result.packet_loss - 100.0).abs() < f64::EPSILON);
    assert!(result.latency.is_zero());
    assert_eq!(result.download_size, 0, "no download attempted");
    assert_eq!(result.upload_size, 0, "no upload attempted");
    assert!(result.unlock_results.is_empty());
    assert_eq!(result.failure_stage.as_deref(), Some("latency"));
}

#[tokio::test]
async fn both_mode_runs_unlock_and_throughput() {
    let server = mock_speed_server(4096).await;

    let mut registry = Registry::new();
    registry
        .register(Arc::new(FnDetector::new("Netflix", 1, |_client| {
            Box::pin(async {
                UnlockResult::new("Netflix", UnlockStatus::Unlocked, "US", "stub")
            })
        })))
        .unwrap();
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(registry),
        Arc::new(ResultCache::new()),
    ));

    let config = TestConfig {
        server_url: server.uri(),
        mode: TestMode::Both,
        download_size: 8192,
        upload_size: 8192,
        concurrent: 2,
        unlock: UnlockConfig {
            platforms: vec!["Netflix".into()],
            ..UnlockConfig::default()
        },
        ..TestConfig::default()
    };
    let tester = tester(config, Some(dispatcher));

    let result = tester.test_proxy(&identity("good-node")).await;

    assert!(result.latency > std::time::Duration::ZERO);
    assert_eq!(result.download_size, 8192);
    assert_eq!(result.upload_size, 8192);
    assert!(result.download_speed > 0.0);

    assert_eq!(result.unlock_summary.total_supported, 1);
    assert_eq!(result.unlock_summary.supported_platforms, vec!["Netflix:US"]);
}

#[tokio::test]
async fn unlock_only_mode_skips_latency_and_throughput() {
    // no speed endpoint at all: unlock_only must not touch it
    let server = MockServer::start().await;

    let mut registry = Registry::new();
    registry
        .register(Arc::new(FnDetector::new("Netflix", 1, |_client| {
            Box::pin(async {
                UnlockResult::new("Netflix", UnlockStatus::Locked, "", "stub")
            })
        })))
        .unwrap();
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(registry),
        Arc::new(ResultCache::new()),
    ));

    let config = TestConfig {
        server_url: server.uri(),
        mode: TestMode::UnlockOnly,
        unlock: UnlockConfig {
            platforms: vec!["Netflix".into()],
            ..UnlockConfig::default()
        },
        ..TestConfig::default()
    };
    let tester = tester(config, Some(dispatcher));

    let result = tester.test_proxy(&identity("node")).await;

    assert!(result.latency.is_zero());
    assert_eq!(result.download_size, 0);
    assert_eq!(result.unlock_summary.total_tested, 1);
    assert_eq!(result.unlock_summary.unsupported_platforms, vec!["Netflix"]);
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn min_download_speed_gate_skips_upload() {
    let server = mock_speed_server(4096).await;

    let config = TestConfig {
        server_url: server.uri(),
        mode: TestMode::SpeedOnly,
        download_size: 8192,
        upload_size: 8192,
        concurrent: 2,
        // impossibly high floor: any real measurement is below it
        min_download_speed: 1e15,
        ..TestConfig::default()
    };
    let tester = tester(config, None);

    let result = tester.test_proxy(&identity("node")).await;

    assert_eq!(result.download_size, 8192);
    assert_eq!(result.upload_size, 0, "upload skipped after failed floor");
    assert_eq!(result.failure_stage.as_deref(), Some("download"));
}

#[tokio::test]
async fn fast_mode_skips_throughput() {
    let server = mock_speed_server(4096).await;

    let config = TestConfig {
        server_url: server.uri(),
        mode: TestMode::SpeedOnly,
        fast_mode: true,
        ..TestConfig::default()
    };
    let tester = tester(config, None);

    let result = tester.test_proxy(&identity("node")).await;
    assert!(result.latency > std::time::Duration::ZERO);
    assert_eq!(result.download_size, 0);
}

#[tokio::test]
async fn sweep_delivers_one_result_per_proxy() {
    let server = mock_speed_server(4096).await;

    let config = TestConfig {
        server_url: server.uri(),
        mode: TestMode::SpeedOnly,
        download_size: 8192,
        upload_size: 8192,
        concurrent: 2,
        ..TestConfig::default()
    };
    let tester = tester(config, None);

    let mut names = Vec::new();
    tester
        .test_proxies(&catalog(&["a", "b"]), |result| {
            names.push(result.proxy_name);
        })
        .await;
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn cancellation_stops_before_the_next_proxy() {
    let server = mock_speed_server(4096).await;

    let config = TestConfig {
        server_url: server.uri(),
        mode: TestMode::SpeedOnly,
        fast_mode: true,
        ..TestConfig::default()
    };
    let tester = tester(config, None);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut delivered = 0;
    let outcome = tester
        .test_proxies_cancellable(&catalog(&["a", "b"]), &cancel, |_| delivered += 1)
        .await;

    assert_eq!(outcome, TestOutcome::Cancelled);
    assert_eq!(delivered, 0);
}
