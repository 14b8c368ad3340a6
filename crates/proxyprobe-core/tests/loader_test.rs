//! Catalog loading against real files and a mock HTTP source.

#![allow(clippy::unwrap_used)]

use std::io::Write;

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use proxyprobe_core::{CoreError, FilterSpec, Loader};

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn loads_proxies_from_a_local_file() {
    let file = write_temp(
        r"proxies:
  - name: tokyo-1
    type: vmess
    server: 1.2.3.4
    port: 443
  - name: osaka-1
    type: trojan
    server: 5.6.7.8
    port: 443
",
    );

    let catalog = Loader::new()
        .load(file.path().to_str().unwrap(), false)
        .await
        .unwrap();

    assert_eq!(catalog.len(), 2);
    assert!(catalog.contains("tokyo-1"));
    assert_eq!(
        catalog.available_protocols().len(),
        2,
        "two distinct protocols"
    );
}

#[tokio::test]
async fn duplicate_name_within_one_source_is_fatal() {
    let file = write_temp(
        r"proxies:
  - name: dup
    type: vmess
    server: 1.2.3.4
    port: 443
  - name: dup
    type: trojan
    server: 5.6.7.8
    port: 443
",
    );

    let err = Loader::new()
        .load(file.path().to_str().unwrap(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateProxy { name, .. } if name == "dup"));
}

#[tokio::test]
async fn duplicates_across_sources_keep_the_first() {
    let first = write_temp(
        r"proxies:
  - name: shared
    type: vmess
    server: 1.1.1.1
    port: 443
",
    );
    let second = write_temp(
        r"proxies:
  - name: shared
    type: trojan
    server: 2.2.2.2
    port: 443
",
    );

    let sources = format!(
        "{}, {}",
        first.path().to_str().unwrap(),
        second.path().to_str().unwrap()
    );
    let catalog = Loader::new().load(&sources, false).await.unwrap();

    assert_eq!(catalog.len(), 1);
    assert_eq!(
        catalog.get("shared").unwrap().server().unwrap(),
        "1.1.1.1",
        "first occurrence wins"
    );
}

#[tokio::test]
async fn unreachable_source_is_skipped_not_fatal() {
    let good = write_temp(
        r"proxies:
  - name: only
    type: vmess
    server: 1.2.3.4
    port: 443
",
    );

    let sources = format!(
        "/nonexistent/path.yaml, {}",
        good.path().to_str().unwrap()
    );
    let catalog = Loader::new().load(&sources, false).await.unwrap();
    assert_eq!(catalog.len(), 1);
}

#[tokio::test]
async fn malformed_yaml_aborts_the_load() {
    let file = write_temp("proxies: [unclosed");
    let result = Loader::new()
        .load(file.path().to_str().unwrap(), false)
        .await;
    assert!(matches!(result, Err(CoreError::ConfigParse(_))));
}

#[tokio::test]
async fn fetches_http_sources_and_providers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/provider.yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r"proxies:
  - name: remote-1
    type: vless
    server: 9.9.9.9
    port: 443
",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/config.yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r"proxies:
  - name: direct-1
    type: vmess
    server: 1.2.3.4
    port: 443
proxy-providers:
  upstream:
    url: {}/provider.yaml
",
            server.uri()
        )))
        .mount(&server)
        .await;

    let catalog = Loader::new()
        .load(&format!("{}/config.yaml", server.uri()), false)
        .await
        .unwrap();

    assert_eq!(catalog.len(), 2);
    assert!(catalog.contains("direct-1"));
    assert!(
        catalog.contains("[upstream] remote-1"),
        "provider proxies get composite keys"
    );
}

#[tokio::test]
async fn reserved_provider_name_is_fatal() {
    let file = write_temp(
        r"proxies: []
proxy-providers:
  default:
    url: http://127.0.0.1:1/x.yaml
",
    );

    let err = Loader::new()
        .load(file.path().to_str().unwrap(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ReservedProviderName { name } if name == "default"));
}

#[tokio::test]
async fn base64_encoded_sources_are_decoded() {
    use base64::Engine as _;

    let yaml = r"proxies:
  - name: encoded-1
    type: vmess
    server: 1.2.3.4
    port: 443
";
    let file = write_temp(&base64::engine::general_purpose::STANDARD.encode(yaml));

    let catalog = Loader::new()
        .load(file.path().to_str().unwrap(), false)
        .await
        .unwrap();
    assert!(catalog.contains("encoded-1"));
}

#[tokio::test]
async fn compatibility_filter_drops_incompatible_entries() {
    let file = write_temp(
        r"proxies:
  - name: good-ss
    type: ss
    cipher: aes-256-gcm
    server: 1.2.3.4
    port: 443
  - name: bad-ss
    type: ss
    cipher: rc4-md5
    server: 1.2.3.4
    port: 443
  - name: old
    type: ssr
    server: 1.2.3.4
    port: 443
",
    );

    let catalog = Loader::new()
        .load(file.path().to_str().unwrap(), true)
        .await
        .unwrap();
    let names: Vec<&str> = catalog.names().collect();
    assert_eq!(names, vec!["good-ss"]);
}

#[tokio::test]
async fn filters_compose_after_load() {
    let file = write_temp(
        r"proxies:
  - name: A-us
    type: vmess
    server: 1.2.3.4
    port: 443
  - name: B-jp
    type: vmess
    server: 1.2.3.4
    port: 443
  - name: C-us
    type: trojan
    server: 1.2.3.4
    port: 443
",
    );

    let catalog = Loader::new()
        .load(file.path().to_str().unwrap(), false)
        .await
        .unwrap();

    let spec = FilterSpec {
        name_regex: ".+".into(),
        include: vec!["US".into()],
        ..FilterSpec::default()
    };
    let filtered = spec.apply(catalog).unwrap();
    let names: Vec<&str> = filtered.names().collect();
    assert_eq!(names, vec!["A-us", "C-us"]);
}
