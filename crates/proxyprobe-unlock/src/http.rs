// Shared HTTP helpers for platform probes.

use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::header::{HeaderMap, HeaderValue};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
];

static UA_CURSOR: AtomicUsize = AtomicUsize::new(0);

/// Rotating desktop-browser User-Agent for probe requests.
pub fn next_user_agent() -> &'static str {
    let idx = UA_CURSOR.fetch_add(1, Ordering::Relaxed);
    USER_AGENTS[idx % USER_AGENTS.len()]
}

/// Browser-like default headers shared by all platform probes.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert("DNT", HeaderValue::from_static("1"));
    headers.insert(
        reqwest::header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}

/// Issue a GET with browser-like headers through the tunnel client.
pub async fn probe_get(
    client: &reqwest::Client,
    url: &str,
) -> Result<reqwest::Response, reqwest::Error> {
    client
        .get(url)
        .headers(browser_headers())
        .header(reqwest::header::USER_AGENT, next_user_agent())
        .send()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_rotates() {
        let first = next_user_agent();
        let second = next_user_agent();
        assert!(USER_AGENTS.contains(&first));
        assert!(USER_AGENTS.contains(&second));
    }

    #[test]
    fn browser_headers_present() {
        let headers = browser_headers();
        assert!(headers.contains_key(reqwest::header::ACCEPT));
        assert!(headers.contains_key("DNT"));
    }
}
