// Netflix: fetch an original title and look for region/block markers.

use async_trait::async_trait;
use tracing::debug;

use crate::detector::Detector;
use crate::http::probe_get;
use crate::types::{UnlockResult, UnlockStatus};

// A Netflix original; originals are available in every serving region,
// so a 404 here means the exit is not served at all.
const DEFAULT_ENDPOINT: &str = "https://www.netflix.com/title/81280792";

pub struct NetflixDetector {
    endpoint: String,
}

impl NetflixDetector {
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
        }
    }

    /// Probe an alternative endpoint (mirrors, tests).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn extract_region(body: &str) -> String {
        // `"requestCountry":{"id":"US",...}` appears in the page's
        // embedded JSON context.
        for marker in ["\"requestCountry\":{\"id\":\"", "\"country\":\""] {
            if let Some(pos) = body.find(marker) {
                let rest = &body[pos + marker.len()..];
                if rest.len() >= 2 && rest.as_bytes()[..2].iter().all(u8::is_ascii_alphabetic) {
                    return rest[..2].to_uppercase();
                }
            }
        }
        String::new()
    }
}

impl Default for NetflixDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detector for NetflixDetector {
    async fn detect(&self, client: &reqwest::Client) -> UnlockResult {
        let resp = match probe_get(client, &self.endpoint).await {
            Ok(resp) => resp,
            Err(e) => {
                return UnlockResult::probe_error(
                    self.platform(),
                    format!("failed to connect to Netflix: {e}"),
                );
            }
        };

        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                return UnlockResult::probe_error(
                    self.platform(),
                    format!("failed to read Netflix response: {e}"),
                );
            }
        };

        debug!(status = %status, body_len = body.len(), "netflix probe response");

        if body.contains("Not Available") || body.contains("page-404") || body.contains("NSEZ-403")
        {
            return UnlockResult::new(
                self.platform(),
                UnlockStatus::Locked,
                "",
                "Netflix content not available in this region",
            );
        }

        if body.contains("requestCountry") {
            let region = Self::extract_region(&body);
            return UnlockResult::new(
                self.platform(),
                UnlockStatus::Unlocked,
                region,
                "Netflix accessible",
            );
        }

        if status.is_success() && body.to_lowercase().contains("netflix") {
            return UnlockResult::new(
                self.platform(),
                UnlockStatus::Unlocked,
                "",
                "Netflix accessible",
            );
        }

        UnlockResult::new(
            self.platform(),
            UnlockStatus::Failed,
            "",
            "unable to determine Netflix status",
        )
    }

    fn platform(&self) -> &str {
        "Netflix"
    }

    fn priority(&self) -> u8 {
        crate::settings::priority_for(self.platform())
    }
}
