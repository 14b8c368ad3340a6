// Disney+: the home page redirects unserved regions to an unavailable
// notice and embeds the storefront region otherwise.

use async_trait::async_trait;

use crate::detector::Detector;
use crate::http::probe_get;
use crate::types::{UnlockResult, UnlockStatus};

const HOME_ENDPOINT: &str = "https://www.disneyplus.com/";

pub struct DisneyPlusDetector;

impl DisneyPlusDetector {
    pub fn new() -> Self {
        Self
    }

    fn extract_region(body: &str) -> String {
        const MARKER: &str = "\"region\":\"";
        if let Some(pos) = body.find(MARKER) {
            let rest = &body[pos + MARKER.len()..];
            if rest.len() >= 2 && rest.as_bytes()[..2].iter().all(u8::is_ascii_alphabetic) {
                return rest[..2].to_uppercase();
            }
        }
        String::new()
    }
}

impl Default for DisneyPlusDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detector for DisneyPlusDetector {
    async fn detect(&self, client: &reqwest::Client) -> UnlockResult {
        let resp = match probe_get(client, HOME_ENDPOINT).await {
            Ok(resp) => resp,
            Err(e) => {
                return UnlockResult::probe_error(
                    self.platform(),
                    format!("failed to connect to Disney+: {e}"),
                );
            }
        };

        let final_url = resp.url().to_string();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                return UnlockResult::probe_error(
                    self.platform(),
                    format!("failed to read Disney+ response: {e}"),
                );
            }
        };

        if final_url.contains("unavailable") || body.contains("not available in your region") {
            return UnlockResult::new(
                self.platform(),
                UnlockStatus::Locked,
                "",
                "Disney+ not available in this region",
            );
        }

        if body.contains("region") || body.to_lowercase().contains("disney") {
            return UnlockResult::new(
                self.platform(),
                UnlockStatus::Unlocked,
                Self::extract_region(&body),
                "Disney+ accessible",
            );
        }

        UnlockResult::new(
            self.platform(),
            UnlockStatus::Failed,
            "",
            "unable to determine Disney+ status",
        )
    }

    fn platform(&self) -> &str {
        "Disney+"
    }

    fn priority(&self) -> u8 {
        crate::settings::priority_for(self.platform())
    }
}
