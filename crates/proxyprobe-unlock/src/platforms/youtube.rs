// YouTube Premium: the offer page carries the storefront country code.

use async_trait::async_trait;

use crate::detector::Detector;
use crate::http::probe_get;
use crate::types::{UnlockResult, UnlockStatus};

const PREMIUM_ENDPOINT: &str = "https://www.youtube.com/premium";

pub struct YouTubeDetector;

impl YouTubeDetector {
    pub fn new() -> Self {
        Self
    }

    fn extract_region(body: &str) -> String {
        // `"countryCode":"US"` appears in the page's embedded config.
        const MARKER: &str = "\"countryCode\":\"";
        if let Some(pos) = body.find(MARKER) {
            let rest = &body[pos + MARKER.len()..];
            if rest.len() >= 2 && rest.as_bytes()[..2].iter().all(u8::is_ascii_alphabetic) {
                return rest[..2].to_uppercase();
            }
        }
        String::new()
    }
}

impl Default for YouTubeDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detector for YouTubeDetector {
    async fn detect(&self, client: &reqwest::Client) -> UnlockResult {
        let resp = match probe_get(client, PREMIUM_ENDPOINT).await {
            Ok(resp) => resp,
            Err(e) => {
                return UnlockResult::probe_error(
                    self.platform(),
                    format!("failed to connect to YouTube: {e}"),
                );
            }
        };

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                return UnlockResult::probe_error(
                    self.platform(),
                    format!("failed to read YouTube response: {e}"),
                );
            }
        };

        if body.contains("Premium is not available in your country") {
            return UnlockResult::new(
                self.platform(),
                UnlockStatus::Locked,
                "",
                "YouTube Premium not offered in this region",
            );
        }

        if body.contains("countryCode") {
            return UnlockResult::new(
                self.platform(),
                UnlockStatus::Unlocked,
                Self::extract_region(&body),
                "YouTube Premium accessible",
            );
        }

        if body.contains("www.google.cn") {
            return UnlockResult::new(
                self.platform(),
                UnlockStatus::Locked,
                "CN",
                "redirected to google.cn",
            );
        }

        UnlockResult::new(
            self.platform(),
            UnlockStatus::Failed,
            "",
            "unable to determine YouTube status",
        )
    }

    fn platform(&self) -> &str {
        "YouTube"
    }

    fn priority(&self) -> u8 {
        crate::settings::priority_for(self.platform())
    }
}
