// ChatGPT: the compliance endpoint tells apart blocked exits, the iOS
// endpoint supplies the serving region.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::detector::Detector;
use crate::http::probe_get;
use crate::types::{UnlockResult, UnlockStatus};

const DEFAULT_COMPLIANCE_ENDPOINT: &str =
    "https://api.openai.com/compliance/cookie_requirements";
const DEFAULT_TRACE_ENDPOINT: &str = "https://ios.chat.openai.com/";

#[derive(Deserialize)]
struct ComplianceBody {
    #[serde(default)]
    country: String,
}

pub struct OpenAiDetector {
    compliance_endpoint: String,
    trace_endpoint: String,
}

impl OpenAiDetector {
    pub fn new() -> Self {
        Self {
            compliance_endpoint: DEFAULT_COMPLIANCE_ENDPOINT.to_owned(),
            trace_endpoint: DEFAULT_TRACE_ENDPOINT.to_owned(),
        }
    }

    /// Probe alternative endpoints (mirrors, tests).
    pub fn with_endpoints(
        compliance_endpoint: impl Into<String>,
        trace_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            compliance_endpoint: compliance_endpoint.into(),
            trace_endpoint: trace_endpoint.into(),
        }
    }
}

impl Default for OpenAiDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detector for OpenAiDetector {
    async fn detect(&self, client: &reqwest::Client) -> UnlockResult {
        let resp = match probe_get(client, &self.compliance_endpoint).await {
            Ok(resp) => resp,
            Err(e) => {
                return UnlockResult::probe_error(
                    self.platform(),
                    format!("failed to reach ChatGPT compliance endpoint: {e}"),
                );
            }
        };

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        debug!(status = %status, body_len = body.len(), "chatgpt compliance response");

        let lower = body.to_lowercase();
        if lower.contains("unsupported_country") || lower.contains("vpn") {
            return UnlockResult::new(
                self.platform(),
                UnlockStatus::Locked,
                "",
                "ChatGPT not available from this exit",
            );
        }

        // Region comes from the iOS endpoint; a failure here still
        // counts as unlocked, just without a region.
        let region = match probe_get(client, &self.trace_endpoint).await {
            Ok(resp) => {
                let text = resp.text().await.unwrap_or_default();
                serde_json::from_str::<ComplianceBody>(&text)
                    .map(|b| b.country.to_uppercase())
                    .unwrap_or_default()
            }
            Err(_) => String::new(),
        };

        if status.is_success() || status.as_u16() == 403 {
            return UnlockResult::new(
                self.platform(),
                UnlockStatus::Unlocked,
                region,
                "ChatGPT accessible",
            );
        }

        UnlockResult::new(
            self.platform(),
            UnlockStatus::Failed,
            "",
            format!("unexpected ChatGPT response status {status}"),
        )
    }

    fn platform(&self) -> &str {
        "ChatGPT"
    }

    fn priority(&self) -> u8 {
        crate::settings::priority_for(self.platform())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn locked_when_country_unsupported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"error":"unsupported_country"}"#),
            )
            .mount(&server)
            .await;

        let detector = OpenAiDetector::with_endpoints(server.uri(), server.uri());
        let result = detector.detect(&reqwest::Client::new()).await;
        assert_eq!(result.status, UnlockStatus::Locked);
    }

    #[tokio::test]
    async fn unlocked_with_region_from_trace() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/compliance"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/trace"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"country":"de"}"#))
            .mount(&server)
            .await;

        let detector = OpenAiDetector::with_endpoints(
            format!("{}/compliance", server.uri()),
            format!("{}/trace", server.uri()),
        );
        let result = detector.detect(&reqwest::Client::new()).await;
        assert_eq!(result.status, UnlockStatus::Unlocked);
        assert_eq!(result.region, "DE");
    }
}
