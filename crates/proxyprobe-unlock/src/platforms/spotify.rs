// Spotify: the signup country endpoint answers with the storefront
// country and whether registration is allowed from the exit.

use serde::Deserialize;

use crate::http::probe_get;
use crate::types::{UnlockResult, UnlockStatus};

const SIGNUP_ENDPOINT: &str =
    "https://spclient.wg.spotify.com/signup/public/v1/account?validate=1&intl-locale=en";

const PLATFORM: &str = "Spotify";

#[derive(Deserialize)]
struct SignupBody {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    country: String,
    #[serde(default)]
    is_country_launched: bool,
}

pub(super) async fn probe(client: &reqwest::Client) -> UnlockResult {
    let resp = match probe_get(client, SIGNUP_ENDPOINT).await {
        Ok(resp) => resp,
        Err(e) => {
            return UnlockResult::probe_error(
                PLATFORM,
                format!("failed to connect to Spotify: {e}"),
            );
        }
    };

    let text = match resp.text().await {
        Ok(text) => text,
        Err(e) => {
            return UnlockResult::probe_error(
                PLATFORM,
                format!("failed to read Spotify response: {e}"),
            );
        }
    };

    let Ok(body) = serde_json::from_str::<SignupBody>(&text) else {
        return UnlockResult::new(
            PLATFORM,
            UnlockStatus::Failed,
            "",
            "unrecognized Spotify response",
        );
    };

    if body.status == 320 || !body.is_country_launched {
        return UnlockResult::new(
            PLATFORM,
            UnlockStatus::Locked,
            body.country.to_uppercase(),
            "Spotify not launched in this region",
        );
    }

    UnlockResult::new(
        PLATFORM,
        UnlockStatus::Unlocked,
        body.country.to_uppercase(),
        "Spotify accessible",
    )
}
