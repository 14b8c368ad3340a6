// Bilibili: mainland-licensed content is the probe target, so the
// check inverts the usual direction and looks for a CN-serving exit.

use serde::Deserialize;

use crate::http::probe_get;
use crate::types::{UnlockResult, UnlockStatus};

// A mainland-only licensed bangumi episode.
const PLAY_ENDPOINT: &str =
    "https://api.bilibili.com/pgc/player/web/playurl?avid=82846771&qn=0&type=&otype=json&ep_id=307247&fourk=1&fnver=0&fnval=16";

const PLATFORM: &str = "Bilibili";

#[derive(Deserialize)]
struct PlayUrlBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

pub(super) async fn probe(client: &reqwest::Client) -> UnlockResult {
    let resp = match probe_get(client, PLAY_ENDPOINT).await {
        Ok(resp) => resp,
        Err(e) => {
            return UnlockResult::probe_error(
                PLATFORM,
                format!("failed to connect to Bilibili: {e}"),
            );
        }
    };

    let text = match resp.text().await {
        Ok(text) => text,
        Err(e) => {
            return UnlockResult::probe_error(
                PLATFORM,
                format!("failed to read Bilibili response: {e}"),
            );
        }
    };

    let Ok(body) = serde_json::from_str::<PlayUrlBody>(&text) else {
        return UnlockResult::new(
            PLATFORM,
            UnlockStatus::Failed,
            "",
            "unrecognized Bilibili response",
        );
    };

    match body.code {
        0 => UnlockResult::new(
            PLATFORM,
            UnlockStatus::Unlocked,
            "CN",
            "Bilibili mainland content accessible",
        ),
        // -10403: geographic restriction.
        -10403 => UnlockResult::new(
            PLATFORM,
            UnlockStatus::Locked,
            "",
            "Bilibili mainland content restricted",
        ),
        code => UnlockResult::new(
            PLATFORM,
            UnlockStatus::Failed,
            "",
            format!("Bilibili responded with code {code}: {}", body.message),
        ),
    }
}
