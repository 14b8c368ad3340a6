//! Built-in platform detectors.
//!
//! Each submodule encapsulates one platform's probe heuristic behind
//! the [`Detector`](crate::Detector) interface. Platforms whose probe
//! is a single plain request are expressed as probe functions and
//! adapted via [`FnDetector`](crate::FnDetector).

mod bilibili;
mod disney;
mod netflix;
mod openai;
mod spotify;
mod youtube;

use std::sync::Arc;

use crate::detector::{Detector, FnDetector};
use crate::settings;

pub use netflix::NetflixDetector;
pub use openai::OpenAiDetector;

/// Construct one instance of every built-in detector. Priorities come
/// from the [`settings::PLATFORMS`] metadata table.
///
/// Called by [`Registry::with_builtin`](crate::Registry::with_builtin)
/// at startup; there is no import-side-effect registration anywhere.
pub fn builtin_detectors() -> Vec<Arc<dyn Detector>> {
    vec![
        Arc::new(netflix::NetflixDetector::new()),
        Arc::new(openai::OpenAiDetector::new()),
        Arc::new(youtube::YouTubeDetector::new()),
        Arc::new(disney::DisneyPlusDetector::new()),
        Arc::new(FnDetector::new(
            "Spotify",
            settings::priority_for("Spotify"),
            |client| Box::pin(spotify::probe(client)),
        )),
        Arc::new(FnDetector::new(
            "Bilibili",
            settings::priority_for("Bilibili"),
            |client| Box::pin(bilibili::probe(client)),
        )),
    ]
}
