//! Unlock detection for proxy tunnels: can a given proxy reach
//! geo-restricted streaming and AI services, and from which region?
//!
//! The crate is organized around three pieces:
//!
//! - **[`Detector`]** — one implementation per platform. Each detector
//!   issues a handful of HTTP requests through a caller-supplied
//!   tunnel client and classifies the platform as unlocked, locked,
//!   or undeterminable. Plain probe functions can be adapted via
//!   [`FnDetector`] so the dispatcher only ever sees one shape.
//!
//! - **[`Registry`]** — explicit platform-name → detector mapping,
//!   populated once at startup by [`Registry::with_builtin`].
//!   Registering the same platform twice is a configuration error.
//!
//! - **[`Dispatcher`]** — runs a priority-ordered, semaphore-bounded,
//!   cached sweep of requested platforms for one proxy, with optional
//!   retry-with-backoff for transport-level failures.
//!
//! Results are cached per `(proxy, platform)` in a process-wide
//! [`ResultCache`] with a 30-minute TTL and a background sweep task.

pub mod cache;
pub mod detector;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod platforms;
pub mod registry;
pub mod settings;
pub mod types;

pub use cache::{CacheStats, ResultCache};
pub use detector::{Detector, FnDetector};
pub use dispatcher::Dispatcher;
pub use error::UnlockError;
pub use registry::Registry;
pub use types::{UnlockConfig, UnlockResult, UnlockStatus, unlock_summary_text};
