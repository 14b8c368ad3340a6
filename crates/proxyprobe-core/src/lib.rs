//! Proxy speed-test engine: catalog loading, per-proxy latency and
//! throughput measurement through proxy tunnels, and orchestration of
//! the unlock sweep from `proxyprobe-unlock`.
//!
//! The pipeline per proxy is linear with short-circuit gates:
//!
//! ```text
//! latency probe ──gate──▶ unlock sweep ──▶ download ──gate──▶ upload
//! ```
//!
//! Entry points: [`catalog::Loader`] to build a [`catalog::ProxyCatalog`],
//! then [`SpeedTester`] to run it. Results are delivered through a
//! callback, one [`ProxyResult`] per proxy; cancellation is checked at
//! proxy boundaries and surfaces as [`TestOutcome::Cancelled`].

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod latency;
pub mod result;
pub mod tester;
pub mod throughput;

pub use catalog::{FilterSpec, Loader, Protocol, ProxyCatalog, ProxyIdentity};
pub use client::{ClientFactory, FixedClientFactory, TunnelClientFactory};
pub use config::{TestConfig, TestMode};
pub use error::{CoreError, ErrorCode, TestError, TestStage};
pub use result::{ProxyResult, UnlockSummary, filter_results, format_speed};
pub use tester::{SpeedTester, TestOutcome};
