// Error taxonomy: fatal load errors, plus the advisory diagnostic
// classification attached to per-proxy test failures.

use serde::Serialize;
use thiserror::Error;

/// Errors that abort a whole catalog load. Per-source fetch failures
/// are not here — those are logged and skipped.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to parse proxy configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("duplicate proxy name {name:?} in source {source_name:?}")]
    DuplicateProxy { name: String, source_name: String },

    #[error("provider name {name:?} is reserved")]
    ReservedProviderName { name: String },

    #[error("invalid filter regex: {0}")]
    FilterRegex(#[from] regex::Error),

    #[error("proxy {name:?} has no dialable tunnel endpoint")]
    Undialable { name: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Phase of the per-proxy pipeline a failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStage {
    Latency,
    Download,
    Upload,
    Unlock,
}

impl TestStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Latency => "latency",
            Self::Download => "download",
            Self::Upload => "upload",
            Self::Unlock => "unlock",
        }
    }
}

/// Coarse classification of a tunnel transport failure.
///
/// Derived by substring-matching the error text; advisory only, never
/// consulted for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    DnsResolution,
    ConnectionRefused,
    ConnectionTimeout,
    HandshakeTimeout,
    ProtocolError,
    AuthFailed,
    TransferTimeout,
    Unknown,
}

/// Structured diagnostic recorded on a proxy's result when a phase
/// produced no usable measurement.
#[derive(Debug, Clone, Serialize)]
pub struct TestError {
    pub stage: TestStage,
    pub code: ErrorCode,
    pub message: String,
}

impl TestError {
    /// Classify a raw transport error message for one pipeline stage.
    pub fn classify(stage: TestStage, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        let code = if lower.contains("no such host")
            || lower.contains("dns")
            || lower.contains("name resolution")
        {
            ErrorCode::DnsResolution
        } else if lower.contains("connection refused") {
            ErrorCode::ConnectionRefused
        } else if lower.contains("handshake") {
            ErrorCode::HandshakeTimeout
        } else if lower.contains("connect") && lower.contains("timeout") {
            ErrorCode::ConnectionTimeout
        } else if lower.contains("auth") || lower.contains("401") || lower.contains("407") {
            ErrorCode::AuthFailed
        } else if lower.contains("timeout") || lower.contains("timed out") {
            ErrorCode::TransferTimeout
        } else if lower.contains("protocol") || lower.contains("malformed") {
            ErrorCode::ProtocolError
        } else {
            ErrorCode::Unknown
        };

        Self {
            stage,
            code,
            message,
        }
    }
}
