use thiserror::Error;

/// Errors surfaced by the unlock subsystem.
///
/// Probe failures never appear here — they are folded into an
/// [`UnlockResult`](crate::UnlockResult) with `error` status so a
/// multi-platform sweep can never be aborted by one platform.
#[derive(Debug, Error)]
pub enum UnlockError {
    /// A detector was registered under a platform name that is
    /// already taken. This is a startup configuration error.
    #[error("detector already registered for platform {platform:?}")]
    DuplicateDetector { platform: String },
}
