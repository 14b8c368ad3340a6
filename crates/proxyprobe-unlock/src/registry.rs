// Platform-name → detector registry.
//
// Populated explicitly at startup instead of via import side effects,
// so there are no hidden load-order dependencies. Read-only once
// construction finishes.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::detector::{DEFAULT_PRIORITY, Detector};
use crate::error::UnlockError;
use crate::platforms;

/// Registry of unlock detectors, keyed by platform name.
#[derive(Default)]
pub struct Registry {
    detectors: HashMap<String, Arc<dyn Detector>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every built-in platform detector.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        // Registration of the fixed built-in set cannot collide.
        for detector in platforms::builtin_detectors() {
            registry
                .register(detector)
                .unwrap_or_else(|e| unreachable!("builtin detector set is collision-free: {e}"));
        }
        registry
    }

    /// Register a detector under its platform name.
    ///
    /// Duplicate registration is a startup configuration error, not a
    /// runtime condition.
    pub fn register(&mut self, detector: Arc<dyn Detector>) -> Result<(), UnlockError> {
        let platform = detector.platform().to_owned();
        if self.detectors.contains_key(&platform) {
            return Err(UnlockError::DuplicateDetector { platform });
        }
        debug!(platform = %platform, priority = detector.priority(), "registered platform detector");
        self.detectors.insert(platform, detector);
        Ok(())
    }

    pub fn get(&self, platform: &str) -> Option<Arc<dyn Detector>> {
        self.detectors.get(platform).cloned()
    }

    /// Priority of a platform's detector, or the default for unknown
    /// platform names.
    pub fn priority_of(&self, platform: &str) -> u8 {
        self.detectors
            .get(platform)
            .map_or(DEFAULT_PRIORITY, |d| d.priority())
    }

    /// All registered platform names.
    pub fn platforms(&self) -> Vec<String> {
        self.detectors.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}
