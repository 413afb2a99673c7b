//! Containment configuration

use crate::copy::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};

/// Label used when `SPIRITBOX_LABEL` is not set
pub const DEFAULT_LABEL: &str = "spiritbox_capture";

/// Configuration shared by ingest, export and sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainmentConfig {
    /// Diagnostic name given to each memfd (visible in `/proc/<pid>/fd`)
    pub label: String,

    /// Bytes moved per read/write iteration
    pub chunk_size: usize,

    /// fsync exported files before their permissions are locked down
    pub sync_on_export: bool,
}

impl Default for ContainmentConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            sync_on_export: false,
        }
    }
}

impl ContainmentConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> ContainmentConfigBuilder {
        ContainmentConfigBuilder::default()
    }
}

/// Builder for `ContainmentConfig`
#[derive(Debug, Default)]
pub struct ContainmentConfigBuilder {
    config: ContainmentConfig,
}

impl ContainmentConfigBuilder {
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = label.into();
        self
    }

    #[must_use]
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.config.chunk_size = bytes.max(1);
        self
    }

    #[must_use]
    pub fn chunk_size_kb(self, kb: usize) -> Self {
        self.chunk_size(kb.saturating_mul(1024))
    }

    #[must_use]
    pub fn sync_on_export(mut self, sync: bool) -> Self {
        self.config.sync_on_export = sync;
        self
    }

    #[must_use]
    pub fn build(self) -> ContainmentConfig {
        self.config
    }
}

/// Get default memfd label from SPIRITBOX_LABEL env var or the built-in name
///
/// Returns:
/// - `$SPIRITBOX_LABEL` if set and non-empty
/// - `spiritbox_capture` otherwise
pub fn default_label() -> String {
    std::env::var("SPIRITBOX_LABEL")
        .ok()
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| DEFAULT_LABEL.to_string())
}
