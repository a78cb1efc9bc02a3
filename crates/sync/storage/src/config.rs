//! Store configuration.

use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of events returned per page of [`crate::LogEventPages`].
pub const DEFAULT_EVENTS_PAGE_SIZE: usize = chainsync_types::event::DEFAULT_EVENTS_PAGE_SIZE;

/// Default number of logs scanned per batch of [`crate::ChildAddressBatches`].
pub const DEFAULT_CHILD_ADDRESS_PAGE_SIZE: usize = 500;

/// Configuration of a [`crate::SyncDb`].
#[derive(Debug, Clone, PartialEq, Eq, Constructor, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStoreConfig {
    /// Directory holding the MDBX environment.
    pub datadir: PathBuf,

    /// Whether per-call metrics are recorded.
    #[serde(default)]
    pub metrics_enabled: bool,

    /// Page size used by [`chainsync_types::LogEventsQuery`] built through the store.
    #[serde(default = "default_events_page_size")]
    pub events_page_size: usize,

    /// Batch size used for factory child-address resolution.
    #[serde(default = "default_child_address_page_size")]
    pub child_address_page_size: usize,
}

impl SyncStoreConfig {
    /// Creates a configuration for `datadir` with default page sizes and metrics disabled.
    pub const fn with_datadir(datadir: PathBuf) -> Self {
        Self {
            datadir,
            metrics_enabled: false,
            events_page_size: DEFAULT_EVENTS_PAGE_SIZE,
            child_address_page_size: DEFAULT_CHILD_ADDRESS_PAGE_SIZE,
        }
    }
}

const fn default_events_page_size() -> usize {
    DEFAULT_EVENTS_PAGE_SIZE
}

const fn default_child_address_page_size() -> usize {
    DEFAULT_CHILD_ADDRESS_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_defaults() {
        let config: SyncStoreConfig =
            serde_json::from_str(r#"{ "datadir": "/tmp/sync" }"#).unwrap();
        assert_eq!(config, SyncStoreConfig::with_datadir(PathBuf::from("/tmp/sync")));
        assert_eq!(config.events_page_size, 10_000);
        assert_eq!(config.child_address_page_size, 500);
        assert!(!config.metrics_enabled);
    }

    #[test]
    fn test_constructor() {
        let config = SyncStoreConfig::new(PathBuf::from("db"), true, 10, 20);
        assert!(config.metrics_enabled);
        assert_eq!(config.events_page_size, 10);
        assert_eq!(config.child_address_page_size, 20);
    }
}
