//! Persistent storage for chain sync.
//!
//! This crate provides the store a chain indexer syncs into, exposing high-level APIs to
//! persist fetched chain data, track which block ranges are fully synced, and replay the synced
//! logs as one ordered event stream.
//!
//! The storage system is built on top of [`reth-db`], using MDBX,
//! and defines schemas for sync-specific data like:
//! - Blocks, transactions and logs of every watched chain
//! - A cross-chain block timeline ordered by timestamp
//! - Log filter and factory fragments with their synced intervals
//! - Cached RPC request results
//!
//! ## Capabilities
//!
//! - Insert raw chain records idempotently
//! - Merge synced intervals per fragment and intersect them per criterion
//! - Resolve factory child addresses from creation logs
//! - Page through matched events in `(timestamp, chain, block, log index)` order
//! - Rewind records and intervals after a reorg
//!
//! [`reth-db`]: reth_db

pub mod models;

mod error;
pub use error::StorageError;

mod config;
pub use config::{DEFAULT_CHILD_ADDRESS_PAGE_SIZE, DEFAULT_EVENTS_PAGE_SIZE, SyncStoreConfig};

mod metrics;
pub(crate) use metrics::Metrics;
pub use metrics::MetricsReporter;

mod providers;

mod syncdb;
pub use syncdb::SyncDb;

mod stream;
pub use stream::{ChildAddressBatches, LogEventPages};

pub mod traits;
pub use traits::{
    EventStorageReader, IntervalStorageReader, IntervalStorageWriter, RecordStorageReader,
    RecordStorageWriter, StorageRewinder, SyncStorage,
};
