//! Database table schemas of the sync store.
//!
//! This module defines the keys, value types and table layouts for everything the sync store
//! persists: raw chain data (blocks, transactions, logs), the remote request cache, and the
//! fragment definitions with their synced block intervals.
//!
//! The tables are registered using [`reth_db_api::table::TableInfo`] and grouped into a
//! [`reth_db_api::TableSet`] for database initialization via Reth's storage-api.

use reth_db_api::{
    TableSet, TableType, TableViewer,
    table::{DupSort, TableInfo},
    tables,
};
use std::fmt;

mod block;
pub use block::{BlockEntry, BlockRef};

mod common;
pub use common::{IntervalEnd, RequestResultEntry};

mod fragment;
pub use fragment::{FactoryFragmentEntry, FragmentRecord, LogFilterFragmentEntry};

mod keys;
pub use keys::{
    AddressLogKey, BlockKey, FragmentKey, IntervalKey, LogKey, RequestKey, TimelineKey,
    TransactionKey,
};

mod log;
pub use log::{LogEntry, SelectorEntry};

mod transaction;
pub use transaction::TransactionEntry;

/// Implements [`reth_db_api::table::Compress`] and [`reth_db_api::table::Decompress`] traits for
/// types that implement [`reth_codecs::Compact`].
///
/// # Example
/// ```ignore
/// impl_compression_for_compact!(BlockRef, LogEntry);
/// ```
macro_rules! impl_compression_for_compact {
    ($($name:ident),+) => {
        $(
            impl reth_db_api::table::Compress for $name {
                type Compressed = Vec<u8>;

                fn compress_to_buf<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) {
                    let _ = reth_codecs::Compact::to_compact(self, buf);
                }
            }

            impl reth_db_api::table::Decompress for $name {
                fn decompress(value: &[u8]) -> Result<$name, reth_db_api::DatabaseError> {
                    let (obj, _) = reth_codecs::Compact::from_compact(value, value.len());
                    Ok(obj)
                }
            }
        )+
    };
}

impl_compression_for_compact!(
    BlockRef,
    BlockEntry,
    TransactionEntry,
    LogEntry,
    SelectorEntry,
    LogFilterFragmentEntry,
    FactoryFragmentEntry,
    IntervalEnd,
    RequestResultEntry
);

tables! {
    /// Full block headers.
    /// - Key: [`BlockKey`] — `(chain, number, hash)`
    /// - Value: [`BlockEntry`]
    table Blocks {
        type Key = BlockKey;
        type Value = BlockEntry;
    }

    /// Cross-chain block order used by the event stream.
    /// - Key: [`TimelineKey`] — `(timestamp, chain, number, hash)`
    /// - Value: [`BlockRef`]
    table BlockTimeline {
        type Key = TimelineKey;
        type Value = BlockRef;
    }

    /// Transactions keyed by their including block.
    /// - Key: [`TransactionKey`] — `(chain, block number, hash)`
    /// - Value: [`TransactionEntry`]
    table Transactions {
        type Key = TransactionKey;
        type Value = TransactionEntry;
    }

    /// Logs in block order.
    /// - Key: [`LogKey`] — `(chain, block number, block hash, log index)`
    /// - Value: [`LogEntry`]
    table Logs {
        type Key = LogKey;
        type Value = LogEntry;
    }

    /// Index of logs by emitting address.
    /// - Key: [`AddressLogKey`] — `(chain, address, block number, log index, block hash)`
    /// - Value: [`SelectorEntry`] — topic 0 of the log
    table AddressLogs {
        type Key = AddressLogKey;
        type Value = SelectorEntry;
    }

    /// Cache of remote request results.
    /// - Key: [`RequestKey`] — `(chain, block number, keccak256(request))`
    /// - Value: [`RequestResultEntry`]
    table RequestResults {
        type Key = RequestKey;
        type Value = RequestResultEntry;
    }

    /// Log filter fragments that have at least one synced interval.
    table LogFilterFragments {
        type Key = FragmentKey;
        type Value = LogFilterFragmentEntry;
    }

    /// Synced intervals of log filter fragments.
    /// - Key: [`IntervalKey`] — `(chain, fragment id, start block)`
    /// - Value: [`IntervalEnd`] — inclusive end block
    table LogFilterIntervals {
        type Key = IntervalKey;
        type Value = IntervalEnd;
    }

    /// Factory fragments that have at least one synced interval.
    table FactoryFragments {
        type Key = FragmentKey;
        type Value = FactoryFragmentEntry;
    }

    /// Synced intervals of factory fragments.
    table FactoryIntervals {
        type Key = IntervalKey;
        type Value = IntervalEnd;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, Bytes};
    use chainsync_types::Log;
    use reth_db_api::table::{Compress, Decompress};

    #[test]
    fn test_block_ref_compression_decompression() {
        let original = BlockRef {
            number: 1,
            hash: B256::random(),
            parent_hash: B256::random(),
            timestamp: 1234567890,
        };

        let mut compressed_buf = Vec::new();
        original.compress_to_buf(&mut compressed_buf);
        assert!(!compressed_buf.is_empty());

        let decompressed = BlockRef::decompress(&compressed_buf).unwrap();
        assert_eq!(original, decompressed);
    }

    #[test]
    fn test_log_entry_compression_decompression() {
        let original = LogEntry(Log {
            address: alloy_primitives::Address::random(),
            topics: [Some(B256::random()), None, None, None],
            data: Bytes::from_static(b"payload"),
            block_hash: B256::random(),
            block_number: 3,
            log_index: 0,
            transaction_hash: None,
            transaction_index: None,
        });

        let mut compressed_buf = Vec::new();
        original.compress_to_buf(&mut compressed_buf);
        let decompressed = LogEntry::decompress(&compressed_buf).unwrap();
        assert_eq!(original, decompressed);
    }

    #[test]
    fn test_empty_request_result_compression_decompression() {
        let original = RequestResultEntry::default();
        let mut compressed_buf = Vec::new();
        original.compress_to_buf(&mut compressed_buf);
        assert_eq!(compressed_buf, vec![0u8; 4]);
        assert_eq!(RequestResultEntry::decompress(&compressed_buf).unwrap(), original);
    }
}
