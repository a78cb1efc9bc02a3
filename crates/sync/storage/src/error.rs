use alloy_primitives::{B256, ChainId};
use chainsync_types::IntervalError;
use reth_db::DatabaseError;
use thiserror::Error;

/// Errors that may occur while interacting with the sync store.
///
/// This enum is used across all implementations of the storage traits.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Represents a database error that occurred while interacting with storage.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Represents an error that occurred while initializing the database.
    #[error(transparent)]
    DatabaseInit(#[from] eyre::Report),

    /// An interval with its start after its end was supplied.
    #[error("invalid interval: start {start} is greater than end {end}")]
    InvalidInterval {
        /// Requested start block.
        start: u64,
        /// Requested end block.
        end: u64,
    },

    /// A factory child-creation log does not carry an address at the configured location.
    #[error(
        "cannot extract child address from log {log_index} of block {block_hash} on chain {chain_id}: {reason}"
    )]
    ChildAddressExtraction {
        /// Chain of the log.
        chain_id: ChainId,
        /// Block hash of the log.
        block_hash: B256,
        /// Index of the log within its block.
        log_index: u32,
        /// What is missing.
        reason: String,
    },

    /// A page size of zero was requested.
    #[error("page size must be greater than zero")]
    InvalidPageSize,
}

impl From<IntervalError> for StorageError {
    fn from(err: IntervalError) -> Self {
        Self::InvalidInterval { start: err.start, end: err.end }
    }
}

impl PartialEq for StorageError {
    fn eq(&self, other: &Self) -> bool {
        use StorageError::*;
        match (self, other) {
            (Database(a), Database(b)) => a == b,
            (DatabaseInit(a), DatabaseInit(b)) => format!("{a}") == format!("{b}"),
            (InvalidPageSize, InvalidPageSize) => true,
            (
                InvalidInterval { start: a_start, end: a_end },
                InvalidInterval { start: b_start, end: b_end },
            ) => a_start == b_start && a_end == b_end,
            (
                ChildAddressExtraction { chain_id: a_chain, block_hash: a_hash, log_index: a, .. },
                ChildAddressExtraction { chain_id: b_chain, block_hash: b_hash, log_index: b, .. },
            ) => (a_chain, a_hash, a) == (b_chain, b_hash, b),
            _ => false,
        }
    }
}

impl Eq for StorageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_error_conversion() {
        let err: StorageError = IntervalError { start: 5, end: 1 }.into();
        assert_eq!(err, StorageError::InvalidInterval { start: 5, end: 1 });
        assert_eq!(err.to_string(), "invalid interval: start 5 is greater than end 1");
    }

    #[test]
    fn test_extraction_error_ignores_reason_in_eq() {
        let a = StorageError::ChildAddressExtraction {
            chain_id: 1,
            block_hash: B256::ZERO,
            log_index: 3,
            reason: "data too short".to_string(),
        };
        let b = StorageError::ChildAddressExtraction {
            chain_id: 1,
            block_hash: B256::ZERO,
            log_index: 3,
            reason: "other".to_string(),
        };
        assert_eq!(a, b);
        assert_ne!(a, StorageError::InvalidPageSize);
    }
}
