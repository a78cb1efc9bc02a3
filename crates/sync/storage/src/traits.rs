use crate::{StorageError, models::FragmentRecord};
use alloy_eips::eip1898::BlockNumHash;
use alloy_primitives::{Address, B256, ChainId};
use chainsync_types::{
    Block, EventsPage, FactoryCriteria, Interval, Log, LogEventsQuery, LogFilterCriteria,
    Transaction,
};
use std::fmt::Debug;

/// Provides an interface for writing raw chain records to the sync store.
///
/// Blocks, transactions and logs are inserted if absent and never modified afterwards, so
/// re-ingesting the same data is a no-op.
///
/// Implementations are expected to provide persistent and thread-safe access to the records.
pub trait RecordStorageWriter: Send + Sync + Debug {
    /// Inserts factory child-creation logs without their blocks.
    ///
    /// The logs are later read by the child-address resolver.
    ///
    /// # Arguments
    /// * `chain_id` - The chain the logs belong to.
    /// * `logs` - The creation logs to insert.
    ///
    /// # Returns
    /// * `Ok(())` if every log was inserted or already present.
    /// * `Err(StorageError)` if there is an issue writing the logs.
    fn insert_factory_child_address_logs(
        &self,
        chain_id: ChainId,
        logs: &[Log],
    ) -> Result<(), StorageError>;

    /// Inserts a block observed in realtime together with its transactions and logs.
    ///
    /// # Arguments
    /// * `chain_id` - The chain the block belongs to.
    /// * `block` - The block header.
    /// * `transactions` - Transactions of interest in the block.
    /// * `logs` - Logs of interest in the block.
    ///
    /// # Returns
    /// * `Ok(())` if the records were written in one transaction.
    /// * `Err(StorageError)` if there is an issue writing any of the records.
    fn insert_realtime_block(
        &self,
        chain_id: ChainId,
        block: &Block,
        transactions: &[Transaction],
        logs: &[Log],
    ) -> Result<(), StorageError>;

    /// Caches the result of an RPC request made at `block_number`.
    ///
    /// An existing result for the same request and block is overwritten.
    fn insert_rpc_request_result(
        &self,
        chain_id: ChainId,
        request: &str,
        block_number: u64,
        result: &str,
    ) -> Result<(), StorageError>;
}

/// Provides an interface for reading raw chain records from the sync store.
pub trait RecordStorageReader: Debug {
    /// Gets the [`Block`] identified by `block_id`.
    ///
    /// # Returns
    /// * `Ok(Some(Block))` if the block is stored.
    /// * `Ok(None)` if it is not.
    /// * `Err(StorageError)` if there is an issue retrieving the block.
    fn get_block(
        &self,
        chain_id: ChainId,
        block_id: BlockNumHash,
    ) -> Result<Option<Block>, StorageError>;

    /// Gets a stored [`Transaction`] by block number and hash.
    fn get_transaction(
        &self,
        chain_id: ChainId,
        block_number: u64,
        hash: B256,
    ) -> Result<Option<Transaction>, StorageError>;

    /// Gets every stored [`Log`] of a block, in log index order.
    fn get_logs(&self, chain_id: ChainId, block_id: BlockNumHash)
    -> Result<Vec<Log>, StorageError>;

    /// Gets a cached RPC request result.
    ///
    /// # Arguments
    /// * `chain_id` - The chain the request was made against.
    /// * `request` - The request description used when caching.
    /// * `block_number` - The block the request was made at.
    ///
    /// # Returns
    /// * `Ok(Some(String))` with the cached result.
    /// * `Ok(None)` if nothing is cached.
    /// * `Err(StorageError)` if there is an issue reading the cache.
    fn get_rpc_request_result(
        &self,
        chain_id: ChainId,
        request: &str,
        block_number: u64,
    ) -> Result<Option<String>, StorageError>;
}

/// Provides an interface for recording synced block ranges.
///
/// Every write merges the new range into the fragment's stored set, so the stored intervals are
/// always disjoint and non-adjacent.
pub trait IntervalStorageWriter: Send + Sync + Debug {
    /// Writes a block with its records and extends the coverage of `criteria` by `interval`.
    ///
    /// # Arguments
    /// * `chain_id` - The chain the data belongs to.
    /// * `criteria` - The log filter the records were fetched for.
    /// * `block` - The last block of the interval.
    /// * `transactions` - Transactions referenced by `logs`.
    /// * `logs` - Logs matching `criteria` inside `interval`.
    /// * `interval` - The block range now fully synced for `criteria`.
    ///
    /// # Returns
    /// * `Ok(())` if records and intervals were written in one transaction.
    /// * `Err(StorageError)` if any step fails, in which case nothing is written.
    fn insert_log_filter_interval(
        &self,
        chain_id: ChainId,
        criteria: &LogFilterCriteria,
        block: &Block,
        transactions: &[Transaction],
        logs: &[Log],
        interval: Interval,
    ) -> Result<(), StorageError>;

    /// Writes a block with its records and extends the coverage of `factory` by `interval`.
    ///
    /// Same semantics as [`IntervalStorageWriter::insert_log_filter_interval`] for factory
    /// criteria.
    fn insert_factory_log_filter_interval(
        &self,
        chain_id: ChainId,
        factory: &FactoryCriteria,
        block: &Block,
        transactions: &[Transaction],
        logs: &[Log],
        interval: Interval,
    ) -> Result<(), StorageError>;

    /// Records `interval` as synced for every fragment in `fragments`.
    ///
    /// Each fragment is merged independently.
    fn record_interval<R: FragmentRecord>(
        &self,
        fragments: &[R],
        interval: Interval,
    ) -> Result<(), StorageError>;

    /// Records `interval` as synced for realtime sources of one chain.
    ///
    /// The creation logs of every factory are folded into the log filter fragments, so the
    /// child-address resolver can rely on the same coverage.
    fn insert_realtime_interval(
        &self,
        chain_id: ChainId,
        log_filters: &[LogFilterCriteria],
        factories: &[FactoryCriteria],
        interval: Interval,
    ) -> Result<(), StorageError>;
}

/// Provides an interface for reading synced block ranges.
pub trait IntervalStorageReader: Debug {
    /// Gets the block ranges fully synced for `criteria`.
    ///
    /// A range is reported only if it is synced for every fragment of the criteria.
    ///
    /// # Returns
    /// * `Ok(Vec<Interval>)` sorted, disjoint ranges.
    /// * `Err(StorageError)` if there is an issue reading or merging intervals.
    fn get_log_filter_intervals(
        &self,
        chain_id: ChainId,
        criteria: &LogFilterCriteria,
    ) -> Result<Vec<Interval>, StorageError>;

    /// Gets the block ranges fully synced for `factory`.
    fn get_factory_log_filter_intervals(
        &self,
        chain_id: ChainId,
        factory: &FactoryCriteria,
    ) -> Result<Vec<Interval>, StorageError>;

    /// Gets the block ranges synced for every fragment in `fragments`.
    ///
    /// The stored intervals of each fragment are re-merged first. An empty fragment list yields
    /// no coverage.
    fn query_coverage<R: FragmentRecord>(
        &self,
        fragments: &[R],
    ) -> Result<Vec<Interval>, StorageError>;
}

/// Provides an interface for streaming stored events.
pub trait EventStorageReader: Debug {
    /// Pages of a log event query.
    type LogEventPages<'a>: Iterator<Item = Result<EventsPage, StorageError>>
    where
        Self: 'a;

    /// Batches of resolved factory child addresses.
    type ChildAddressBatches<'a>: Iterator<Item = Result<Vec<Address>, StorageError>>
    where
        Self: 'a;

    /// Streams the events matched by `query` in `(timestamp, chain, block, log index)` order.
    ///
    /// Pages are read lazily, one read transaction each. A page shorter than the query's page
    /// size ends the stream.
    ///
    /// # Returns
    /// * `Ok(LogEventPages)` a page iterator.
    /// * `Err(StorageError::InvalidPageSize)` if the page size is zero.
    fn get_log_events(
        &self,
        query: LogEventsQuery,
    ) -> Result<Self::LogEventPages<'_>, StorageError>;

    /// Streams the child addresses created by `factory` up to `up_to_block`.
    ///
    /// Batches may repeat addresses across a page boundary; callers de-duplicate.
    ///
    /// # Returns
    /// * `Ok(ChildAddressBatches)` a batch iterator.
    /// * `Err(StorageError::InvalidPageSize)` if `page_size` is zero.
    fn get_factory_child_addresses(
        &self,
        chain_id: ChainId,
        factory: &FactoryCriteria,
        up_to_block: u64,
        page_size: usize,
    ) -> Result<Self::ChildAddressBatches<'_>, StorageError>;
}

/// Provides an interface for repairing the store after a chain reorganization.
pub trait StorageRewinder {
    /// Deletes every record above `from_block` and clamps synced intervals to end at it.
    ///
    /// Blocks, transactions, logs and cached request results with a block number greater than
    /// `from_block` are removed. Intervals starting after `from_block` are removed and intervals
    /// ending after it are shortened. Calling it again with the same block is a no-op.
    ///
    /// # Arguments
    /// * `chain_id` - The chain that reorganized.
    /// * `from_block` - The last block that is still canonical.
    ///
    /// # Returns
    /// * `Ok(())` if the rewind was committed.
    /// * `Err(StorageError)` if there is an issue, in which case nothing is changed.
    fn delete_realtime_data(&self, chain_id: ChainId, from_block: u64)
    -> Result<(), StorageError>;
}

/// Combines every sync store capability.
pub trait SyncStorage:
    RecordStorageReader
    + RecordStorageWriter
    + IntervalStorageReader
    + IntervalStorageWriter
    + EventStorageReader
    + StorageRewinder
{
}

impl<T> SyncStorage for T where
    T: RecordStorageReader
        + RecordStorageWriter
        + IntervalStorageReader
        + IntervalStorageWriter
        + EventStorageReader
        + StorageRewinder
{
}
