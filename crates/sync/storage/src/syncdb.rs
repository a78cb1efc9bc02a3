//! Main database access structure and transaction contexts.

use crate::{
    ChildAddressBatches, LogEventPages, Metrics, MetricsReporter, SyncStoreConfig,
    error::StorageError,
    metrics::observe_metrics_for_result,
    models::{FragmentRecord, Tables},
    providers::{IntervalProvider, RecordProvider, RewindProvider},
    traits::{
        EventStorageReader, IntervalStorageReader, IntervalStorageWriter, RecordStorageReader,
        RecordStorageWriter, StorageRewinder,
    },
};
use alloy_eips::eip1898::BlockNumHash;
use alloy_primitives::{B256, ChainId};
use chainsync_types::{
    Block, FactoryCriteria, FactoryFragment, Interval, Log, LogEventsQuery, LogFilterCriteria,
    LogFilterFragment, Transaction, build_factory_fragments, build_log_filter_fragments,
    interval,
};
use metrics::{Label, gauge};
use reth_db::{
    DatabaseEnv,
    mdbx::{DatabaseArguments, init_db_for},
};
use reth_db_api::{database::Database, transaction::DbTx};
use std::path::Path;
use tracing::{debug, error, warn};

/// Read transaction of the sync store environment.
pub(crate) type SyncTx = <DatabaseEnv as Database>::TX;

/// Write transaction of the sync store environment.
pub(crate) type SyncTxMut = <DatabaseEnv as Database>::TXMut;

/// Manages the database environment shared by every synced chain.
/// Provides transactional access to data via providers.
#[derive(Debug)]
pub struct SyncDb {
    metrics_enabled: bool,
    config: SyncStoreConfig,

    env: DatabaseEnv,
}

impl SyncDb {
    /// Creates or opens a database environment at the given path.
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        Self::open_env(SyncStoreConfig::with_datadir(path.to_path_buf()))
    }

    /// Creates or opens the database environment described by `config`.
    ///
    /// Metrics are enabled if the configuration asks for them.
    pub fn open(config: &SyncStoreConfig) -> Result<Self, StorageError> {
        let db = Self::open_env(config.clone())?;
        Ok(if config.metrics_enabled { db.with_metrics() } else { db })
    }

    fn open_env(config: SyncStoreConfig) -> Result<Self, StorageError> {
        let env = init_db_for::<_, Tables>(&config.datadir, DatabaseArguments::default())
            .inspect_err(|err| {
                error!(
                    target: "chainsync::storage",
                    datadir = %config.datadir.display(),
                    %err,
                    "Failed to open sync store"
                );
            })?;
        Ok(Self { metrics_enabled: false, config, env })
    }

    /// Enables metrics on the database environment.
    pub fn with_metrics(mut self) -> Self {
        self.metrics_enabled = true;
        self.config.metrics_enabled = true;
        Metrics::init();
        self
    }

    /// Returns the configuration the store was opened with.
    pub const fn config(&self) -> &SyncStoreConfig {
        &self.config
    }

    /// Creates an empty event query over `[from_timestamp, to_timestamp]` using the configured
    /// page size.
    pub const fn events_query(&self, from_timestamp: u64, to_timestamp: u64) -> LogEventsQuery {
        LogEventsQuery::new(from_timestamp, to_timestamp)
            .with_page_size(self.config.events_page_size)
    }

    /// Streams the child addresses of `factory` using the configured batch size.
    pub fn child_addresses(
        &self,
        chain_id: ChainId,
        factory: &FactoryCriteria,
        up_to_block: u64,
    ) -> Result<ChildAddressBatches<'_>, StorageError> {
        self.get_factory_child_addresses(
            chain_id,
            factory,
            up_to_block,
            self.config.child_address_page_size,
        )
    }

    fn observe_call<T, E, F: FnOnce() -> Result<T, E>>(
        &self,
        name: &'static str,
        f: F,
    ) -> Result<T, E> {
        if self.metrics_enabled {
            observe_metrics_for_result!(
                Metrics::STORAGE_REQUESTS_SUCCESS_TOTAL,
                Metrics::STORAGE_REQUESTS_ERROR_TOTAL,
                Metrics::STORAGE_REQUEST_DURATION_SECONDS,
                name,
                f()
            )
        } else {
            f()
        }
    }

    /// Runs `f` inside a read transaction, recording it under `name`.
    pub(crate) fn read<T, F>(&self, name: &'static str, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&SyncTx) -> Result<T, StorageError>,
    {
        self.observe_call(name, || self.env.view(f).map_err(StorageError::from).and_then(|r| r))
    }

    /// Runs `f` inside a write transaction, recording it under `name`.
    ///
    /// The transaction is committed if `f` succeeds and aborted otherwise.
    fn write<T, F>(&self, name: &'static str, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&SyncTxMut) -> Result<T, StorageError>,
    {
        self.observe_call(name, || {
            let tx = self.env.tx_mut()?;
            match f(&tx) {
                Ok(value) => {
                    tx.commit()?;
                    Ok(value)
                }
                Err(err) => {
                    debug!(target: "chainsync::storage", method = name, %err, "Aborting write");
                    tx.abort();
                    Err(err)
                }
            }
        })
    }

    fn write_fragment_records<R: FragmentRecord>(
        tx: &SyncTxMut,
        fragments: &[R],
        interval: Interval,
    ) -> Result<(), StorageError> {
        for fragment in fragments {
            IntervalProvider::<_, R>::new(tx, fragment.chain_id())
                .record(core::slice::from_ref(fragment), interval)?;
        }
        Ok(())
    }
}

impl RecordStorageWriter for SyncDb {
    fn insert_factory_child_address_logs(
        &self,
        chain_id: ChainId,
        logs: &[Log],
    ) -> Result<(), StorageError> {
        self.write(Metrics::STORAGE_METHOD_INSERT_FACTORY_CHILD_ADDRESS_LOGS, |tx| {
            RecordProvider::new(tx, chain_id).insert_logs(logs)
        })
    }

    fn insert_realtime_block(
        &self,
        chain_id: ChainId,
        block: &Block,
        transactions: &[Transaction],
        logs: &[Log],
    ) -> Result<(), StorageError> {
        self.write(Metrics::STORAGE_METHOD_INSERT_REALTIME_BLOCK, |tx| {
            RecordProvider::new(tx, chain_id).insert_block_records(block, transactions, logs)
        })
    }

    fn insert_rpc_request_result(
        &self,
        chain_id: ChainId,
        request: &str,
        block_number: u64,
        result: &str,
    ) -> Result<(), StorageError> {
        self.write(Metrics::STORAGE_METHOD_INSERT_RPC_REQUEST_RESULT, |tx| {
            RecordProvider::new(tx, chain_id).upsert_request_result(request, block_number, result)
        })
    }
}

impl RecordStorageReader for SyncDb {
    fn get_block(
        &self,
        chain_id: ChainId,
        block_id: BlockNumHash,
    ) -> Result<Option<Block>, StorageError> {
        self.read(Metrics::STORAGE_METHOD_GET_BLOCK, |tx| {
            RecordProvider::new(tx, chain_id).get_block(block_id)
        })
    }

    fn get_transaction(
        &self,
        chain_id: ChainId,
        block_number: u64,
        hash: B256,
    ) -> Result<Option<Transaction>, StorageError> {
        self.read(Metrics::STORAGE_METHOD_GET_TRANSACTION, |tx| {
            RecordProvider::new(tx, chain_id).get_transaction(block_number, hash)
        })
    }

    fn get_logs(
        &self,
        chain_id: ChainId,
        block_id: BlockNumHash,
    ) -> Result<Vec<Log>, StorageError> {
        self.read(Metrics::STORAGE_METHOD_GET_LOGS, |tx| {
            RecordProvider::new(tx, chain_id).get_logs(block_id)
        })
    }

    fn get_rpc_request_result(
        &self,
        chain_id: ChainId,
        request: &str,
        block_number: u64,
    ) -> Result<Option<String>, StorageError> {
        self.read(Metrics::STORAGE_METHOD_GET_RPC_REQUEST_RESULT, |tx| {
            RecordProvider::new(tx, chain_id).get_request_result(request, block_number)
        })
    }
}

impl IntervalStorageWriter for SyncDb {
    fn insert_log_filter_interval(
        &self,
        chain_id: ChainId,
        criteria: &LogFilterCriteria,
        block: &Block,
        transactions: &[Transaction],
        logs: &[Log],
        interval: Interval,
    ) -> Result<(), StorageError> {
        let interval = Interval::try_new(interval.start_block, interval.end_block)?;
        let fragments = build_log_filter_fragments(chain_id, criteria);
        self.write(Metrics::STORAGE_METHOD_INSERT_LOG_FILTER_INTERVAL, |tx| {
            RecordProvider::new(tx, chain_id).insert_block_records(block, transactions, logs)?;
            Self::write_fragment_records(tx, &fragments, interval)
        })
    }

    fn insert_factory_log_filter_interval(
        &self,
        chain_id: ChainId,
        factory: &FactoryCriteria,
        block: &Block,
        transactions: &[Transaction],
        logs: &[Log],
        interval: Interval,
    ) -> Result<(), StorageError> {
        let interval = Interval::try_new(interval.start_block, interval.end_block)?;
        let fragments = build_factory_fragments(chain_id, factory);
        self.write(Metrics::STORAGE_METHOD_INSERT_FACTORY_LOG_FILTER_INTERVAL, |tx| {
            RecordProvider::new(tx, chain_id).insert_block_records(block, transactions, logs)?;
            Self::write_fragment_records(tx, &fragments, interval)
        })
    }

    fn record_interval<R: FragmentRecord>(
        &self,
        fragments: &[R],
        interval: Interval,
    ) -> Result<(), StorageError> {
        let interval = Interval::try_new(interval.start_block, interval.end_block)?;
        for fragment in fragments {
            self.write(Metrics::STORAGE_METHOD_RECORD_INTERVAL, |tx| {
                Self::write_fragment_records(tx, core::slice::from_ref(fragment), interval)
            })?;
        }
        Ok(())
    }

    fn insert_realtime_interval(
        &self,
        chain_id: ChainId,
        log_filters: &[LogFilterCriteria],
        factories: &[FactoryCriteria],
        interval: Interval,
    ) -> Result<(), StorageError> {
        let interval = Interval::try_new(interval.start_block, interval.end_block)?;
        let log_filter_fragments: Vec<LogFilterFragment> = log_filters
            .iter()
            .cloned()
            .chain(factories.iter().map(FactoryCriteria::creation_log_filter))
            .flat_map(|criteria| build_log_filter_fragments(chain_id, &criteria))
            .collect();
        let factory_fragments: Vec<FactoryFragment> = factories
            .iter()
            .flat_map(|factory| build_factory_fragments(chain_id, factory))
            .collect();

        self.write(Metrics::STORAGE_METHOD_INSERT_REALTIME_INTERVAL, |tx| {
            Self::write_fragment_records(tx, &log_filter_fragments, interval)?;
            Self::write_fragment_records(tx, &factory_fragments, interval)
        })
    }
}

impl IntervalStorageReader for SyncDb {
    fn get_log_filter_intervals(
        &self,
        chain_id: ChainId,
        criteria: &LogFilterCriteria,
    ) -> Result<Vec<Interval>, StorageError> {
        self.observe_call(Metrics::STORAGE_METHOD_GET_LOG_FILTER_INTERVALS, || {
            self.query_coverage(&build_log_filter_fragments(chain_id, criteria))
        })
    }

    fn get_factory_log_filter_intervals(
        &self,
        chain_id: ChainId,
        factory: &FactoryCriteria,
    ) -> Result<Vec<Interval>, StorageError> {
        self.observe_call(Metrics::STORAGE_METHOD_GET_FACTORY_LOG_FILTER_INTERVALS, || {
            self.query_coverage(&build_factory_fragments(chain_id, factory))
        })
    }

    fn query_coverage<R: FragmentRecord>(
        &self,
        fragments: &[R],
    ) -> Result<Vec<Interval>, StorageError> {
        if fragments.is_empty() {
            return Ok(Vec::new());
        }

        // Re-merging on read repairs sets left unmerged by an interrupted writer.
        for fragment in fragments {
            self.write(Metrics::STORAGE_METHOD_QUERY_COVERAGE, |tx| {
                IntervalProvider::<_, R>::new(tx, fragment.chain_id()).merge(fragment, None)
            })?;
        }

        let coverage = self.read(Metrics::STORAGE_METHOD_QUERY_COVERAGE, |tx| {
            fragments
                .iter()
                .map(|fragment| {
                    IntervalProvider::<_, R>::new(tx, fragment.chain_id())
                        .effective_coverage(fragment)
                })
                .collect::<Result<Vec<_>, _>>()
        })?;
        Ok(interval::intersection_many(coverage))
    }
}

impl EventStorageReader for SyncDb {
    type LogEventPages<'a> = LogEventPages<'a>;
    type ChildAddressBatches<'a> = ChildAddressBatches<'a>;

    fn get_log_events(
        &self,
        query: LogEventsQuery,
    ) -> Result<Self::LogEventPages<'_>, StorageError> {
        if query.page_size == 0 {
            return Err(StorageError::InvalidPageSize);
        }
        Ok(LogEventPages::new(self, query))
    }

    fn get_factory_child_addresses(
        &self,
        chain_id: ChainId,
        factory: &FactoryCriteria,
        up_to_block: u64,
        page_size: usize,
    ) -> Result<Self::ChildAddressBatches<'_>, StorageError> {
        if page_size == 0 {
            return Err(StorageError::InvalidPageSize);
        }
        Ok(ChildAddressBatches::new(self, chain_id, factory.clone(), up_to_block, page_size))
    }
}

impl StorageRewinder for SyncDb {
    fn delete_realtime_data(
        &self,
        chain_id: ChainId,
        from_block: u64,
    ) -> Result<(), StorageError> {
        self.write(Metrics::STORAGE_METHOD_DELETE_REALTIME_DATA, |tx| {
            RewindProvider::new(tx, chain_id).rewind_to(from_block).map(|_| ())
        })
    }
}

impl MetricsReporter for SyncDb {
    fn report_metrics(&self) {
        let mut metrics = Vec::new();

        let _ = self
            .env
            .view(|tx| {
                for table in Tables::ALL.iter().map(Tables::name) {
                    let table_db = tx.inner.open_db(Some(table))?;

                    let stats = tx.inner.db_stat(&table_db)?;

                    let page_size = stats.page_size() as usize;
                    let leaf_pages = stats.leaf_pages();
                    let branch_pages = stats.branch_pages();
                    let overflow_pages = stats.overflow_pages();
                    let num_pages = leaf_pages + branch_pages + overflow_pages;
                    let table_size = page_size * num_pages;
                    let entries = stats.entries();

                    metrics.push((
                        Metrics::STORAGE_TABLE_SIZE,
                        table_size as f64,
                        vec![Label::new("table", table)],
                    ));
                    let pages_by_type = [
                        ("leaf", leaf_pages),
                        ("branch", branch_pages),
                        ("overflow", overflow_pages),
                    ];
                    for (page_type, pages) in pages_by_type {
                        metrics.push((
                            Metrics::STORAGE_TABLE_PAGES,
                            pages as f64,
                            vec![Label::new("table", table), Label::new("type", page_type)],
                        ));
                    }
                    metrics.push((
                        Metrics::STORAGE_TABLE_ENTRIES,
                        entries as f64,
                        vec![Label::new("table", table)],
                    ));
                }

                Ok::<(), eyre::Report>(())
            })
            .inspect_err(|err| {
                warn!(target: "chainsync::storage", %err, "Failed to collect database metrics");
            });

        for (name, value, labels) in metrics {
            gauge!(name, labels).set(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B64, Bloom, Bytes, U256};
    use chainsync_types::{ChildAddressLocation, EventsPage, LogFilterSource};
    use tempfile::TempDir;

    const CHAIN_ID: ChainId = 1;
    const X: Address = Address::repeat_byte(0xaa);
    const Y: Address = Address::repeat_byte(0xbb);
    const SELECTOR: B256 = B256::repeat_byte(0xee);

    fn block(number: u64, timestamp: u64) -> Block {
        Block {
            hash: B256::left_padding_from(&number.to_be_bytes()),
            number,
            parent_hash: B256::left_padding_from(&number.saturating_sub(1).to_be_bytes()),
            timestamp,
            miner: Address::ZERO,
            gas_limit: U256::from(30_000_000u64),
            gas_used: U256::ZERO,
            base_fee_per_gas: None,
            difficulty: U256::ZERO,
            total_difficulty: None,
            size: U256::from(512u64),
            extra_data: Bytes::new(),
            logs_bloom: Bloom::ZERO,
            mix_hash: B256::ZERO,
            nonce: B64::ZERO,
            receipts_root: B256::ZERO,
            sha3_uncles: B256::ZERO,
            state_root: B256::ZERO,
            transactions_root: B256::ZERO,
        }
    }

    fn log(block: &Block, log_index: u32, address: Address) -> Log {
        Log {
            address,
            topics: [Some(SELECTOR), None, None, None],
            data: Bytes::new(),
            block_hash: block.hash,
            block_number: block.number,
            log_index,
            transaction_hash: None,
            transaction_index: None,
        }
    }

    fn open() -> (TempDir, SyncDb) {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let db = SyncDb::new(&tmp_dir.path().join("syncdb")).expect("create db");
        (tmp_dir, db)
    }

    #[test]
    fn test_sync_db_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncDb>();
    }

    #[test]
    fn test_open_with_config() {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let config = SyncStoreConfig::new(tmp_dir.path().join("syncdb"), true, 50, 5);
        let db = SyncDb::open(&config).expect("open db");
        assert_eq!(db.config(), &config);
        assert_eq!(db.events_query(0, 10).page_size, 50);
        db.report_metrics();
    }

    #[test]
    fn test_block_records_roundtrip() {
        let (_tmp, db) = open();
        let b = block(10, 100);
        let logs = vec![log(&b, 0, X), log(&b, 1, Y)];
        db.insert_realtime_block(CHAIN_ID, &b, &[], &logs).expect("insert block");
        // Inserting again is a no-op.
        db.insert_realtime_block(CHAIN_ID, &b, &[], &logs).expect("insert block again");

        let id = BlockNumHash::new(b.number, b.hash);
        assert_eq!(db.get_block(CHAIN_ID, id).expect("get block"), Some(b.clone()));
        assert_eq!(db.get_logs(CHAIN_ID, id).expect("get logs"), logs);
        assert_eq!(db.get_block(2, id).expect("get block"), None);
        assert_eq!(db.get_transaction(CHAIN_ID, 10, B256::ZERO).expect("get tx"), None);
    }

    #[test]
    fn test_request_result_overwrites() {
        let (_tmp, db) = open();
        db.insert_rpc_request_result(CHAIN_ID, "eth_call", 5, "0x01").expect("insert");
        db.insert_rpc_request_result(CHAIN_ID, "eth_call", 5, "0x02").expect("overwrite");
        assert_eq!(
            db.get_rpc_request_result(CHAIN_ID, "eth_call", 5).expect("get"),
            Some("0x02".to_string())
        );
        assert_eq!(db.get_rpc_request_result(CHAIN_ID, "eth_call", 6).expect("get"), None);
    }

    #[test]
    fn test_log_filter_interval_roundtrip() {
        let (_tmp, db) = open();
        let criteria = LogFilterCriteria::for_address(X);
        let b = block(100, 1_000);
        db.insert_log_filter_interval(
            CHAIN_ID,
            &criteria,
            &b,
            &[],
            &[log(&b, 0, X)],
            Interval::new(1, 100),
        )
        .expect("insert interval");

        assert_eq!(
            db.get_log_filter_intervals(CHAIN_ID, &criteria).expect("intervals"),
            vec![Interval::new(1, 100)]
        );
        assert!(db.get_log_filter_intervals(2, &criteria).expect("intervals").is_empty());
    }

    #[test]
    fn test_realtime_interval_covers_factory_creation_logs() {
        let (_tmp, db) = open();
        let factory = FactoryCriteria::new(X, SELECTOR, ChildAddressLocation::Topic(1));
        db.insert_realtime_interval(
            CHAIN_ID,
            &[],
            std::slice::from_ref(&factory),
            Interval::new(5, 9),
        )
        .expect("insert realtime interval");

        assert_eq!(
            db.get_factory_log_filter_intervals(CHAIN_ID, &factory).expect("factory intervals"),
            vec![Interval::new(5, 9)]
        );
        assert_eq!(
            db.get_log_filter_intervals(CHAIN_ID, &factory.creation_log_filter())
                .expect("creation intervals"),
            vec![Interval::new(5, 9)]
        );
    }

    #[test]
    fn test_query_coverage_without_fragments_is_empty() {
        let (_tmp, db) = open();
        let fragments: Vec<LogFilterFragment> = Vec::new();
        assert!(db.query_coverage(&fragments).expect("coverage").is_empty());
    }

    #[test]
    fn test_failed_write_is_rolled_back() {
        let (_tmp, db) = open();
        let criteria = LogFilterCriteria::for_address(X);
        let fragments = build_log_filter_fragments(CHAIN_ID, &criteria);
        let result = db.write("test", |tx| {
            SyncDb::write_fragment_records(tx, &fragments, Interval::new(1, 10))?;
            Err::<(), _>(StorageError::InvalidPageSize)
        });
        assert_eq!(result, Err(StorageError::InvalidPageSize));
        assert!(db.get_log_filter_intervals(CHAIN_ID, &criteria).expect("intervals").is_empty());
    }

    #[test]
    fn test_read_returns_closure_error() {
        let (_tmp, db) = open();
        let result = db.read("test", |_| Err::<(), _>(StorageError::InvalidPageSize));
        assert_eq!(result, Err(StorageError::InvalidPageSize));
    }

    #[test]
    fn test_reversed_interval_is_rejected() {
        let (_tmp, db) = open();
        let criteria = LogFilterCriteria::for_address(X);
        let fragments = build_log_filter_fragments(CHAIN_ID, &criteria);
        db.record_interval(&fragments, Interval::new(1, 5)).expect("record");

        let reversed = Interval { start_block: 50, end_block: 10 };
        let expected = Err(StorageError::InvalidInterval { start: 50, end: 10 });
        assert_eq!(db.record_interval(&fragments, reversed), expected);
        let watched = std::slice::from_ref(&criteria);
        assert_eq!(db.insert_realtime_interval(CHAIN_ID, watched, &[], reversed), expected);
        let b = block(50, 500);
        assert_eq!(
            db.insert_log_filter_interval(CHAIN_ID, &criteria, &b, &[], &[], reversed),
            expected
        );
        let factory = FactoryCriteria::new(X, SELECTOR, ChildAddressLocation::Topic(1));
        assert_eq!(
            db.insert_factory_log_filter_interval(CHAIN_ID, &factory, &b, &[], &[], reversed),
            expected
        );

        assert_eq!(
            db.get_log_filter_intervals(CHAIN_ID, &criteria).expect("intervals"),
            vec![Interval::new(1, 5)]
        );
        assert_eq!(db.get_block(CHAIN_ID, BlockNumHash::new(50, b.hash)).expect("block"), None);

        db.record_interval(&fragments, Interval::new(6, 8)).expect("record after rejection");
        assert_eq!(db.query_coverage(&fragments).expect("coverage"), vec![Interval::new(1, 8)]);
    }

    #[test]
    fn test_long_request_result_roundtrip() {
        let (_tmp, db) = open();
        let request = format!("eth_call_0x{}", "ab".repeat(2_500));
        db.insert_rpc_request_result(CHAIN_ID, &request, 5, "0x1").expect("insert");
        assert_eq!(
            db.get_rpc_request_result(CHAIN_ID, &request, 5).expect("get"),
            Some("0x1".to_string())
        );
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let (_tmp, db) = open();
        let query = LogEventsQuery::new(0, 10)
            .with_log_filter(LogFilterSource::new("x", CHAIN_ID, LogFilterCriteria::for_address(X)))
            .with_page_size(0);
        assert!(matches!(db.get_log_events(query), Err(StorageError::InvalidPageSize)));

        let factory = FactoryCriteria::new(X, SELECTOR, ChildAddressLocation::Topic(1));
        assert!(matches!(
            db.get_factory_child_addresses(CHAIN_ID, &factory, 10, 0),
            Err(StorageError::InvalidPageSize)
        ));
    }

    #[test]
    fn test_rewind_through_trait() {
        let (_tmp, db) = open();
        for number in [10, 20] {
            let b = block(number, number);
            db.insert_realtime_block(CHAIN_ID, &b, &[], &[log(&b, 0, X)]).expect("insert");
        }
        db.delete_realtime_data(CHAIN_ID, 10).expect("rewind");

        let pages: Vec<EventsPage> = db
            .get_log_events(LogEventsQuery::new(0, 100).with_log_filter(LogFilterSource::new(
                "x",
                CHAIN_ID,
                LogFilterCriteria::for_address(X),
            )))
            .expect("events")
            .collect::<Result<_, _>>()
            .expect("pages");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].events.len(), 1);
        assert_eq!(pages[0].events[0].block.number, 10);
    }
}
