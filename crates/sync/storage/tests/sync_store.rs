//! End-to-end behaviour of the sync store through its public traits.

use alloy_primitives::{Address, B64, B256, Bloom, Bytes, ChainId, U256};
use chainsync_storage::{
    EventStorageReader, IntervalStorageReader, IntervalStorageWriter, RecordStorageReader,
    RecordStorageWriter, StorageRewinder, SyncDb,
};
use chainsync_types::{
    Block, ChildAddressLocation, EventsPage, FactoryCriteria, FactorySource, Interval, Log,
    LogEventsQuery, LogFilterCriteria, LogFilterSource, build_log_filter_fragments,
};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

const CHAIN_ID: ChainId = 1;
const X: Address = Address::repeat_byte(0xaa);
const Y: Address = Address::repeat_byte(0xbb);
const FACTORY: Address = Address::repeat_byte(0xfa);
const TRANSFER: B256 = B256::repeat_byte(0x11);
const CREATED: B256 = B256::repeat_byte(0x22);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn open() -> (TempDir, SyncDb) {
    init_tracing();
    let tmp_dir = TempDir::new().expect("create temp dir");
    let db = SyncDb::new(&tmp_dir.path().join("sync")).expect("create db");
    (tmp_dir, db)
}

fn block(chain_id: ChainId, number: u64, timestamp: u64) -> Block {
    let mut hash = [0u8; 32];
    hash[..8].copy_from_slice(&chain_id.to_be_bytes());
    hash[24..].copy_from_slice(&number.to_be_bytes());
    Block {
        hash: B256::from(hash),
        number,
        parent_hash: B256::ZERO,
        timestamp,
        miner: Address::ZERO,
        gas_limit: U256::from(30_000_000u64),
        gas_used: U256::from(21_000u64),
        base_fee_per_gas: Some(U256::from(7u64)),
        difficulty: U256::ZERO,
        total_difficulty: None,
        size: U256::from(1_024u64),
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

fn log(block: &Block, log_index: u32, address: Address, topics: [Option<B256>; 4]) -> Log {
    Log {
        address,
        topics,
        data: Bytes::new(),
        block_hash: block.hash,
        block_number: block.number,
        log_index,
        transaction_hash: None,
        transaction_index: None,
    }
}

fn transfer(block: &Block, log_index: u32, address: Address) -> Log {
    log(block, log_index, address, [Some(TRANSFER), None, None, None])
}

fn collect_pages(db: &SyncDb, query: LogEventsQuery) -> Vec<EventsPage> {
    db.get_log_events(query).expect("query events").collect::<Result<_, _>>().expect("read pages")
}

fn watch_x(chain_id: ChainId) -> LogFilterSource {
    LogFilterSource::new(format!("x-{chain_id}"), chain_id, LogFilterCriteria::for_address(X))
}

#[test]
fn adjacent_intervals_merge() {
    let (_tmp, db) = open();
    let criteria = LogFilterCriteria::for_address(X);
    let fragments = build_log_filter_fragments(CHAIN_ID, &criteria);

    db.record_interval(&fragments, Interval::new(1, 100)).expect("record");
    db.record_interval(&fragments, Interval::new(101, 200)).expect("record");

    assert_eq!(db.query_coverage(&fragments).expect("coverage"), vec![Interval::new(1, 200)]);
}

#[test]
fn composite_criterion_reports_common_range() {
    let (_tmp, db) = open();
    let x = build_log_filter_fragments(CHAIN_ID, &LogFilterCriteria::for_address(X));
    let y = build_log_filter_fragments(CHAIN_ID, &LogFilterCriteria::for_address(Y));
    db.record_interval(&x, Interval::new(1, 500)).expect("record x");
    db.record_interval(&y, Interval::new(1, 200)).expect("record y");

    let composite = LogFilterCriteria::for_address(vec![X, Y]);
    assert_eq!(
        db.get_log_filter_intervals(CHAIN_ID, &composite).expect("intervals"),
        vec![Interval::new(1, 200)]
    );

    // A wildcard topic request is covered by the address-only rows.
    let with_topic = LogFilterCriteria::for_address(vec![Y, X]).with_topic(0, TRANSFER);
    assert_eq!(
        db.get_log_filter_intervals(CHAIN_ID, &with_topic).expect("intervals"),
        vec![Interval::new(1, 200)]
    );
}

#[test]
fn ingestion_extends_coverage_of_one_address() {
    let (_tmp, db) = open();
    let criteria = LogFilterCriteria::for_address(X);

    let first = block(CHAIN_ID, 200, 2_000);
    db.insert_log_filter_interval(
        CHAIN_ID,
        &criteria,
        &first,
        &[],
        &[transfer(&first, 0, X)],
        Interval::new(100, 200),
    )
    .expect("insert first range");
    assert_eq!(
        db.get_log_filter_intervals(CHAIN_ID, &criteria).expect("intervals"),
        vec![Interval::new(100, 200)]
    );

    let second = block(CHAIN_ID, 250, 2_500);
    db.insert_log_filter_interval(
        CHAIN_ID,
        &criteria,
        &second,
        &[],
        &[transfer(&second, 0, X)],
        Interval::new(201, 250),
    )
    .expect("insert second range");
    assert_eq!(
        db.get_log_filter_intervals(CHAIN_ID, &criteria).expect("intervals"),
        vec![Interval::new(100, 250)]
    );
}

#[test]
fn rollback_removes_rows_and_clamps_intervals() {
    let (_tmp, db) = open();
    let criteria = LogFilterCriteria::for_address(X);
    for number in [100, 150, 200, 300] {
        let b = block(CHAIN_ID, number, number);
        db.insert_realtime_block(CHAIN_ID, &b, &[], &[transfer(&b, 0, X)]).expect("insert block");
        db.insert_rpc_request_result(CHAIN_ID, "eth_getBalance", number, "0x0").expect("cache");
    }
    db.insert_realtime_interval(
        CHAIN_ID,
        std::slice::from_ref(&criteria),
        &[],
        Interval::new(1, 300),
    )
    .expect("record realtime interval");

    db.delete_realtime_data(CHAIN_ID, 150).expect("rollback");

    assert_eq!(
        db.get_log_filter_intervals(CHAIN_ID, &criteria).expect("intervals"),
        vec![Interval::new(1, 150)]
    );
    let pages = collect_pages(&db, LogEventsQuery::new(0, u64::MAX).with_log_filter(watch_x(1)));
    let blocks: Vec<u64> = pages[0].events.iter().map(|event| event.block.number).collect();
    assert_eq!(blocks, vec![100, 150]);
    assert_eq!(db.get_rpc_request_result(CHAIN_ID, "eth_getBalance", 200).expect("cache"), None);

    // Repeating the rollback changes nothing.
    db.delete_realtime_data(CHAIN_ID, 150).expect("rollback again");
    assert_eq!(
        db.get_log_filter_intervals(CHAIN_ID, &criteria).expect("intervals"),
        vec![Interval::new(1, 150)]
    );
    let again = collect_pages(&db, LogEventsQuery::new(0, u64::MAX).with_log_filter(watch_x(1)));
    assert_eq!(again, pages);
}

#[test]
fn pagination_splits_ties_without_skipping() {
    let (_tmp, db) = open();
    // Three events share timestamp 10 across two chains; the last one is at 20.
    let a = block(1, 5, 10);
    let b = block(2, 9, 10);
    let c = block(1, 6, 20);
    db.insert_realtime_block(1, &a, &[], &[transfer(&a, 0, X), transfer(&a, 1, X)]).unwrap();
    db.insert_realtime_block(2, &b, &[], &[transfer(&b, 0, X)]).unwrap();
    db.insert_realtime_block(1, &c, &[], &[transfer(&c, 0, X)]).unwrap();

    let query = LogEventsQuery::new(0, 100)
        .with_log_filter(watch_x(1))
        .with_log_filter(watch_x(2))
        .with_page_size(2);
    let pages = collect_pages(&db, query);

    assert_eq!(pages.len(), 2);
    let order: Vec<_> = pages
        .iter()
        .flat_map(|page| &page.events)
        .map(|event| {
            let cursor = event.cursor();
            (cursor.timestamp, cursor.chain_id, cursor.block_number, cursor.log_index)
        })
        .collect();
    assert_eq!(order, vec![(10, 1, 5, 0), (10, 1, 5, 1), (10, 2, 9, 0), (20, 1, 6, 0)]);
    assert_eq!(pages[0].metadata.page_ends_at_timestamp, 10);
    assert_eq!(pages[1].metadata.page_ends_at_timestamp, 20);
    assert!(pages[1].cursor.is_some());

    // Counts are per source and selector, identical on every page.
    assert_eq!(pages[0].metadata.counts, pages[1].metadata.counts);
    let total: u64 = pages[0].metadata.counts.iter().map(|count| count.count).sum();
    assert_eq!(total, 4);
}

#[test]
fn resuming_from_a_cursor_continues_the_sequence() {
    let (_tmp, db) = open();
    let b = block(CHAIN_ID, 1, 10);
    let logs: Vec<Log> = (0..5).map(|idx| transfer(&b, idx, X)).collect();
    db.insert_realtime_block(CHAIN_ID, &b, &[], &logs).expect("insert block");

    let query = LogEventsQuery::new(0, 100).with_log_filter(watch_x(CHAIN_ID)).with_page_size(2);
    let first = db
        .get_log_events(query.clone())
        .expect("query events")
        .next()
        .expect("first page")
        .expect("read page");
    let cursor = first.cursor.expect("cursor of a full page");

    let rest: Vec<EventsPage> = db
        .get_log_events(query)
        .expect("query events")
        .with_cursor(cursor)
        .collect::<Result<_, _>>()
        .expect("read pages");
    let indices: Vec<u32> =
        rest.iter().flat_map(|page| &page.events).map(|event| event.log.log_index).collect();
    assert_eq!(indices, vec![2, 3, 4]);
}

#[test]
fn empty_window_yields_one_empty_page() {
    let (_tmp, db) = open();
    let pages = collect_pages(&db, LogEventsQuery::new(5, 50).with_log_filter(watch_x(CHAIN_ID)));
    assert_eq!(pages.len(), 1);
    assert!(pages[0].events.is_empty());
    assert_eq!(pages[0].metadata.page_ends_at_timestamp, 50);
    assert_eq!(pages[0].cursor, None);
}

#[test]
fn factory_children_drive_events() {
    let (_tmp, db) = open();
    let child_a = Address::repeat_byte(0x0a);
    let child_b = Address::repeat_byte(0x0b);
    let factory = FactoryCriteria::new(FACTORY, CREATED, ChildAddressLocation::Topic(1))
        .with_topic(0, TRANSFER);

    let creation = block(CHAIN_ID, 1, 10);
    db.insert_factory_child_address_logs(
        CHAIN_ID,
        &[
            log(&creation, 0, FACTORY, [Some(CREATED), Some(child_a.into_word()), None, None]),
            log(&creation, 1, FACTORY, [Some(CREATED), Some(child_b.into_word()), None, None]),
        ],
    )
    .expect("insert creation logs");

    let batches: Vec<Vec<Address>> = db
        .get_factory_child_addresses(CHAIN_ID, &factory, 100, 10)
        .expect("child addresses")
        .collect::<Result<_, _>>()
        .expect("read batches");
    assert_eq!(batches, vec![vec![child_a, child_b]]);

    let activity = block(CHAIN_ID, 2, 20);
    let other_topic = log(&activity, 2, child_b, [Some(CREATED), None, None, None]);
    db.insert_realtime_block(
        CHAIN_ID,
        &activity,
        &[],
        &[transfer(&activity, 0, child_a), transfer(&activity, 1, X), other_topic],
    )
    .expect("insert activity");

    let query = LogEventsQuery::new(0, 100).with_factory(FactorySource::new(
        "children",
        CHAIN_ID,
        factory.clone(),
    ));
    let pages = collect_pages(&db, query);
    let emitters: Vec<Address> = pages[0].events.iter().map(|event| event.log.address).collect();
    assert_eq!(emitters, vec![child_a]);
    assert_eq!(pages[0].events[0].source_ids, vec!["children".to_string()]);

    db.insert_factory_log_filter_interval(
        CHAIN_ID,
        &factory,
        &activity,
        &[],
        &[],
        Interval::new(1, 2),
    )
    .expect("record factory interval");
    assert_eq!(
        db.get_factory_log_filter_intervals(CHAIN_ID, &factory).expect("intervals"),
        vec![Interval::new(1, 2)]
    );
}
