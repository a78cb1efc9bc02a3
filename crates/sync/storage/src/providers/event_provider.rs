//! Event stream reads.
//!
//! Events are produced by walking the cross-chain [`BlockTimeline`] index in
//! `(timestamp, chain, number, hash)` order and, for every block of a chain some source watches,
//! the block's logs in log-index order. That walk visits logs in exactly the
//! [`EventCursor`] order, so a page is a bounded prefix of the walk and the next page seeks to the
//! last cursor.

use crate::{
    error::StorageError,
    models::{BlockKey, BlockTimeline, Blocks, LogKey, Logs, TimelineKey},
    providers::{FactoryProvider, RecordProvider},
};
use alloy_primitives::{Address, B256, ChainId, map::HashSet};
use chainsync_types::{
    Block, EventCount, EventCursor, Log, LogEvent, LogEventsQuery, criteria::topics_match,
};
use core::ops::ControlFlow;
use reth_db_api::{cursor::DbCursorRO, transaction::DbTx};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Source predicates of one query, with factory children resolved.
#[derive(Debug)]
pub(crate) struct SourceMatcher<'q> {
    query: &'q LogEventsQuery,
    children: Vec<HashSet<Address>>,
    chains: BTreeSet<ChainId>,
}

impl<'q> SourceMatcher<'q> {
    pub(crate) fn new(query: &'q LogEventsQuery, children: Vec<HashSet<Address>>) -> Self {
        let chains = query
            .log_filters
            .iter()
            .map(|source| source.chain_id)
            .chain(query.factories.iter().map(|source| source.chain_id))
            .collect();
        Self { query, children, chains }
    }

    fn watches_chain(&self, chain_id: ChainId) -> bool {
        self.chains.contains(&chain_id)
    }

    /// Indices of the sources matching `log`, log filters first, in declaration order.
    ///
    /// Selector inclusion sets are only applied when `apply_selectors` is set.
    fn matching(&self, chain_id: ChainId, log: &Log, apply_selectors: bool) -> Vec<usize> {
        let selector = log.selector();
        let log_filters = self.query.log_filters.iter().map(|source| {
            source.chain_id == chain_id &&
                source.contains_block(log.block_number) &&
                source.criteria.matches(&log.address, &log.topics) &&
                (!apply_selectors || source.includes_selector(selector.as_ref()))
        });
        let factories =
            self.query.factories.iter().zip(&self.children).map(|(source, children)| {
                source.chain_id == chain_id &&
                    source.contains_block(log.block_number) &&
                    children.contains(&log.address) &&
                    topics_match(&source.criteria.topics, &log.topics) &&
                    (!apply_selectors || source.includes_selector(selector.as_ref()))
            });

        log_filters
            .chain(factories)
            .enumerate()
            .filter_map(|(idx, matched)| matched.then_some(idx))
            .collect()
    }

    fn source_id(&self, idx: usize) -> &'q str {
        let filters = self.query.log_filters.len();
        if idx < filters {
            &self.query.log_filters[idx].id
        } else {
            &self.query.factories[idx - filters].id
        }
    }
}

/// An event reader that wraps a transactional reference to the MDBX backend.
#[derive(Debug)]
pub(crate) struct EventProvider<'tx, TX> {
    tx: &'tx TX,
}

impl<'tx, TX> EventProvider<'tx, TX> {
    pub(crate) const fn new(tx: &'tx TX) -> Self {
        Self { tx }
    }
}

impl<TX> EventProvider<'_, TX>
where
    TX: DbTx,
{
    /// Resolves the child addresses of every factory source.
    pub(crate) fn source_matcher<'q>(
        &self,
        query: &'q LogEventsQuery,
    ) -> Result<SourceMatcher<'q>, StorageError> {
        let children = query
            .factories
            .iter()
            .map(|source| {
                FactoryProvider::new(self.tx, source.chain_id)
                    .all_child_addresses(&source.criteria, u64::MAX)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SourceMatcher::new(query, children))
    }

    /// Reads the events following `after`, up to `limit` of them.
    pub(crate) fn events_after(
        &self,
        matcher: &SourceMatcher<'_>,
        after: Option<EventCursor>,
        limit: usize,
    ) -> Result<Vec<LogEvent>, StorageError> {
        debug!(
            target: "chainsync::storage",
            after = ?after,
            limit,
            "Fetching log events"
        );

        let mut events = Vec::new();
        let mut current_block: Option<(TimelineKey, Option<Block>)> = None;

        self.scan(matcher, after, |key, log| {
            let sources = matcher.matching(key.chain_id, &log, true);
            if sources.is_empty() {
                return Ok(ControlFlow::Continue(()));
            }

            if current_block.as_ref().is_none_or(|(current, _)| current != key) {
                let block_key =
                    BlockKey { chain_id: key.chain_id, number: key.number, hash: key.hash };
                let block = self.tx.get::<Blocks>(block_key)?.map(Block::from);
                if block.is_none() {
                    warn!(
                        target: "chainsync::storage",
                        chain_id = %key.chain_id,
                        block_number = key.number,
                        block_hash = %key.hash,
                        "Timeline entry without block"
                    );
                }
                current_block = Some((*key, block));
            }
            let Some((_, Some(block))) = &current_block else {
                return Ok(ControlFlow::Continue(()));
            };

            let transaction = match log.transaction_hash {
                Some(hash) => RecordProvider::new(self.tx, key.chain_id)
                    .get_transaction(log.block_number, hash)?,
                None => None,
            };

            let source_ids =
                sources.into_iter().map(|idx| matcher.source_id(idx).to_string()).collect();
            events.push(LogEvent {
                source_ids,
                chain_id: key.chain_id,
                log,
                block: block.clone(),
                transaction,
            });

            if events.len() >= limit {
                return Ok(ControlFlow::Break(()));
            }
            Ok(ControlFlow::Continue(()))
        })?;

        Ok(events)
    }

    /// Counts matching logs per source and selector, ignoring selector inclusion sets.
    pub(crate) fn event_counts(
        &self,
        matcher: &SourceMatcher<'_>,
    ) -> Result<Vec<EventCount>, StorageError> {
        let mut counts: BTreeMap<(usize, Option<B256>), u64> = BTreeMap::new();
        self.scan(matcher, None, |key, log| {
            for idx in matcher.matching(key.chain_id, &log, false) {
                *counts.entry((idx, log.selector())).or_default() += 1;
            }
            Ok(ControlFlow::Continue(()))
        })?;

        Ok(counts
            .into_iter()
            .map(|((idx, selector), count)| EventCount {
                source_id: matcher.source_id(idx).to_string(),
                selector,
                count,
            })
            .collect())
    }

    /// Visits the logs of watched chains inside the query window, in event order, strictly after
    /// `after`.
    fn scan<F>(
        &self,
        matcher: &SourceMatcher<'_>,
        after: Option<EventCursor>,
        mut visit: F,
    ) -> Result<(), StorageError>
    where
        F: FnMut(&TimelineKey, Log) -> Result<ControlFlow<()>, StorageError>,
    {
        let query = matcher.query;
        let start = match after {
            Some(cursor) if cursor.timestamp >= query.from_timestamp => TimelineKey {
                timestamp: cursor.timestamp,
                chain_id: cursor.chain_id,
                number: cursor.block_number,
                hash: cursor.block_hash,
            },
            _ => TimelineKey::first_at(query.from_timestamp),
        };

        let mut timeline = self.tx.cursor_read::<BlockTimeline>()?;
        let mut logs = self.tx.cursor_read::<Logs>()?;

        for row in timeline.walk(Some(start))? {
            let (key, _) = row?;
            if key.timestamp > query.to_timestamp {
                break;
            }
            if !matcher.watches_chain(key.chain_id) {
                continue;
            }

            let first_log_index = match after {
                Some(cursor)
                    if (cursor.timestamp, cursor.chain_id, cursor.block_number) ==
                        (key.timestamp, key.chain_id, key.number) &&
                        cursor.block_hash == key.hash =>
                {
                    match cursor.log_index.checked_add(1) {
                        Some(index) => index,
                        None => continue,
                    }
                }
                _ => 0,
            };

            let log_start = LogKey {
                chain_id: key.chain_id,
                block_number: key.number,
                block_hash: key.hash,
                log_index: first_log_index,
            };
            for log_row in logs.walk(Some(log_start))? {
                let (log_key, entry) = log_row?;
                if log_key.chain_id != key.chain_id ||
                    log_key.block_number != key.number ||
                    log_key.block_hash != key.hash
                {
                    break;
                }
                if visit(&key, entry.into())?.is_break() {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}
