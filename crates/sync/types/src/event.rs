//! Event stream query and result types.

use crate::{
    block::Block,
    criteria::{FactoryCriteria, LogFilterCriteria},
    log::Log,
    transaction::Transaction,
};
use alloy_primitives::{B256, ChainId};
use core::fmt;
use serde::{Deserialize, Serialize};

/// Default number of events returned per page.
pub const DEFAULT_EVENTS_PAGE_SIZE: usize = 10_000;

/// A named criterion selected by an event query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource<C> {
    /// Caller-chosen identifier, echoed back on every matching event.
    pub id: String,
    /// Chain the source watches.
    pub chain_id: ChainId,
    /// What to match.
    pub criteria: C,
    /// Lowest block number to include.
    #[serde(default)]
    pub from_block: Option<u64>,
    /// Highest block number to include.
    #[serde(default)]
    pub to_block: Option<u64>,
    /// Restricts returned events to these selectors. Does not affect counts.
    #[serde(default)]
    pub include_event_selectors: Option<Vec<B256>>,
}

/// A direct log filter source.
pub type LogFilterSource = EventSource<LogFilterCriteria>;

/// A factory source.
pub type FactorySource = EventSource<FactoryCriteria>;

impl<C> EventSource<C> {
    /// Creates a source over the whole block range with no selector restriction.
    pub fn new(id: impl Into<String>, chain_id: ChainId, criteria: C) -> Self {
        Self {
            id: id.into(),
            chain_id,
            criteria,
            from_block: None,
            to_block: None,
            include_event_selectors: None,
        }
    }

    /// Bounds the source to `[from_block, to_block]`.
    pub const fn with_block_range(mut self, from_block: Option<u64>, to_block: Option<u64>) -> Self {
        self.from_block = from_block;
        self.to_block = to_block;
        self
    }

    /// Restricts returned events to the given selectors.
    pub fn with_event_selectors(mut self, selectors: Vec<B256>) -> Self {
        self.include_event_selectors = Some(selectors);
        self
    }

    /// Returns `true` if `block_number` lies within the source's block range.
    pub fn contains_block(&self, block_number: u64) -> bool {
        self.from_block.is_none_or(|from| block_number >= from) &&
            self.to_block.is_none_or(|to| block_number <= to)
    }

    /// Returns `true` if a log with the given selector passes the inclusion set.
    pub fn includes_selector(&self, selector: Option<&B256>) -> bool {
        match &self.include_event_selectors {
            None => true,
            Some(selectors) => selector.is_some_and(|s| selectors.contains(s)),
        }
    }
}

/// Query over stored logs, ordered by [`EventCursor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEventsQuery {
    /// Lowest block timestamp to include.
    pub from_timestamp: u64,
    /// Highest block timestamp to include.
    pub to_timestamp: u64,
    /// Direct log filter sources.
    #[serde(default)]
    pub log_filters: Vec<LogFilterSource>,
    /// Factory sources.
    #[serde(default)]
    pub factories: Vec<FactorySource>,
    /// Maximum number of events per page.
    pub page_size: usize,
}

impl LogEventsQuery {
    /// Creates a query over `[from_timestamp, to_timestamp]` with no sources.
    pub const fn new(from_timestamp: u64, to_timestamp: u64) -> Self {
        Self {
            from_timestamp,
            to_timestamp,
            log_filters: Vec::new(),
            factories: Vec::new(),
            page_size: DEFAULT_EVENTS_PAGE_SIZE,
        }
    }

    /// Adds a log filter source.
    pub fn with_log_filter(mut self, source: LogFilterSource) -> Self {
        self.log_filters.push(source);
        self
    }

    /// Adds a factory source.
    pub fn with_factory(mut self, source: FactorySource) -> Self {
        self.factories.push(source);
        self
    }

    /// Sets the page size.
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Returns `true` if the query names no source at all.
    pub fn has_no_sources(&self) -> bool {
        self.log_filters.is_empty() && self.factories.is_empty()
    }
}

/// Position of an event in the global order.
///
/// Field order is the sort order: block timestamp, chain, block number, log index. The block hash
/// only separates sibling blocks that share a number, so a resumed walk neither repeats nor skips
/// logs of a block that was replaced after a rollback.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct EventCursor {
    /// Block timestamp.
    pub timestamp: u64,
    /// Chain id.
    pub chain_id: ChainId,
    /// Block number.
    pub block_number: u64,
    /// Block hash.
    pub block_hash: B256,
    /// Log index within the block.
    pub log_index: u32,
}

impl fmt::Display for EventCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.timestamp, self.chain_id, self.block_number, self.log_index)
    }
}

/// A decoded event: one stored log plus its block and transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Ids of every source that matched the log, in query declaration order.
    pub source_ids: Vec<String>,
    /// Chain of the log.
    pub chain_id: ChainId,
    /// The log.
    pub log: Log,
    /// The including block.
    pub block: Block,
    /// The emitting transaction, if stored.
    pub transaction: Option<Transaction>,
}

impl LogEvent {
    /// Returns the event's position in the global order.
    pub const fn cursor(&self) -> EventCursor {
        EventCursor {
            timestamp: self.block.timestamp,
            chain_id: self.chain_id,
            block_number: self.block.number,
            block_hash: self.block.hash,
            log_index: self.log.log_index,
        }
    }
}

/// Number of matching logs for one source and selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCount {
    /// Source id.
    pub source_id: String,
    /// Topic 0 of the counted logs.
    pub selector: Option<B256>,
    /// Number of logs.
    pub count: u64,
}

/// Per-page metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsPageMetadata {
    /// Block timestamp of the last event, or the query's upper bound for an empty page.
    pub page_ends_at_timestamp: u64,
    /// Match counts over the whole query, ignoring selector inclusion sets.
    pub counts: Vec<EventCount>,
}

/// One page of the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsPage {
    /// Events in global order.
    pub events: Vec<LogEvent>,
    /// Page metadata.
    pub metadata: EventsPageMetadata,
    /// Cursor of the last event, from which the following page resumes.
    pub cursor: Option<EventCursor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::LogFilterCriteria;
    use alloy_primitives::Address;

    #[test]
    fn test_cursor_order_is_lexicographic() {
        let cursor = |timestamp, chain_id, block_number, block_hash, log_index| EventCursor {
            timestamp,
            chain_id,
            block_number,
            block_hash,
            log_index,
        };
        let a = cursor(10, 2, 1, B256::repeat_byte(9), 9);
        let b = cursor(10, 2, 2, B256::ZERO, 0);
        let c = cursor(11, 1, 0, B256::ZERO, 0);
        assert!(a < b && b < c);

        // Siblings at one height order by hash before log index.
        let sibling = cursor(10, 2, 2, B256::repeat_byte(1), 0);
        assert!(b < sibling && sibling < c);
    }

    #[test]
    fn test_source_bounds_and_selectors() {
        let selector = B256::repeat_byte(1);
        let source = LogFilterSource::new("s", 1, LogFilterCriteria::for_address(Address::ZERO))
            .with_block_range(Some(10), Some(20));
        assert!(source.contains_block(10));
        assert!(source.contains_block(20));
        assert!(!source.contains_block(21));
        assert!(source.includes_selector(None));

        let source = source.with_event_selectors(vec![selector]);
        assert!(source.includes_selector(Some(&selector)));
        assert!(!source.includes_selector(Some(&B256::ZERO)));
        assert!(!source.includes_selector(None));
    }

    #[test]
    fn test_query_deserialize() {
        let json = r#"{
            "fromTimestamp": 0,
            "toTimestamp": 100,
            "logFilters": [{
                "id": "transfers",
                "chainId": 1,
                "criteria": { "address": "0x00000000000000000000000000000000000000aa" },
                "toBlock": 50
            }],
            "pageSize": 2
        }"#;
        let query: LogEventsQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.log_filters.len(), 1);
        assert_eq!(query.log_filters[0].to_block, Some(50));
        assert!(query.factories.is_empty());
        assert_eq!(query.page_size, 2);
    }
}
