//! Lazy page iterators over the store.
//!
//! Every page is read in its own transaction, so a long-running consumer never pins an MDBX
//! snapshot between pages. Pages written concurrently with the iteration may or may not be seen.

use crate::{
    Metrics, SyncDb,
    error::StorageError,
    providers::{ChildAddressCursor, EventProvider, FactoryProvider},
};
use alloy_primitives::{Address, ChainId};
use chainsync_types::{
    EventCount, EventCursor, EventsPage, EventsPageMetadata, FactoryCriteria, LogEvent,
    LogEventsQuery,
};
use tracing::{trace, warn};

/// Pages of a [`LogEventsQuery`], in global event order.
///
/// Coverage counts are computed once, on the first page, and repeated on every page. A page
/// shorter than the page size ends the iteration.
#[derive(Debug)]
pub struct LogEventPages<'db> {
    db: &'db SyncDb,
    query: LogEventsQuery,
    cursor: Option<EventCursor>,
    counts: Option<Vec<EventCount>>,
    done: bool,
}

impl<'db> LogEventPages<'db> {
    pub(crate) const fn new(db: &'db SyncDb, query: LogEventsQuery) -> Self {
        Self { db, query, cursor: None, counts: None, done: false }
    }

    /// Restarts the iteration strictly after `cursor`.
    ///
    /// Use the [`EventsPage::cursor`] of the last consumed page to resume a sequence.
    pub const fn with_cursor(mut self, cursor: EventCursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    fn next_page(&mut self) -> Result<EventsPage, StorageError> {
        let page_size = self.query.page_size;
        if self.query.has_no_sources() {
            warn!(target: "chainsync::storage", "Log event query without sources");
            self.done = true;
            return Ok(self.page(Vec::new(), None));
        }

        let (query, after, need_counts) = (&self.query, self.cursor, self.counts.is_none());
        let (mut events, counts) = self.db.read(Metrics::STORAGE_METHOD_GET_LOG_EVENTS, |tx| {
            let provider = EventProvider::new(tx);
            let matcher = provider.source_matcher(query)?;
            let counts = if need_counts { Some(provider.event_counts(&matcher)?) } else { None };
            let events = provider.events_after(&matcher, after, page_size.saturating_add(1))?;
            Ok((events, counts))
        })?;
        if counts.is_some() {
            self.counts = counts;
        }

        let has_more = events.len() > page_size;
        events.truncate(page_size);
        let cursor = events.last().map(|event| event.cursor());
        if has_more {
            self.cursor = cursor;
        } else {
            self.done = true;
        }

        trace!(
            target: "chainsync::storage",
            events = events.len(),
            has_more,
            "Read log events page"
        );
        Ok(self.page(events, cursor))
    }

    fn page(&self, events: Vec<LogEvent>, cursor: Option<EventCursor>) -> EventsPage {
        let page_ends_at_timestamp =
            events.last().map_or(self.query.to_timestamp, |event| event.block.timestamp);
        EventsPage {
            events,
            metadata: EventsPageMetadata {
                page_ends_at_timestamp,
                counts: self.counts.clone().unwrap_or_default(),
            },
            cursor,
        }
    }
}

impl Iterator for LogEventPages<'_> {
    type Item = Result<EventsPage, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let page = self.next_page();
        if page.is_err() {
            self.done = true;
        }
        Some(page)
    }
}

/// Batches of child addresses created by one factory.
///
/// Empty batches are never yielded. An address may appear in two consecutive batches when its
/// block straddles a page boundary.
#[derive(Debug)]
pub struct ChildAddressBatches<'db> {
    db: &'db SyncDb,
    chain_id: ChainId,
    factory: FactoryCriteria,
    up_to_block: u64,
    page_size: usize,
    next: Option<ChildAddressCursor>,
}

impl<'db> ChildAddressBatches<'db> {
    pub(crate) fn new(
        db: &'db SyncDb,
        chain_id: ChainId,
        factory: FactoryCriteria,
        up_to_block: u64,
        page_size: usize,
    ) -> Self {
        Self {
            db,
            chain_id,
            factory,
            up_to_block,
            page_size,
            next: Some(ChildAddressCursor::default()),
        }
    }
}

impl Iterator for ChildAddressBatches<'_> {
    type Item = Result<Vec<Address>, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(from) = self.next.take() {
            let batch = self.db.read(Metrics::STORAGE_METHOD_GET_FACTORY_CHILD_ADDRESSES, |tx| {
                FactoryProvider::new(tx, self.chain_id).child_address_batch(
                    &self.factory,
                    from,
                    self.up_to_block,
                    self.page_size,
                )
            });
            match batch {
                Ok(batch) => {
                    self.next = batch.next;
                    if !batch.addresses.is_empty() {
                        return Some(Ok(batch.addresses));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}
