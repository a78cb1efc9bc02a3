//! Reth's MDBX-backed provider for fragment intervals.
//!
//! [`IntervalProvider`] keeps, per fragment, the set of block ranges known to be fully synced.
//! The set is stored as one row per interval and is always merged: every write reads the stored
//! rows, deletes them and reinserts `union(stored ∪ new)`. Inside one MDBX write transaction this
//! is invisible to readers.
//!
//! The provider is generic over [`FragmentRecord`], so log filter and factory fragments share the
//! logic while living in separate tables.

use crate::{
    error::StorageError,
    models::{FragmentKey, FragmentRecord, IntervalEnd, IntervalKey},
};
use alloy_primitives::ChainId;
use chainsync_types::{Interval, interval};
use core::marker::PhantomData;
use reth_db_api::{
    cursor::{DbCursorRO, DbCursorRW},
    transaction::{DbTx, DbTxMut},
};
use tracing::{debug, error, trace};

/// An interval storage for one fragment kind.
#[derive(Debug)]
pub(crate) struct IntervalProvider<'tx, TX, R> {
    tx: &'tx TX,
    chain_id: ChainId,
    _fragment: PhantomData<R>,
}

impl<'tx, TX, R> IntervalProvider<'tx, TX, R> {
    pub(crate) const fn new(tx: &'tx TX, chain_id: ChainId) -> Self {
        Self { tx, chain_id, _fragment: PhantomData }
    }
}

impl<TX, R> IntervalProvider<'_, TX, R>
where
    TX: DbTxMut + DbTx,
    R: FragmentRecord,
{
    /// Records `interval` as synced for every fragment.
    pub(crate) fn record(&self, fragments: &[R], interval: Interval) -> Result<(), StorageError> {
        for fragment in fragments {
            self.merge(fragment, Some(interval))?;
        }
        Ok(())
    }

    /// Upserts the fragment row and rewrites its intervals as `union(stored ∪ extra)`.
    ///
    /// Returns the merged set.
    pub(crate) fn merge(
        &self,
        fragment: &R,
        extra: Option<Interval>,
    ) -> Result<Vec<Interval>, StorageError> {
        let id = fragment.id();
        debug!(
            target: "chainsync::storage",
            chain_id = %self.chain_id,
            fragment_id = %id,
            interval = ?extra,
            "Merging fragment intervals"
        );

        self.tx.put::<R::Fragments>(fragment.key(), (*fragment).into()).inspect_err(|err| {
            error!(
                target: "chainsync::storage",
                chain_id = %self.chain_id,
                fragment_id = %id,
                %err,
                "Failed to upsert fragment"
            );
        })?;

        let mut stored = Vec::new();
        {
            let mut cursor = self.tx.cursor_write::<R::Intervals>()?;
            let mut walker = cursor.walk(Some(IntervalKey::first_of(self.chain_id, id)))?;
            while let Some(row) = walker.next() {
                let (key, end) = row.inspect_err(|err| {
                    error!(
                        target: "chainsync::storage",
                        chain_id = %self.chain_id,
                        fragment_id = %id,
                        %err,
                        "Failed to read fragment interval"
                    );
                })?;
                if !key.is_of(self.chain_id, &id) {
                    break;
                }
                stored.push(Interval::try_new(key.start_block, *end)?);
                walker.delete_current()?;
            }
        }

        let merged = interval::union(stored.into_iter().chain(extra));
        for interval in &merged {
            let key =
                IntervalKey { chain_id: self.chain_id, id, start_block: interval.start_block };
            self.tx.put::<R::Intervals>(key, IntervalEnd(interval.end_block)).inspect_err(
                |err| {
                    error!(
                        target: "chainsync::storage",
                        chain_id = %self.chain_id,
                        fragment_id = %id,
                        %err,
                        "Failed to insert fragment interval"
                    );
                },
            )?;
        }

        trace!(
            target: "chainsync::storage",
            chain_id = %self.chain_id,
            fragment_id = %id,
            intervals = merged.len(),
            "Fragment intervals merged"
        );
        Ok(merged)
    }

    /// Drops every interval starting after `from_block` and clamps the rest to end at it.
    ///
    /// Returns the number of changed rows.
    pub(crate) fn rewind(&self, from_block: u64) -> Result<usize, StorageError> {
        let mut clamped = Vec::new();
        let mut changed = 0;
        {
            let mut cursor = self.tx.cursor_write::<R::Intervals>()?;
            let mut walker = cursor.walk(Some(IntervalKey::first_of_chain(self.chain_id)))?;
            while let Some(row) = walker.next() {
                let (key, end) = row?;
                if key.chain_id != self.chain_id {
                    break;
                }
                if key.start_block > from_block {
                    walker.delete_current()?;
                    changed += 1;
                } else if *end > from_block {
                    clamped.push(key);
                }
            }
        }

        for key in clamped {
            self.tx.put::<R::Intervals>(key, IntervalEnd(from_block))?;
            changed += 1;
        }
        Ok(changed)
    }
}

impl<TX, R> IntervalProvider<'_, TX, R>
where
    TX: DbTx,
    R: FragmentRecord,
{
    /// Returns the stored intervals of one fragment id.
    pub(crate) fn intervals_of(&self, fragment: &R) -> Result<Vec<Interval>, StorageError> {
        let id = fragment.id();
        let mut cursor = self.tx.cursor_read::<R::Intervals>()?;
        let mut intervals = Vec::new();
        for row in cursor.walk(Some(IntervalKey::first_of(self.chain_id, id)))? {
            let (key, end) = row?;
            if !key.is_of(self.chain_id, &id) {
                break;
            }
            intervals.push(Interval::try_new(key.start_block, *end)?);
        }
        Ok(intervals)
    }

    /// Returns the stored fragments of the chain that cover `requested`.
    pub(crate) fn covering_fragments(&self, requested: &R) -> Result<Vec<R>, StorageError> {
        let mut cursor = self.tx.cursor_read::<R::Fragments>()?;
        let mut covering = Vec::new();
        for row in cursor.walk(Some(FragmentKey::first_of(self.chain_id)))? {
            let (key, entry) = row?;
            if key.chain_id != self.chain_id {
                break;
            }
            let stored: R = entry.into();
            if stored.covers(requested) {
                covering.push(stored);
            }
        }
        Ok(covering)
    }

    /// Returns the merged intervals of every stored fragment that covers `requested`.
    pub(crate) fn effective_coverage(&self, requested: &R) -> Result<Vec<Interval>, StorageError> {
        let mut intervals = Vec::new();
        for stored in self.covering_fragments(requested)? {
            intervals.extend(self.intervals_of(&stored)?);
        }
        Ok(interval::union(intervals))
    }
}
