//! Reorg repair.
//!
//! [`RewindProvider`] removes every chain record above a rollback block and trims the synced
//! intervals of both fragment kinds so nothing claims coverage past it.

use crate::{
    error::StorageError,
    models::{
        AddressLogKey, AddressLogs, BlockKey, BlockTimeline, Blocks, LogKey, Logs, RequestKey,
        RequestResults, TimelineKey, TransactionKey, Transactions,
    },
    providers::IntervalProvider,
};
use alloy_primitives::{B256, ChainId};
use chainsync_types::{FactoryFragment, LogFilterFragment};
use reth_db_api::{
    cursor::{DbCursorRO, DbCursorRW},
    transaction::{DbTx, DbTxMut},
};
use tracing::{info, trace};

/// Rows removed by a rewind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RewindSummary {
    pub(crate) blocks: usize,
    pub(crate) transactions: usize,
    pub(crate) logs: usize,
    pub(crate) request_results: usize,
    pub(crate) intervals: usize,
}

/// A rewinder that wraps a transactional reference to the MDBX backend.
#[derive(Debug)]
pub(crate) struct RewindProvider<'tx, TX> {
    tx: &'tx TX,
    chain_id: ChainId,
}

impl<'tx, TX> RewindProvider<'tx, TX> {
    pub(crate) const fn new(tx: &'tx TX, chain_id: ChainId) -> Self {
        Self { tx, chain_id }
    }
}

impl<TX> RewindProvider<'_, TX>
where
    TX: DbTxMut + DbTx,
{
    /// Deletes every record above `from_block` and clamps intervals to end at it.
    pub(crate) fn rewind_to(&self, from_block: u64) -> Result<RewindSummary, StorageError> {
        info!(
            target: "chainsync::storage",
            chain_id = %self.chain_id,
            from_block,
            "Starting rewind of realtime data"
        );

        let mut summary = RewindSummary::default();
        if let Some(first_removed) = from_block.checked_add(1) {
            summary.blocks = self.delete_blocks(first_removed)?;
            summary.transactions = self.delete_transactions(first_removed)?;
            summary.logs = self.delete_logs(first_removed)?;
            summary.request_results = self.delete_request_results(first_removed)?;
        }
        summary.intervals = IntervalProvider::<_, LogFilterFragment>::new(self.tx, self.chain_id)
            .rewind(from_block)?;
        summary.intervals += IntervalProvider::<_, FactoryFragment>::new(self.tx, self.chain_id)
            .rewind(from_block)?;

        info!(
            target: "chainsync::storage",
            chain_id = %self.chain_id,
            from_block,
            blocks = summary.blocks,
            transactions = summary.transactions,
            logs = summary.logs,
            request_results = summary.request_results,
            intervals = summary.intervals,
            "Rewind completed successfully"
        );
        Ok(summary)
    }

    fn delete_blocks(&self, first_removed: u64) -> Result<usize, StorageError> {
        let mut timeline = Vec::new();
        {
            let mut cursor = self.tx.cursor_write::<Blocks>()?;
            let mut walker = cursor.walk(Some(BlockKey::first_at(self.chain_id, first_removed)))?;
            while let Some(row) = walker.next() {
                let (key, entry) = row?;
                if key.chain_id != self.chain_id {
                    break;
                }
                trace!(
                    target: "chainsync::storage",
                    chain_id = %self.chain_id,
                    block_number = key.number,
                    block_hash = %key.hash,
                    "Removing block"
                );
                walker.delete_current()?;
                timeline.push(TimelineKey {
                    timestamp: entry.0.timestamp,
                    chain_id: key.chain_id,
                    number: key.number,
                    hash: key.hash,
                });
            }
        }

        for key in &timeline {
            self.tx.delete::<BlockTimeline>(*key, None)?;
        }
        Ok(timeline.len())
    }

    fn delete_transactions(&self, first_removed: u64) -> Result<usize, StorageError> {
        let start = TransactionKey {
            chain_id: self.chain_id,
            block_number: first_removed,
            hash: B256::ZERO,
        };
        let mut cursor = self.tx.cursor_write::<Transactions>()?;
        let mut walker = cursor.walk(Some(start))?;
        let mut removed = 0;
        while let Some(row) = walker.next() {
            let (key, _) = row?;
            if key.chain_id != self.chain_id {
                break;
            }
            walker.delete_current()?;
            removed += 1;
        }
        Ok(removed)
    }

    fn delete_logs(&self, first_removed: u64) -> Result<usize, StorageError> {
        let start = LogKey {
            chain_id: self.chain_id,
            block_number: first_removed,
            block_hash: B256::ZERO,
            log_index: 0,
        };
        let mut index_keys = Vec::new();
        {
            let mut cursor = self.tx.cursor_write::<Logs>()?;
            let mut walker = cursor.walk(Some(start))?;
            while let Some(row) = walker.next() {
                let (key, entry) = row?;
                if key.chain_id != self.chain_id {
                    break;
                }
                walker.delete_current()?;
                index_keys.push(AddressLogKey {
                    chain_id: key.chain_id,
                    address: entry.0.address,
                    block_number: key.block_number,
                    log_index: key.log_index,
                    block_hash: key.block_hash,
                });
            }
        }

        for key in &index_keys {
            self.tx.delete::<AddressLogs>(*key, None)?;
        }
        Ok(index_keys.len())
    }

    fn delete_request_results(&self, first_removed: u64) -> Result<usize, StorageError> {
        let mut cursor = self.tx.cursor_write::<RequestResults>()?;
        let mut walker = cursor.walk(Some(RequestKey::first_at(self.chain_id, first_removed)))?;
        let mut removed = 0;
        while let Some(row) = walker.next() {
            let (key, _) = row?;
            if key.chain_id != self.chain_id {
                break;
            }
            walker.delete_current()?;
            removed += 1;
        }
        Ok(removed)
    }
}
