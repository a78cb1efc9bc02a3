//! Reth's MDBX-backed provider for raw chain records.
//!
//! [`RecordProvider`] persists the blocks, transactions and logs fetched from a node and the
//! remote request cache. Chain records are insert-if-absent: a row that already exists is left
//! untouched, so re-ingesting a range is a no-op. Request results are overwritten.
//!
//! Every log is written twice: once into [`Logs`] and once into the [`AddressLogs`] index used
//! by factory child-address resolution.

use crate::{
    error::StorageError,
    models::{
        AddressLogKey, AddressLogs, BlockEntry, BlockKey, BlockTimeline, Blocks, LogEntry, LogKey,
        Logs, RequestKey, RequestResultEntry, RequestResults, SelectorEntry, TimelineKey,
        TransactionEntry, TransactionKey, Transactions,
    },
};
use alloy_eips::BlockNumHash;
use alloy_primitives::{B256, ChainId};
use chainsync_types::{Block, Log, Transaction};
use reth_db_api::{
    cursor::DbCursorRO,
    transaction::{DbTx, DbTxMut},
};
use tracing::{debug, error, trace};

/// A record storage that wraps a transactional reference to the MDBX backend.
#[derive(Debug)]
pub(crate) struct RecordProvider<'tx, TX> {
    tx: &'tx TX,
    chain_id: ChainId,
}

impl<'tx, TX> RecordProvider<'tx, TX> {
    pub(crate) const fn new(tx: &'tx TX, chain_id: ChainId) -> Self {
        Self { tx, chain_id }
    }
}

impl<TX> RecordProvider<'_, TX>
where
    TX: DbTxMut + DbTx,
{
    /// Stores a block and its timeline entry unless it is already present.
    pub(crate) fn insert_block(&self, block: &Block) -> Result<(), StorageError> {
        let key = BlockKey { chain_id: self.chain_id, number: block.number, hash: block.hash };

        if self.tx.get::<Blocks>(key)?.is_some() {
            trace!(
                target: "chainsync::storage",
                chain_id = %self.chain_id,
                block_number = block.number,
                block_hash = %block.hash,
                "Block already stored"
            );
            return Ok(());
        }

        debug!(
            target: "chainsync::storage",
            chain_id = %self.chain_id,
            block_number = block.number,
            block_hash = %block.hash,
            "Storing block"
        );

        self.tx.put::<Blocks>(key, BlockEntry(block.clone())).inspect_err(|err| {
            error!(
                target: "chainsync::storage",
                chain_id = %self.chain_id,
                block_number = block.number,
                %err,
                "Failed to insert block"
            );
        })?;

        let timeline_key = TimelineKey {
            timestamp: block.timestamp,
            chain_id: self.chain_id,
            number: block.number,
            hash: block.hash,
        };
        self.tx.put::<BlockTimeline>(timeline_key, block.into()).inspect_err(|err| {
            error!(
                target: "chainsync::storage",
                chain_id = %self.chain_id,
                block_number = block.number,
                %err,
                "Failed to insert block timeline entry"
            );
        })?;
        Ok(())
    }

    /// Stores transactions, skipping those already present.
    pub(crate) fn insert_transactions(
        &self,
        transactions: &[Transaction],
    ) -> Result<(), StorageError> {
        for transaction in transactions {
            let key = TransactionKey {
                chain_id: self.chain_id,
                block_number: transaction.block_number,
                hash: transaction.hash,
            };
            if self.tx.get::<Transactions>(key)?.is_some() {
                continue;
            }
            self.tx.put::<Transactions>(key, TransactionEntry::from(transaction)).inspect_err(
                |err| {
                    error!(
                        target: "chainsync::storage",
                        chain_id = %self.chain_id,
                        transaction_hash = %transaction.hash,
                        %err,
                        "Failed to insert transaction"
                    );
                },
            )?;
        }
        Ok(())
    }

    /// Stores logs and their address index entries, skipping those already present.
    pub(crate) fn insert_logs(&self, logs: &[Log]) -> Result<(), StorageError> {
        for log in logs {
            let key = LogKey {
                chain_id: self.chain_id,
                block_number: log.block_number,
                block_hash: log.block_hash,
                log_index: log.log_index,
            };
            if self.tx.get::<Logs>(key)?.is_some() {
                continue;
            }

            self.tx.put::<Logs>(key, LogEntry(log.clone())).inspect_err(|err| {
                error!(
                    target: "chainsync::storage",
                    chain_id = %self.chain_id,
                    log_id = %log.id(),
                    %err,
                    "Failed to insert log"
                );
            })?;

            let index_key = AddressLogKey {
                chain_id: self.chain_id,
                address: log.address,
                block_number: log.block_number,
                log_index: log.log_index,
                block_hash: log.block_hash,
            };
            self.tx.put::<AddressLogs>(index_key, SelectorEntry(log.selector())).inspect_err(
                |err| {
                    error!(
                        target: "chainsync::storage",
                        chain_id = %self.chain_id,
                        log_id = %log.id(),
                        %err,
                        "Failed to insert address index entry"
                    );
                },
            )?;
        }
        Ok(())
    }

    /// Stores a block with its transactions and logs.
    pub(crate) fn insert_block_records(
        &self,
        block: &Block,
        transactions: &[Transaction],
        logs: &[Log],
    ) -> Result<(), StorageError> {
        self.insert_block(block)?;
        self.insert_transactions(transactions)?;
        self.insert_logs(logs)
    }

    /// Stores a request result, replacing any previous one.
    pub(crate) fn upsert_request_result(
        &self,
        request: &str,
        block_number: u64,
        result: &str,
    ) -> Result<(), StorageError> {
        let key = RequestKey::new(self.chain_id, block_number, request);
        let entry =
            RequestResultEntry { request: request.to_string(), result: result.to_string() };
        self.tx
            .put::<RequestResults>(key, entry)
            .inspect_err(|err| {
                error!(
                    target: "chainsync::storage",
                    chain_id = %self.chain_id,
                    block_number,
                    %err,
                    "Failed to insert request result"
                );
            })?;
        Ok(())
    }
}

impl<TX> RecordProvider<'_, TX>
where
    TX: DbTx,
{
    pub(crate) fn get_block(&self, block: BlockNumHash) -> Result<Option<Block>, StorageError> {
        debug!(
            target: "chainsync::storage",
            chain_id = %self.chain_id,
            block_number = block.number,
            block_hash = %block.hash,
            "Fetching block"
        );

        let key = BlockKey { chain_id: self.chain_id, number: block.number, hash: block.hash };
        let entry = self.tx.get::<Blocks>(key).inspect_err(|err| {
            error!(
                target: "chainsync::storage",
                chain_id = %self.chain_id,
                block_number = block.number,
                %err,
                "Failed to read block"
            );
        })?;
        Ok(entry.map(Block::from))
    }

    pub(crate) fn get_transaction(
        &self,
        block_number: u64,
        hash: B256,
    ) -> Result<Option<Transaction>, StorageError> {
        let key = TransactionKey { chain_id: self.chain_id, block_number, hash };
        let entry = self.tx.get::<Transactions>(key).inspect_err(|err| {
            error!(
                target: "chainsync::storage",
                chain_id = %self.chain_id,
                block_number,
                transaction_hash = %hash,
                %err,
                "Failed to read transaction"
            );
        })?;
        Ok(entry.map(Transaction::from))
    }

    pub(crate) fn get_log(&self, key: LogKey) -> Result<Option<Log>, StorageError> {
        Ok(self.tx.get::<Logs>(key)?.map(Log::from))
    }

    /// Returns the logs of a block ordered by log index.
    pub(crate) fn get_logs(&self, block: BlockNumHash) -> Result<Vec<Log>, StorageError> {
        debug!(
            target: "chainsync::storage",
            chain_id = %self.chain_id,
            block_number = block.number,
            "Fetching logs"
        );

        let mut cursor = self.tx.cursor_read::<Logs>().inspect_err(|err| {
            error!(
                target: "chainsync::storage",
                chain_id = %self.chain_id,
                %err,
                "Failed to get cursor for Logs"
            );
        })?;

        let start = LogKey {
            chain_id: self.chain_id,
            block_number: block.number,
            block_hash: block.hash,
            log_index: 0,
        };
        let mut logs = Vec::new();
        for row in cursor.walk(Some(start))? {
            let (key, entry) = row.inspect_err(|err| {
                error!(
                    target: "chainsync::storage",
                    chain_id = %self.chain_id,
                    block_number = block.number,
                    %err,
                    "Failed to read log entry"
                );
            })?;
            if key.chain_id != self.chain_id ||
                key.block_number != block.number ||
                key.block_hash != block.hash
            {
                break;
            }
            logs.push(entry.into());
        }
        Ok(logs)
    }

    pub(crate) fn get_request_result(
        &self,
        request: &str,
        block_number: u64,
    ) -> Result<Option<String>, StorageError> {
        let key = RequestKey::new(self.chain_id, block_number, request);
        let entry = self.tx.get::<RequestResults>(key).inspect_err(|err| {
            error!(
                target: "chainsync::storage",
                chain_id = %self.chain_id,
                block_number,
                %err,
                "Failed to read request result"
            );
        })?;
        Ok(entry.filter(|entry| entry.request == request).map(|entry| entry.result))
    }
}
