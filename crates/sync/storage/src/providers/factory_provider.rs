//! Resolution of factory child addresses.
//!
//! Children are discovered from the parent contract's creation logs, found through the
//! [`AddressLogs`] index: a prefix walk over `(chain, parent address)` yields the parent's logs in
//! `(block number, log index)` order together with their selector, and only the creation logs are
//! loaded from [`crate::models::Logs`] to read the child address.

use crate::{
    error::StorageError,
    models::{AddressLogKey, AddressLogs},
    providers::RecordProvider,
};
use alloy_primitives::{Address, ChainId, map::HashSet};
use chainsync_types::{FactoryCriteria, Log};
use reth_db_api::{cursor::DbCursorRO, transaction::DbTx};
use tracing::{debug, error};

/// Position from which a child-address scan resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ChildAddressCursor {
    /// First block to scan.
    pub(crate) block_number: u64,
    /// First log index to scan within `block_number`.
    pub(crate) log_index: u32,
}

/// One page of resolved child addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChildAddressBatch {
    /// Child addresses in creation-log order.
    pub(crate) addresses: Vec<Address>,
    /// Where the next page resumes, or `None` if the scan is exhausted.
    pub(crate) next: Option<ChildAddressCursor>,
}

/// A child-address reader that wraps a transactional reference to the MDBX backend.
#[derive(Debug)]
pub(crate) struct FactoryProvider<'tx, TX> {
    tx: &'tx TX,
    chain_id: ChainId,
}

impl<'tx, TX> FactoryProvider<'tx, TX> {
    pub(crate) const fn new(tx: &'tx TX, chain_id: ChainId) -> Self {
        Self { tx, chain_id }
    }
}

impl<TX> FactoryProvider<'_, TX>
where
    TX: DbTx,
{
    /// Reads up to `page_size` child addresses created at or after `from`, up to `up_to_block`.
    ///
    /// The next cursor restarts at the first log of the last block seen, so a block whose
    /// creation logs straddle the page boundary is scanned again. If the whole page came from a
    /// single block the cursor moves past the last log instead, which keeps the scan advancing.
    pub(crate) fn child_address_batch(
        &self,
        factory: &FactoryCriteria,
        from: ChildAddressCursor,
        up_to_block: u64,
        page_size: usize,
    ) -> Result<ChildAddressBatch, StorageError> {
        debug!(
            target: "chainsync::storage",
            chain_id = %self.chain_id,
            factory = %factory.address,
            from_block = from.block_number,
            up_to_block,
            page_size,
            "Fetching factory child addresses"
        );

        let mut addresses = Vec::with_capacity(page_size);
        let mut first_block = None;
        let mut last = None;

        let mut cursor = self.tx.cursor_read::<AddressLogs>().inspect_err(|err| {
            error!(
                target: "chainsync::storage",
                chain_id = %self.chain_id,
                %err,
                "Failed to get cursor for AddressLogs"
            );
        })?;
        let start = AddressLogKey::first_at(
            self.chain_id,
            factory.address,
            from.block_number,
            from.log_index,
        );

        for row in cursor.walk(Some(start))? {
            if addresses.len() >= page_size {
                break;
            }
            let (key, selector) = row?;
            if key.chain_id != self.chain_id ||
                key.address != factory.address ||
                key.block_number > up_to_block
            {
                break;
            }
            if *selector != Some(factory.event_selector) {
                continue;
            }

            addresses.push(self.child_address(factory, &key)?);
            first_block.get_or_insert(key.block_number);
            last = Some((key.block_number, key.log_index));
        }

        let next = match last {
            Some((block_number, log_index)) if addresses.len() == page_size => {
                if first_block != Some(block_number) {
                    Some(ChildAddressCursor { block_number, log_index: 0 })
                } else if let Some(log_index) = log_index.checked_add(1) {
                    Some(ChildAddressCursor { block_number, log_index })
                } else {
                    block_number
                        .checked_add(1)
                        .map(|block_number| ChildAddressCursor { block_number, log_index: 0 })
                }
            }
            _ => None,
        };

        Ok(ChildAddressBatch { addresses, next })
    }

    /// Returns every child address created up to `up_to_block`, without duplicates.
    pub(crate) fn all_child_addresses(
        &self,
        factory: &FactoryCriteria,
        up_to_block: u64,
    ) -> Result<HashSet<Address>, StorageError> {
        let mut children = HashSet::default();
        let mut cursor = self.tx.cursor_read::<AddressLogs>()?;
        let start = AddressLogKey::first_at(self.chain_id, factory.address, 0, 0);
        for row in cursor.walk(Some(start))? {
            let (key, selector) = row?;
            if key.chain_id != self.chain_id ||
                key.address != factory.address ||
                key.block_number > up_to_block
            {
                break;
            }
            if *selector == Some(factory.event_selector) {
                children.insert(self.child_address(factory, &key)?);
            }
        }
        Ok(children)
    }

    fn child_address(
        &self,
        factory: &FactoryCriteria,
        key: &AddressLogKey,
    ) -> Result<Address, StorageError> {
        let log = RecordProvider::new(self.tx, self.chain_id)
            .get_log(key.log_key())?
            .ok_or_else(|| self.extraction_error(key, "log row is missing".to_string()))?;
        extract_child_address(self.chain_id, factory, &log)
    }

    fn extraction_error(&self, key: &AddressLogKey, reason: String) -> StorageError {
        StorageError::ChildAddressExtraction {
            chain_id: self.chain_id,
            block_hash: key.block_hash,
            log_index: key.log_index,
            reason,
        }
    }
}

/// Reads the child address out of a creation log.
pub(crate) fn extract_child_address(
    chain_id: ChainId,
    factory: &FactoryCriteria,
    log: &Log,
) -> Result<Address, StorageError> {
    factory.child_address_location.extract(&log.topics, &log.data).map_err(|err| {
        error!(
            target: "chainsync::storage",
            chain_id,
            log_id = %log.id(),
            location = %factory.child_address_location,
            %err,
            "Failed to extract child address"
        );
        StorageError::ChildAddressExtraction {
            chain_id,
            block_hash: log.block_hash,
            log_index: log.log_index,
            reason: err.to_string(),
        }
    })
}
