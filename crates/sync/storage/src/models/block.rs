//! Models for storing block headers in the database.
//!
//! Full headers live in [`crate::models::Blocks`]; a small [`BlockRef`] is duplicated into the
//! [`crate::models::BlockTimeline`] index so the event stream can walk blocks in global time
//! order without decoding full headers.

use super::common::{
    get_address, get_b256, get_bytes, get_option, get_u256, put_address, put_b256, put_bytes,
    put_option, put_u256,
};
use alloy_primitives::{B64, B256, Bloom, Bytes};
use bytes::{Buf, BufMut};
use chainsync_types::Block;
use derive_more::Display;
use reth_codecs::Compact;
use serde::{Deserialize, Serialize};

/// Metadata reference for a single block.
///
/// This is the value stored in the [`crate::models::BlockTimeline`] table.
#[derive(Debug, Clone, Display, PartialEq, Eq, Default, Serialize, Deserialize, Compact)]
#[display("number: {number}, hash: {hash}, parent_hash: {parent_hash}, timestamp: {timestamp}")]
pub struct BlockRef {
    /// The height of the block.
    pub number: u64,
    /// The hash of the block itself.
    pub hash: B256,
    /// The hash of the parent block.
    pub parent_hash: B256,
    /// The timestamp of the block (seconds since Unix epoch).
    pub timestamp: u64,
}

impl From<&Block> for BlockRef {
    fn from(block: &Block) -> Self {
        Self {
            number: block.number,
            hash: block.hash,
            parent_hash: block.parent_hash,
            timestamp: block.timestamp,
        }
    }
}

/// Full block header as stored in [`crate::models::Blocks`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockEntry(pub Block);

/// Compact encoding for [`BlockEntry`].
///
/// ## Encoding Layout (ordered):
/// - `hash`, `number: u64`, `parent_hash`, `timestamp: u64`, `miner`
/// - `gas_limit`, `gas_used` as 32-byte words
/// - `base_fee_per_gas: Option<U256>`, `difficulty`, `total_difficulty: Option<U256>`, `size`
/// - `extra_data` length-prefixed, `logs_bloom` 256 bytes, `mix_hash`, `nonce` 8 bytes
/// - `receipts_root`, `sha3_uncles`, `state_root`, `transactions_root`
impl Compact for BlockEntry {
    fn to_compact<B>(&self, buf: &mut B) -> usize
    where
        B: BufMut + AsMut<[u8]>,
    {
        let start_len = buf.remaining_mut();
        let block = &self.0;

        put_b256(buf, &block.hash);
        buf.put_u64(block.number);
        put_b256(buf, &block.parent_hash);
        buf.put_u64(block.timestamp);
        put_address(buf, &block.miner);
        put_u256(buf, &block.gas_limit);
        put_u256(buf, &block.gas_used);
        put_option(buf, block.base_fee_per_gas.as_ref(), put_u256);
        put_u256(buf, &block.difficulty);
        put_option(buf, block.total_difficulty.as_ref(), put_u256);
        put_u256(buf, &block.size);
        put_bytes(buf, &block.extra_data);
        buf.put_slice(block.logs_bloom.as_slice());
        put_b256(buf, &block.mix_hash);
        buf.put_slice(block.nonce.as_slice());
        put_b256(buf, &block.receipts_root);
        put_b256(buf, &block.sha3_uncles);
        put_b256(buf, &block.state_root);
        put_b256(buf, &block.transactions_root);

        start_len - buf.remaining_mut()
    }

    fn from_compact(mut buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let hash = get_b256(&mut buf);
        let number = buf.get_u64();
        let parent_hash = get_b256(&mut buf);
        let timestamp = buf.get_u64();
        let miner = get_address(&mut buf);
        let gas_limit = get_u256(&mut buf);
        let gas_used = get_u256(&mut buf);
        let base_fee_per_gas = get_option(&mut buf, get_u256);
        let difficulty = get_u256(&mut buf);
        let total_difficulty = get_option(&mut buf, get_u256);
        let size = get_u256(&mut buf);
        let extra_data = Bytes::from(get_bytes(&mut buf));

        assert!(buf.len() >= 256 + 32 + 8, "BlockEntry::from_compact: buffer too small");
        let logs_bloom = Bloom::from_slice(&buf[..256]);
        buf.advance(256);
        let mix_hash = get_b256(&mut buf);
        let nonce = B64::from_slice(&buf[..8]);
        buf.advance(8);

        let receipts_root = get_b256(&mut buf);
        let sha3_uncles = get_b256(&mut buf);
        let state_root = get_b256(&mut buf);
        let transactions_root = get_b256(&mut buf);

        let block = Block {
            hash,
            number,
            parent_hash,
            timestamp,
            miner,
            gas_limit,
            gas_used,
            base_fee_per_gas,
            difficulty,
            total_difficulty,
            size,
            extra_data,
            logs_bloom,
            mix_hash,
            nonce,
            receipts_root,
            sha3_uncles,
            state_root,
            transactions_root,
        };
        (Self(block), buf)
    }
}

impl From<BlockEntry> for Block {
    fn from(entry: BlockEntry) -> Self {
        entry.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    fn sample_block() -> Block {
        Block {
            hash: B256::repeat_byte(1),
            number: 42,
            parent_hash: B256::repeat_byte(2),
            timestamp: 1_700_000_000,
            miner: Address::repeat_byte(3),
            gas_limit: U256::from(30_000_000u64),
            gas_used: U256::from(21_000u64),
            base_fee_per_gas: Some(U256::from(7)),
            difficulty: U256::ZERO,
            total_difficulty: None,
            size: U256::from(1024),
            extra_data: Bytes::from_static(b"chainsync"),
            logs_bloom: Bloom::repeat_byte(0x80),
            mix_hash: B256::repeat_byte(4),
            nonce: B64::repeat_byte(5),
            receipts_root: B256::repeat_byte(6),
            sha3_uncles: B256::repeat_byte(7),
            state_root: B256::repeat_byte(8),
            transactions_root: B256::repeat_byte(9),
        }
    }

    #[test]
    fn test_block_entry_compact_roundtrip() {
        let original = BlockEntry(sample_block());

        let mut buffer = Vec::new();
        let bytes_written = original.to_compact(&mut buffer);
        assert_eq!(bytes_written, buffer.len(), "Bytes written should match buffer length");

        let (decoded, remaining_buf) = BlockEntry::from_compact(&buffer, bytes_written);
        assert_eq!(original, decoded);
        assert!(remaining_buf.is_empty(), "Remaining buffer should be empty after deserialization");
    }

    #[test]
    fn test_block_ref_from_block() {
        let block = sample_block();
        let block_ref = BlockRef::from(&block);
        assert_eq!(block_ref.number, 42);
        assert_eq!(block_ref.hash, block.hash);
        assert_eq!(block_ref.parent_hash, block.parent_hash);
        assert_eq!(block_ref.timestamp, block.timestamp);
    }
}
