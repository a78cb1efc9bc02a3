//! Decoded block headers.

use alloy_primitives::{Address, B64, B256, Bloom, Bytes, U256};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A block header as delivered by the network client.
#[derive(Debug, Clone, Display, PartialEq, Eq, Default, Serialize, Deserialize)]
#[display("number: {number}, hash: {hash}, parent_hash: {parent_hash}, timestamp: {timestamp}")]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block hash.
    pub hash: B256,
    /// Block height.
    #[serde(with = "alloy_serde::quantity")]
    pub number: u64,
    /// Hash of the parent block.
    pub parent_hash: B256,
    /// Block timestamp, seconds since the Unix epoch.
    #[serde(with = "alloy_serde::quantity")]
    pub timestamp: u64,
    /// Fee recipient.
    pub miner: Address,
    /// Gas limit.
    pub gas_limit: U256,
    /// Gas used by all transactions.
    pub gas_used: U256,
    /// Base fee, absent before London.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
    /// Difficulty.
    pub difficulty: U256,
    /// Total difficulty, not reported by every client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_difficulty: Option<U256>,
    /// Encoded block size in bytes.
    pub size: U256,
    /// Extra data.
    pub extra_data: Bytes,
    /// Bloom filter of the block's logs.
    pub logs_bloom: Bloom,
    /// Mix hash.
    pub mix_hash: B256,
    /// Proof-of-work nonce.
    pub nonce: B64,
    /// Receipts trie root.
    pub receipts_root: B256,
    /// Ommers hash.
    pub sha3_uncles: B256,
    /// State trie root.
    pub state_root: B256,
    /// Transactions trie root.
    pub transactions_root: B256,
}

impl Block {
    /// Returns `true` if `self` is the parent of `child`.
    pub fn is_parent_of(&self, child: &Self) -> bool {
        self.number + 1 == child.number && self.hash == child.parent_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_rpc_block() {
        let json = r#"{
            "hash": "0x0000000000000000000000000000000000000000000000000000000000000010",
            "number": "0x64",
            "parentHash": "0x0000000000000000000000000000000000000000000000000000000000000009",
            "timestamp": "0x3e8",
            "miner": "0x0000000000000000000000000000000000000001",
            "gasLimit": "0x1c9c380",
            "gasUsed": "0x5208",
            "baseFeePerGas": "0x7",
            "difficulty": "0x0",
            "size": "0x220",
            "extraData": "0x",
            "logsBloom": "0x00000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000",
            "mixHash": "0x0000000000000000000000000000000000000000000000000000000000000000",
            "nonce": "0x0000000000000000",
            "receiptsRoot": "0x0000000000000000000000000000000000000000000000000000000000000000",
            "sha3Uncles": "0x0000000000000000000000000000000000000000000000000000000000000000",
            "stateRoot": "0x0000000000000000000000000000000000000000000000000000000000000000",
            "transactionsRoot": "0x0000000000000000000000000000000000000000000000000000000000000000"
        }"#;

        let block: Block = serde_json::from_str(json).expect("valid block");
        assert_eq!(block.number, 100);
        assert_eq!(block.timestamp, 1000);
        assert_eq!(block.base_fee_per_gas, Some(U256::from(7)));
        assert_eq!(block.total_difficulty, None);
        assert_eq!(block.gas_used, U256::from(21_000));
    }

    #[test]
    fn test_is_parent_of() {
        let parent = Block { number: 1, hash: B256::repeat_byte(1), ..Default::default() };
        let child = Block { number: 2, parent_hash: B256::repeat_byte(1), ..Default::default() };
        assert!(parent.is_parent_of(&child));
        assert!(!child.is_parent_of(&parent));
    }
}
