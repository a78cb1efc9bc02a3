//! Decoded event logs.

use alloy_primitives::{Address, B256, Bytes};
use core::fmt;
use serde::{Deserialize, Serialize};

/// Identity of a log: the including block hash and the log's index in that block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct LogId {
    /// Hash of the including block.
    pub block_hash: B256,
    /// Index of the log within the block.
    pub log_index: u32,
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:#x}", self.block_hash, self.log_index)
    }
}

/// An event log as delivered by the network client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// Emitting contract.
    pub address: Address,
    /// Topic slots; slot 0 is the event selector.
    pub topics: [Option<B256>; 4],
    /// Non-indexed payload.
    pub data: Bytes,
    /// Hash of the including block.
    pub block_hash: B256,
    /// Number of the including block.
    #[serde(with = "alloy_serde::quantity")]
    pub block_number: u64,
    /// Index of the log within the block.
    #[serde(with = "alloy_serde::quantity")]
    pub log_index: u32,
    /// Hash of the emitting transaction, if known.
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    /// Index of the emitting transaction, if known.
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub transaction_index: Option<u32>,
}

impl Log {
    /// Returns the log's identity.
    pub const fn id(&self) -> LogId {
        LogId { block_hash: self.block_hash, log_index: self.log_index }
    }

    /// Returns the event selector (topic 0), if any.
    pub const fn selector(&self) -> Option<B256> {
        self.topics[0]
    }

    /// Returns the populated topics, slot 0 first. Slots after the first empty one are dropped.
    pub fn populated_topics(&self) -> Vec<B256> {
        self.topics.iter().map_while(|topic| *topic).collect()
    }

    /// Builds the topic slots from an RPC-style topic list. Extra topics are ignored.
    pub fn topics_from_slice(topics: &[B256]) -> [Option<B256>; 4] {
        let mut slots = [None; 4];
        for (slot, topic) in slots.iter_mut().zip(topics) {
            *slot = Some(*topic);
        }
        slots
    }
}
