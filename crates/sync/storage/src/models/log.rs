//! Models for storing event logs in the database.
//!
//! Logs are keyed by `(chain, block number, block hash, log index)` in
//! [`crate::models::Logs`]. A secondary [`crate::models::AddressLogs`] index keyed by emitting
//! address stores only the log's selector, which is enough to resolve factory child addresses
//! without decoding unrelated logs.

use super::common::{
    get_address, get_b256, get_bytes, get_option, put_address, put_b256, put_bytes, put_option,
};
use alloy_primitives::{B256, Bytes};
use bytes::{Buf, BufMut};
use chainsync_types::Log;
use derive_more::{Deref, From};
use reth_codecs::Compact;
use serde::{Deserialize, Serialize};

/// Log row as stored in [`crate::models::Logs`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Deref, From, Serialize, Deserialize)]
pub struct LogEntry(pub Log);

/// Compact encoding for [`LogEntry`].
///
/// ## Encoding Layout (ordered):
/// - `address`
/// - `topics` – four presence-prefixed 32-byte words
/// - `data` – length-prefixed
/// - `block_hash`, `block_number: u64`, `log_index: u32`
/// - `transaction_hash: Option<B256>`, `transaction_index: Option<u32>`
impl Compact for LogEntry {
    fn to_compact<B>(&self, buf: &mut B) -> usize
    where
        B: BufMut + AsMut<[u8]>,
    {
        let start_len = buf.remaining_mut();
        let log = &self.0;

        put_address(buf, &log.address);
        for topic in &log.topics {
            put_option(buf, topic.as_ref(), put_b256);
        }
        put_bytes(buf, &log.data);
        put_b256(buf, &log.block_hash);
        buf.put_u64(log.block_number);
        buf.put_u32(log.log_index);
        put_option(buf, log.transaction_hash.as_ref(), put_b256);
        put_option(buf, log.transaction_index.as_ref(), |buf, index| buf.put_u32(*index));

        start_len - buf.remaining_mut()
    }

    fn from_compact(mut buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let address = get_address(&mut buf);
        let mut topics = [None; 4];
        for topic in &mut topics {
            *topic = get_option(&mut buf, get_b256);
        }
        let data = Bytes::from(get_bytes(&mut buf));
        let block_hash = get_b256(&mut buf);
        let block_number = buf.get_u64();
        let log_index = buf.get_u32();
        let transaction_hash = get_option(&mut buf, get_b256);
        let transaction_index = get_option(&mut buf, |buf| buf.get_u32());

        let log = Log {
            address,
            topics,
            data,
            block_hash,
            block_number,
            log_index,
            transaction_hash,
            transaction_index,
        };
        (Self(log), buf)
    }
}

impl From<LogEntry> for Log {
    fn from(entry: LogEntry) -> Self {
        entry.0
    }
}

/// Value of the [`crate::models::AddressLogs`] index: topic 0 of the referenced log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deref, From, Serialize, Deserialize)]
pub struct SelectorEntry(pub Option<B256>);

impl Compact for SelectorEntry {
    fn to_compact<B>(&self, buf: &mut B) -> usize
    where
        B: BufMut + AsMut<[u8]>,
    {
        let start_len = buf.remaining_mut();
        put_option(buf, self.0.as_ref(), put_b256);
        start_len - buf.remaining_mut()
    }

    fn from_compact(mut buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let selector = get_option(&mut buf, get_b256);
        (Self(selector), buf)
    }
}
