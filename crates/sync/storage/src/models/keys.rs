//! Composite table keys.
//!
//! Every key is encoded as the big-endian concatenation of its fields in declaration order, so
//! the byte order MDBX sorts by equals the tuple order of the fields. All keys lead with the
//! fields a range scan filters on (chain id first, except for the cross-chain timeline).

use alloy_primitives::{Address, B256, ChainId, keccak256};
use chainsync_types::FragmentId;
use reth_db::DatabaseError;
use reth_db_api::table::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Sequential reader over an encoded key.
struct KeyReader<'a>(&'a [u8]);

impl<'a> KeyReader<'a> {
    fn exact(value: &'a [u8], len: usize) -> Result<Self, DatabaseError> {
        if value.len() != len {
            return Err(DatabaseError::Decode);
        }
        Ok(Self(value))
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.0[..N]);
        self.0 = &self.0[N..];
        out
    }

    fn u64(&mut self) -> u64 {
        u64::from_be_bytes(self.take())
    }

    fn u32(&mut self) -> u32 {
        u32::from_be_bytes(self.take())
    }

    fn b256(&mut self) -> B256 {
        B256::from(self.take::<32>())
    }

    fn address(&mut self) -> Address {
        Address::from(self.take::<20>())
    }
}

/// Key of the `Blocks` table: `(chain, number, hash)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockKey {
    /// Chain id.
    pub chain_id: ChainId,
    /// Block number.
    pub number: u64,
    /// Block hash.
    pub hash: B256,
}

impl BlockKey {
    /// Smallest key of `chain_id` at or above `number`.
    pub const fn first_at(chain_id: ChainId, number: u64) -> Self {
        Self { chain_id, number, hash: B256::ZERO }
    }
}

impl Encode for BlockKey {
    type Encoded = [u8; 48];

    fn encode(self) -> Self::Encoded {
        let mut out = [0u8; 48];
        out[..8].copy_from_slice(&self.chain_id.to_be_bytes());
        out[8..16].copy_from_slice(&self.number.to_be_bytes());
        out[16..].copy_from_slice(self.hash.as_slice());
        out
    }
}

impl Decode for BlockKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        let mut reader = KeyReader::exact(value, 48)?;
        Ok(Self { chain_id: reader.u64(), number: reader.u64(), hash: reader.b256() })
    }
}

/// Key of the `BlockTimeline` table: `(timestamp, chain, number, hash)`.
///
/// This is the global event order, so a forward walk visits blocks of all chains interleaved by
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimelineKey {
    /// Block timestamp.
    pub timestamp: u64,
    /// Chain id.
    pub chain_id: ChainId,
    /// Block number.
    pub number: u64,
    /// Block hash.
    pub hash: B256,
}

impl TimelineKey {
    /// Smallest key at `timestamp`.
    pub const fn first_at(timestamp: u64) -> Self {
        Self { timestamp, chain_id: 0, number: 0, hash: B256::ZERO }
    }
}

impl Encode for TimelineKey {
    type Encoded = [u8; 56];

    fn encode(self) -> Self::Encoded {
        let mut out = [0u8; 56];
        out[..8].copy_from_slice(&self.timestamp.to_be_bytes());
        out[8..16].copy_from_slice(&self.chain_id.to_be_bytes());
        out[16..24].copy_from_slice(&self.number.to_be_bytes());
        out[24..].copy_from_slice(self.hash.as_slice());
        out
    }
}

impl Decode for TimelineKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        let mut reader = KeyReader::exact(value, 56)?;
        Ok(Self {
            timestamp: reader.u64(),
            chain_id: reader.u64(),
            number: reader.u64(),
            hash: reader.b256(),
        })
    }
}

/// Key of the `Transactions` table: `(chain, block number, hash)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionKey {
    /// Chain id.
    pub chain_id: ChainId,
    /// Number of the including block.
    pub block_number: u64,
    /// Transaction hash.
    pub hash: B256,
}

impl Encode for TransactionKey {
    type Encoded = [u8; 48];

    fn encode(self) -> Self::Encoded {
        let mut out = [0u8; 48];
        out[..8].copy_from_slice(&self.chain_id.to_be_bytes());
        out[8..16].copy_from_slice(&self.block_number.to_be_bytes());
        out[16..].copy_from_slice(self.hash.as_slice());
        out
    }
}

impl Decode for TransactionKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        let mut reader = KeyReader::exact(value, 48)?;
        Ok(Self { chain_id: reader.u64(), block_number: reader.u64(), hash: reader.b256() })
    }
}

/// Key of the `Logs` table: `(chain, block number, block hash, log index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogKey {
    /// Chain id.
    pub chain_id: ChainId,
    /// Number of the including block.
    pub block_number: u64,
    /// Hash of the including block.
    pub block_hash: B256,
    /// Index of the log within the block.
    pub log_index: u32,
}

impl Encode for LogKey {
    type Encoded = [u8; 52];

    fn encode(self) -> Self::Encoded {
        let mut out = [0u8; 52];
        out[..8].copy_from_slice(&self.chain_id.to_be_bytes());
        out[8..16].copy_from_slice(&self.block_number.to_be_bytes());
        out[16..48].copy_from_slice(self.block_hash.as_slice());
        out[48..].copy_from_slice(&self.log_index.to_be_bytes());
        out
    }
}

impl Decode for LogKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        let mut reader = KeyReader::exact(value, 52)?;
        Ok(Self {
            chain_id: reader.u64(),
            block_number: reader.u64(),
            block_hash: reader.b256(),
            log_index: reader.u32(),
        })
    }
}

/// Key of the `AddressLogs` index: `(chain, address, block number, log index, block hash)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddressLogKey {
    /// Chain id.
    pub chain_id: ChainId,
    /// Emitting address.
    pub address: Address,
    /// Number of the including block.
    pub block_number: u64,
    /// Index of the log within the block.
    pub log_index: u32,
    /// Hash of the including block.
    pub block_hash: B256,
}

impl AddressLogKey {
    /// Smallest key of `address` on `chain_id` at or after `(block_number, log_index)`.
    pub const fn first_at(
        chain_id: ChainId,
        address: Address,
        block_number: u64,
        log_index: u32,
    ) -> Self {
        Self { chain_id, address, block_number, log_index, block_hash: B256::ZERO }
    }

    /// Returns the key of the referenced row in the `Logs` table.
    pub const fn log_key(&self) -> LogKey {
        LogKey {
            chain_id: self.chain_id,
            block_number: self.block_number,
            block_hash: self.block_hash,
            log_index: self.log_index,
        }
    }
}

impl Encode for AddressLogKey {
    type Encoded = [u8; 72];

    fn encode(self) -> Self::Encoded {
        let mut out = [0u8; 72];
        out[..8].copy_from_slice(&self.chain_id.to_be_bytes());
        out[8..28].copy_from_slice(self.address.as_slice());
        out[28..36].copy_from_slice(&self.block_number.to_be_bytes());
        out[36..40].copy_from_slice(&self.log_index.to_be_bytes());
        out[40..].copy_from_slice(self.block_hash.as_slice());
        out
    }
}

impl Decode for AddressLogKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        let mut reader = KeyReader::exact(value, 72)?;
        Ok(Self {
            chain_id: reader.u64(),
            address: reader.address(),
            block_number: reader.u64(),
            log_index: reader.u32(),
            block_hash: reader.b256(),
        })
    }
}

/// Key of the `RequestResults` table: `(chain, block number, keccak256(request))`.
///
/// Request text is unbounded, so the key carries its hash and the text lives in the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    /// Chain id.
    pub chain_id: ChainId,
    /// Block number the request was made at.
    pub block_number: u64,
    /// Hash of the request text.
    pub request_hash: B256,
}

impl RequestKey {
    /// Key of `request` made on `chain_id` at `block_number`.
    pub fn new(chain_id: ChainId, block_number: u64, request: &str) -> Self {
        Self { chain_id, block_number, request_hash: keccak256(request.as_bytes()) }
    }

    /// Smallest key of `chain_id` at or above `block_number`.
    pub const fn first_at(chain_id: ChainId, block_number: u64) -> Self {
        Self { chain_id, block_number, request_hash: B256::ZERO }
    }
}

impl Encode for RequestKey {
    type Encoded = [u8; 48];

    fn encode(self) -> Self::Encoded {
        let mut out = [0u8; 48];
        out[..8].copy_from_slice(&self.chain_id.to_be_bytes());
        out[8..16].copy_from_slice(&self.block_number.to_be_bytes());
        out[16..].copy_from_slice(self.request_hash.as_slice());
        out
    }
}

impl Decode for RequestKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        let mut reader = KeyReader::exact(value, 48)?;
        let chain_id = reader.u64();
        let block_number = reader.u64();
        Ok(Self { chain_id, block_number, request_hash: reader.b256() })
    }
}

/// Key of the fragment tables: `(chain, fragment id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FragmentKey {
    /// Chain id.
    pub chain_id: ChainId,
    /// Fragment id.
    pub id: FragmentId,
}

impl FragmentKey {
    /// Smallest key of `chain_id`.
    pub const fn first_of(chain_id: ChainId) -> Self {
        Self { chain_id, id: FragmentId(B256::ZERO) }
    }
}

impl Encode for FragmentKey {
    type Encoded = [u8; 40];

    fn encode(self) -> Self::Encoded {
        let mut out = [0u8; 40];
        out[..8].copy_from_slice(&self.chain_id.to_be_bytes());
        out[8..].copy_from_slice(self.id.as_slice());
        out
    }
}

impl Decode for FragmentKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        let mut reader = KeyReader::exact(value, 40)?;
        Ok(Self { chain_id: reader.u64(), id: FragmentId(reader.b256()) })
    }
}

/// Key of the interval tables: `(chain, fragment id, start block)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntervalKey {
    /// Chain id.
    pub chain_id: ChainId,
    /// Fragment id.
    pub id: FragmentId,
    /// First block of the interval.
    pub start_block: u64,
}

impl IntervalKey {
    /// Smallest interval key of a fragment.
    pub const fn first_of(chain_id: ChainId, id: FragmentId) -> Self {
        Self { chain_id, id, start_block: 0 }
    }

    /// Smallest interval key of `chain_id`.
    pub const fn first_of_chain(chain_id: ChainId) -> Self {
        Self { chain_id, id: FragmentId(B256::ZERO), start_block: 0 }
    }

    /// Returns `true` if the key belongs to the given fragment.
    pub fn is_of(&self, chain_id: ChainId, id: &FragmentId) -> bool {
        self.chain_id == chain_id && self.id == *id
    }
}

impl Encode for IntervalKey {
    type Encoded = [u8; 48];

    fn encode(self) -> Self::Encoded {
        let mut out = [0u8; 48];
        out[..8].copy_from_slice(&self.chain_id.to_be_bytes());
        out[8..40].copy_from_slice(self.id.as_slice());
        out[40..].copy_from_slice(&self.start_block.to_be_bytes());
        out
    }
}

impl Decode for IntervalKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        let mut reader = KeyReader::exact(value, 48)?;
        let chain_id = reader.u64();
        let id = FragmentId(reader.b256());
        Ok(Self { chain_id, id, start_block: reader.u64() })
    }
}
