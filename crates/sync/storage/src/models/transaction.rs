//! Models for storing transactions in the database.

use super::common::{
    get_address, get_b256, get_bytes, get_option, get_u256, put_address, put_b256, put_bytes,
    put_option, put_u256,
};
use alloy_eips::eip2930::{AccessList, AccessListItem};
use alloy_primitives::{Address, B256, Bytes, U256};
use bytes::{Buf, BufMut};
use chainsync_types::{Transaction, TransactionKind};
use reth_codecs::Compact;
use serde::{Deserialize, Serialize};

/// Transaction row as stored in [`crate::models::Transactions`].
///
/// The type-specific payload is flattened into optional fee columns tagged by `ty`; unknown
/// types keep their tag and leave every fee column empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionEntry {
    /// Transaction hash.
    pub hash: B256,
    /// Hash of the including block.
    pub block_hash: B256,
    /// Number of the including block.
    pub block_number: u64,
    /// Position within the block.
    pub transaction_index: u32,
    /// Sender.
    pub from: Address,
    /// Recipient.
    pub to: Option<Address>,
    /// Transferred value.
    pub value: U256,
    /// Call data.
    pub input: Bytes,
    /// Sender nonce.
    pub nonce: u64,
    /// Gas limit.
    pub gas: U256,
    /// Signature `r`.
    pub r: U256,
    /// Signature `s`.
    pub s: U256,
    /// Signature `v`.
    pub v: U256,
    /// Envelope type tag.
    pub ty: u8,
    /// Gas price of legacy and access-list transactions.
    pub gas_price: Option<U256>,
    /// Fee cap of priority-fee and deposit transactions.
    pub max_fee_per_gas: Option<U256>,
    /// Tip cap of priority-fee and deposit transactions.
    pub max_priority_fee_per_gas: Option<U256>,
    /// Access list of access-list transactions.
    pub access_list: Option<AccessList>,
}

fn put_access_list<B: BufMut>(buf: &mut B, access_list: &AccessList) {
    buf.put_u32(access_list.0.len() as u32);
    for item in &access_list.0 {
        put_address(buf, &item.address);
        buf.put_u32(item.storage_keys.len() as u32);
        for key in &item.storage_keys {
            put_b256(buf, key);
        }
    }
}

fn get_access_list(buf: &mut &[u8]) -> AccessList {
    let items = buf.get_u32() as usize;
    let mut list = Vec::with_capacity(items);
    for _ in 0..items {
        let address = get_address(buf);
        let keys = buf.get_u32() as usize;
        let storage_keys = (0..keys).map(|_| get_b256(buf)).collect();
        list.push(AccessListItem { address, storage_keys });
    }
    AccessList(list)
}

impl Compact for TransactionEntry {
    fn to_compact<B>(&self, buf: &mut B) -> usize
    where
        B: BufMut + AsMut<[u8]>,
    {
        let start_len = buf.remaining_mut();

        put_b256(buf, &self.hash);
        put_b256(buf, &self.block_hash);
        buf.put_u64(self.block_number);
        buf.put_u32(self.transaction_index);
        put_address(buf, &self.from);
        put_option(buf, self.to.as_ref(), put_address);
        put_u256(buf, &self.value);
        put_bytes(buf, &self.input);
        buf.put_u64(self.nonce);
        put_u256(buf, &self.gas);
        put_u256(buf, &self.r);
        put_u256(buf, &self.s);
        put_u256(buf, &self.v);
        buf.put_u8(self.ty);
        put_option(buf, self.gas_price.as_ref(), put_u256);
        put_option(buf, self.max_fee_per_gas.as_ref(), put_u256);
        put_option(buf, self.max_priority_fee_per_gas.as_ref(), put_u256);
        put_option(buf, self.access_list.as_ref(), put_access_list);

        start_len - buf.remaining_mut()
    }

    fn from_compact(mut buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let entry = Self {
            hash: get_b256(&mut buf),
            block_hash: get_b256(&mut buf),
            block_number: buf.get_u64(),
            transaction_index: buf.get_u32(),
            from: get_address(&mut buf),
            to: get_option(&mut buf, get_address),
            value: get_u256(&mut buf),
            input: Bytes::from(get_bytes(&mut buf)),
            nonce: buf.get_u64(),
            gas: get_u256(&mut buf),
            r: get_u256(&mut buf),
            s: get_u256(&mut buf),
            v: get_u256(&mut buf),
            ty: buf.get_u8(),
            gas_price: get_option(&mut buf, get_u256),
            max_fee_per_gas: get_option(&mut buf, get_u256),
            max_priority_fee_per_gas: get_option(&mut buf, get_u256),
            access_list: get_option(&mut buf, get_access_list),
        };
        (entry, buf)
    }
}

impl From<&Transaction> for TransactionEntry {
    fn from(tx: &Transaction) -> Self {
        let (gas_price, max_fee_per_gas, max_priority_fee_per_gas, access_list) = match &tx.kind {
            TransactionKind::Legacy { gas_price } => (Some(*gas_price), None, None, None),
            TransactionKind::AccessList { gas_price, access_list } => {
                (Some(*gas_price), None, None, Some(access_list.clone()))
            }
            TransactionKind::PriorityFee { max_fee_per_gas, max_priority_fee_per_gas } => {
                (None, Some(*max_fee_per_gas), Some(*max_priority_fee_per_gas), None)
            }
            TransactionKind::Deposit { max_fee_per_gas, max_priority_fee_per_gas } => {
                (None, *max_fee_per_gas, *max_priority_fee_per_gas, None)
            }
            TransactionKind::Unknown { .. } => (None, None, None, None),
        };

        Self {
            hash: tx.hash,
            block_hash: tx.block_hash,
            block_number: tx.block_number,
            transaction_index: tx.transaction_index,
            from: tx.from,
            to: tx.to,
            value: tx.value,
            input: tx.input.clone(),
            nonce: tx.nonce,
            gas: tx.gas,
            r: tx.r,
            s: tx.s,
            v: tx.v,
            ty: tx.kind.ty(),
            gas_price,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            access_list,
        }
    }
}

impl From<TransactionEntry> for Transaction {
    fn from(entry: TransactionEntry) -> Self {
        let kind = TransactionKind::from_parts(
            entry.ty,
            entry.gas_price,
            entry.max_fee_per_gas,
            entry.max_priority_fee_per_gas,
            entry.access_list,
        );
        Self {
            hash: entry.hash,
            block_hash: entry.block_hash,
            block_number: entry.block_number,
            transaction_index: entry.transaction_index,
            from: entry.from,
            to: entry.to,
            value: entry.value,
            input: entry.input,
            nonce: entry.nonce,
            gas: entry.gas,
            r: entry.r,
            s: entry.s,
            v: entry.v,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn transaction(kind: TransactionKind) -> Transaction {
        Transaction {
            hash: B256::repeat_byte(1),
            block_hash: B256::repeat_byte(2),
            block_number: 10,
            transaction_index: 3,
            from: Address::repeat_byte(4),
            to: None,
            value: U256::from(1_000),
            input: Bytes::from_static(&[0xde, 0xad]),
            nonce: 5,
            gas: U256::from(21_000),
            r: U256::from(6),
            s: U256::from(7),
            v: U256::from(1),
            kind,
        }
    }

    #[rstest]
    #[case(TransactionKind::Legacy { gas_price: U256::from(9) })]
    #[case(TransactionKind::AccessList {
        gas_price: U256::from(9),
        access_list: AccessList(vec![AccessListItem {
            address: Address::repeat_byte(0xaa),
            storage_keys: vec![B256::repeat_byte(1), B256::repeat_byte(2)],
        }]),
    })]
    #[case(TransactionKind::PriorityFee {
        max_fee_per_gas: U256::from(100),
        max_priority_fee_per_gas: U256::from(2),
    })]
    #[case(TransactionKind::Deposit { max_fee_per_gas: None, max_priority_fee_per_gas: None })]
    #[case(TransactionKind::Unknown { ty: 0x04 })]
    fn test_transaction_entry_preserves_kind(#[case] kind: TransactionKind) {
        let original = transaction(kind);
        let entry = TransactionEntry::from(&original);

        let mut buffer = Vec::new();
        let bytes_written = entry.to_compact(&mut buffer);
        assert_eq!(bytes_written, buffer.len());

        let (decoded, remaining_buf) = TransactionEntry::from_compact(&buffer, bytes_written);
        assert!(remaining_buf.is_empty());
        assert_eq!(Transaction::from(decoded), original);
    }

    #[test]
    fn test_unknown_type_drops_fee_columns() {
        let entry = TransactionEntry::from(&transaction(TransactionKind::Unknown { ty: 0x64 }));
        assert_eq!(entry.ty, 0x64);
        assert!(entry.gas_price.is_none());
        assert!(entry.max_fee_per_gas.is_none());
        assert!(entry.access_list.is_none());
    }
}
