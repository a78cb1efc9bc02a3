//! Decoded transactions.

use alloy_eips::eip2930::AccessList;
use alloy_primitives::{Address, B256, Bytes, U256};

/// Envelope type tag of a legacy transaction.
pub const LEGACY_TX_TYPE: u8 = 0x00;
/// Envelope type tag of an access-list transaction.
pub const ACCESS_LIST_TX_TYPE: u8 = 0x01;
/// Envelope type tag of a priority-fee transaction.
pub const PRIORITY_FEE_TX_TYPE: u8 = 0x02;
/// Envelope type tag of a rollup deposit transaction.
pub const DEPOSIT_TX_TYPE: u8 = 0x7e;

/// Type-specific fee fields of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    /// Pre-typed transaction.
    Legacy {
        /// Gas price.
        gas_price: U256,
    },
    /// Access-list transaction.
    AccessList {
        /// Gas price.
        gas_price: U256,
        /// Pre-declared accessed addresses and slots.
        access_list: AccessList,
    },
    /// Priority-fee transaction.
    PriorityFee {
        /// Fee cap.
        max_fee_per_gas: U256,
        /// Tip cap.
        max_priority_fee_per_gas: U256,
    },
    /// Rollup deposit transaction. Fee fields are reported by some clients only.
    Deposit {
        /// Fee cap.
        max_fee_per_gas: Option<U256>,
        /// Tip cap.
        max_priority_fee_per_gas: Option<U256>,
    },
    /// Any other envelope type. The tag is kept, fee fields are not interpreted.
    Unknown {
        /// Raw envelope type.
        ty: u8,
    },
}

impl TransactionKind {
    /// Returns the envelope type tag.
    pub const fn ty(&self) -> u8 {
        match self {
            Self::Legacy { .. } => LEGACY_TX_TYPE,
            Self::AccessList { .. } => ACCESS_LIST_TX_TYPE,
            Self::PriorityFee { .. } => PRIORITY_FEE_TX_TYPE,
            Self::Deposit { .. } => DEPOSIT_TX_TYPE,
            Self::Unknown { ty } => *ty,
        }
    }

    /// Builds the typed variant from a type tag and the optional fee columns.
    ///
    /// Missing fee fields of a known type default to zero.
    pub fn from_parts(
        ty: u8,
        gas_price: Option<U256>,
        max_fee_per_gas: Option<U256>,
        max_priority_fee_per_gas: Option<U256>,
        access_list: Option<AccessList>,
    ) -> Self {
        match ty {
            LEGACY_TX_TYPE => Self::Legacy { gas_price: gas_price.unwrap_or_default() },
            ACCESS_LIST_TX_TYPE => Self::AccessList {
                gas_price: gas_price.unwrap_or_default(),
                access_list: access_list.unwrap_or_default(),
            },
            PRIORITY_FEE_TX_TYPE => Self::PriorityFee {
                max_fee_per_gas: max_fee_per_gas.unwrap_or_default(),
                max_priority_fee_per_gas: max_priority_fee_per_gas.unwrap_or_default(),
            },
            DEPOSIT_TX_TYPE => Self::Deposit { max_fee_per_gas, max_priority_fee_per_gas },
            ty => Self::Unknown { ty },
        }
    }
}

/// A transaction as delivered by the network client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
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
    /// Recipient, `None` for contract creation.
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
    /// Signature `v` (or y-parity).
    pub v: U256,
    /// Type-specific fields.
    pub kind: TransactionKind,
}
