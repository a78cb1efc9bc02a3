//! Encoding helpers and small value types shared across storage tables.
//!
//! Hand-written [`Compact`] layouts use fixed-width big-endian integers, raw 20/32-byte hashes,
//! a presence byte in front of optional fields and a `u32` length prefix in front of
//! variable-length byte strings.

use alloy_primitives::{Address, B256, U256};
use bytes::{Buf, BufMut};
use derive_more::{Deref, From};
use reth_codecs::Compact;
use serde::{Deserialize, Serialize};

pub(crate) fn put_b256<B: BufMut>(buf: &mut B, value: &B256) {
    buf.put_slice(value.as_slice());
}

pub(crate) fn get_b256(buf: &mut &[u8]) -> B256 {
    assert!(buf.len() >= 32, "buffer too small for B256");
    let value = B256::from_slice(&buf[..32]);
    buf.advance(32);
    value
}

pub(crate) fn put_address<B: BufMut>(buf: &mut B, value: &Address) {
    buf.put_slice(value.as_slice());
}

pub(crate) fn get_address(buf: &mut &[u8]) -> Address {
    assert!(buf.len() >= 20, "buffer too small for Address");
    let value = Address::from_slice(&buf[..20]);
    buf.advance(20);
    value
}

pub(crate) fn put_u256<B: BufMut>(buf: &mut B, value: &U256) {
    buf.put_slice(&value.to_be_bytes::<32>());
}

pub(crate) fn get_u256(buf: &mut &[u8]) -> U256 {
    assert!(buf.len() >= 32, "buffer too small for U256");
    let value = U256::from_be_slice(&buf[..32]);
    buf.advance(32);
    value
}

pub(crate) fn put_bytes<B: BufMut>(buf: &mut B, value: &[u8]) {
    buf.put_u32(value.len() as u32);
    buf.put_slice(value);
}

pub(crate) fn get_bytes(buf: &mut &[u8]) -> Vec<u8> {
    let len = buf.get_u32() as usize;
    assert!(buf.len() >= len, "buffer too small for byte string");
    let value = buf[..len].to_vec();
    buf.advance(len);
    value
}

pub(crate) fn put_option<B, T, F>(buf: &mut B, value: Option<&T>, put: F)
where
    B: BufMut,
    F: FnOnce(&mut B, &T),
{
    match value {
        Some(value) => {
            buf.put_u8(1);
            put(buf, value);
        }
        None => buf.put_u8(0),
    }
}

pub(crate) fn get_option<T, F>(buf: &mut &[u8], get: F) -> Option<T>
where
    F: FnOnce(&mut &[u8]) -> T,
{
    (buf.get_u8() != 0).then(|| get(buf))
}

/// End block of a stored interval. The start block is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deref, From, Serialize, Deserialize)]
pub struct IntervalEnd(pub u64);

impl Compact for IntervalEnd {
    fn to_compact<B>(&self, buf: &mut B) -> usize
    where
        B: BufMut + AsMut<[u8]>,
    {
        buf.put_u64(self.0);
        8
    }

    fn from_compact(mut buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let end = buf.get_u64();
        (Self(end), buf)
    }
}

/// Cached result of a remote request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestResultEntry {
    /// Full request text, checked against the lookup on read.
    pub request: String,
    /// Opaque result string.
    pub result: String,
}

/// Compact encoding for [`RequestResultEntry`]: the length-prefixed request followed by the
/// UTF-8 bytes of the result, unprefixed.
impl Compact for RequestResultEntry {
    fn to_compact<B>(&self, buf: &mut B) -> usize
    where
        B: BufMut + AsMut<[u8]>,
    {
        put_bytes(buf, self.request.as_bytes());
        buf.put_slice(self.result.as_bytes());
        4 + self.request.len() + self.result.len()
    }

    fn from_compact(buf: &[u8], len: usize) -> (Self, &[u8]) {
        let (mut entry, rest) = (&buf[..len], &buf[len..]);
        let request = String::from_utf8_lossy(&get_bytes(&mut entry)).into_owned();
        let result = String::from_utf8_lossy(entry).into_owned();
        (Self { request, result }, rest)
    }
}
