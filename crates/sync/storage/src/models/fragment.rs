//! Models for persisting fragments and their synced intervals.
//!
//! Each fragment kind has its own definition table keyed by [`FragmentKey`] and its own interval
//! table keyed by [`crate::models::IntervalKey`]. [`FragmentRecord`] ties a fragment type to its
//! pair of tables so the interval logic is written once for both kinds.

use super::{
    FactoryFragments, FactoryIntervals, FragmentKey, IntervalEnd, IntervalKey, LogFilterFragments,
    LogFilterIntervals,
    common::{get_address, get_b256, get_option, put_address, put_b256, put_option},
};
use alloy_primitives::{B256, ChainId};
use bytes::{Buf, BufMut};
use chainsync_types::{ChildAddressLocation, FactoryFragment, FragmentId, LogFilterFragment};
use derive_more::{Deref, From};
use reth_codecs::Compact;
use reth_db_api::table::{Table, Value};
use serde::{Deserialize, Serialize};

const LOCATION_TOPIC: u8 = 0;
const LOCATION_OFFSET: u8 = 1;

/// A fragment kind that can be stored alongside its synced intervals.
pub trait FragmentRecord: Copy {
    /// Value stored in the definition table.
    type Entry: Value + From<Self> + Into<Self>;
    /// Definition table.
    type Fragments: Table<Key = FragmentKey, Value = Self::Entry>;
    /// Interval table.
    type Intervals: Table<Key = IntervalKey, Value = IntervalEnd>;

    /// Fragment id.
    fn id(&self) -> FragmentId;

    /// Chain the fragment is scoped to.
    fn chain_id(&self) -> ChainId;

    /// Returns `true` if intervals synced for `self` also hold for `requested`.
    fn covers(&self, requested: &Self) -> bool;

    /// Definition table key.
    fn key(&self) -> FragmentKey {
        FragmentKey { chain_id: self.chain_id(), id: self.id() }
    }
}

impl FragmentRecord for LogFilterFragment {
    type Entry = LogFilterFragmentEntry;
    type Fragments = LogFilterFragments;
    type Intervals = LogFilterIntervals;

    fn id(&self) -> FragmentId {
        self.id
    }

    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    fn covers(&self, requested: &Self) -> bool {
        Self::covers(self, requested)
    }
}

impl FragmentRecord for FactoryFragment {
    type Entry = FactoryFragmentEntry;
    type Fragments = FactoryFragments;
    type Intervals = FactoryIntervals;

    fn id(&self) -> FragmentId {
        self.id
    }

    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    fn covers(&self, requested: &Self) -> bool {
        Self::covers(self, requested)
    }
}

fn put_topics<B: BufMut>(buf: &mut B, topics: &[Option<B256>; 4]) {
    for topic in topics {
        put_option(buf, topic.as_ref(), put_b256);
    }
}

fn get_topics(buf: &mut &[u8]) -> [Option<B256>; 4] {
    let mut topics = [None; 4];
    for topic in &mut topics {
        *topic = get_option(buf, get_b256);
    }
    topics
}

/// Stored [`LogFilterFragment`] definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deref, From, Serialize, Deserialize)]
pub struct LogFilterFragmentEntry(pub LogFilterFragment);

impl Compact for LogFilterFragmentEntry {
    fn to_compact<B>(&self, buf: &mut B) -> usize
    where
        B: BufMut + AsMut<[u8]>,
    {
        let start_len = buf.remaining_mut();
        buf.put_u64(self.0.chain_id);
        put_option(buf, self.0.address.as_ref(), put_address);
        put_topics(buf, &self.0.topics);
        start_len - buf.remaining_mut()
    }

    fn from_compact(mut buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let chain_id = buf.get_u64();
        let address = get_option(&mut buf, get_address);
        let topics = get_topics(&mut buf);
        (Self(LogFilterFragment::new(chain_id, address, topics)), buf)
    }
}

impl From<LogFilterFragmentEntry> for LogFilterFragment {
    fn from(entry: LogFilterFragmentEntry) -> Self {
        entry.0
    }
}

/// Stored [`FactoryFragment`] definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deref, From, Serialize, Deserialize)]
pub struct FactoryFragmentEntry(pub FactoryFragment);

/// Compact encoding for [`FactoryFragmentEntry`].
///
/// The child address location is a kind byte (`0` topic, `1` data offset) followed by a `u64`.
impl Compact for FactoryFragmentEntry {
    fn to_compact<B>(&self, buf: &mut B) -> usize
    where
        B: BufMut + AsMut<[u8]>,
    {
        let start_len = buf.remaining_mut();
        let fragment = &self.0;
        buf.put_u64(fragment.chain_id);
        put_address(buf, &fragment.address);
        put_b256(buf, &fragment.event_selector);
        match fragment.child_address_location {
            ChildAddressLocation::Topic(slot) => {
                buf.put_u8(LOCATION_TOPIC);
                buf.put_u64(u64::from(slot));
            }
            ChildAddressLocation::Offset(offset) => {
                buf.put_u8(LOCATION_OFFSET);
                buf.put_u64(offset as u64);
            }
        }
        put_topics(buf, &fragment.topics);
        start_len - buf.remaining_mut()
    }

    fn from_compact(mut buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let chain_id = buf.get_u64();
        let address = get_address(&mut buf);
        let event_selector = get_b256(&mut buf);
        let kind = buf.get_u8();
        let value = buf.get_u64();
        let location = match kind {
            LOCATION_TOPIC => ChildAddressLocation::Topic(value as u8),
            _ => ChildAddressLocation::Offset(value as usize),
        };
        let topics = get_topics(&mut buf);
        let fragment = FactoryFragment::new(chain_id, address, event_selector, location, topics);
        (Self(fragment), buf)
    }
}

impl From<FactoryFragmentEntry> for FactoryFragment {
    fn from(entry: FactoryFragmentEntry) -> Self {
        entry.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    #[test]
    fn test_log_filter_fragment_entry_keeps_id() {
        let fragment = LogFilterFragment::new(
            10,
            Some(Address::repeat_byte(1)),
            [Some(B256::repeat_byte(2)), None, None, Some(B256::repeat_byte(3))],
        );
        let mut buf = Vec::new();
        let len = LogFilterFragmentEntry(fragment).to_compact(&mut buf);
        assert_eq!(len, buf.len());

        let (decoded, rest) = LogFilterFragmentEntry::from_compact(&buf, len);
        assert!(rest.is_empty());
        assert_eq!(decoded.0, fragment);
        assert_eq!(FragmentRecord::key(&decoded.0), FragmentKey { chain_id: 10, id: fragment.id });
    }

    #[test]
    fn test_factory_fragment_entry_keeps_location() {
        for location in [ChildAddressLocation::Topic(2), ChildAddressLocation::Offset(64)] {
            let fragment = FactoryFragment::new(
                1,
                Address::repeat_byte(7),
                B256::repeat_byte(8),
                location,
                [None, Some(B256::repeat_byte(9)), None, None],
            );
            let mut buf = Vec::new();
            let len = FactoryFragmentEntry(fragment).to_compact(&mut buf);
            let (decoded, _) = FactoryFragmentEntry::from_compact(&buf, len);
            assert_eq!(decoded.0, fragment);
        }
    }
}
