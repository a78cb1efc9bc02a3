//! Decomposition of criteria into atomic fragments.
//!
//! A fragment fixes every field of a criterion to a single value or a wildcard (`None`). A
//! criterion with set-valued fields expands into the cartesian product of its per-field values.
//! Fragment identifiers are derived from the field values only, so the same logical fragment
//! produced by two different criteria shares one id and one set of synced intervals.

use crate::criteria::{ChildAddressLocation, FactoryCriteria, LogFilterCriteria, TopicFilters};
use alloy_primitives::{Address, B256, ChainId, keccak256};
use derive_more::{Deref, Display, From};
use serde::{Deserialize, Serialize};

const LOG_FILTER_DOMAIN: u8 = 0;
const FACTORY_DOMAIN: u8 = 1;

/// Content-derived identifier of a fragment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Display,
    Deref,
    From,
    Serialize,
    Deserialize,
)]
pub struct FragmentId(pub B256);

/// Atomic log filter: one address-or-wildcard and four topic-or-wildcard values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilterFragment {
    /// Stable identifier.
    pub id: FragmentId,
    /// Chain the fragment is scoped to.
    pub chain_id: ChainId,
    /// Emitting address, `None` for any.
    pub address: Option<Address>,
    /// Topic values, `None` for any.
    pub topics: [Option<B256>; 4],
}

impl LogFilterFragment {
    /// Creates a fragment and derives its id.
    pub fn new(chain_id: ChainId, address: Option<Address>, topics: [Option<B256>; 4]) -> Self {
        let mut buf = Vec::with_capacity(1 + 8 + 21 + 4 * 33);
        buf.push(LOG_FILTER_DOMAIN);
        buf.extend_from_slice(&chain_id.to_be_bytes());
        encode_optional(&mut buf, address.as_ref().map(|a| a.as_slice()));
        encode_topics(&mut buf, &topics);
        Self { id: FragmentId(keccak256(&buf)), chain_id, address, topics }
    }

    /// Returns `true` if synced intervals stored for `self` also cover `requested`.
    ///
    /// A wildcard field of the stored fragment covers any requested value; a requested wildcard
    /// is only covered by a stored wildcard.
    pub fn covers(&self, requested: &Self) -> bool {
        self.chain_id == requested.chain_id &&
            field_covers(self.address.as_ref(), requested.address.as_ref()) &&
            topics_cover(&self.topics, &requested.topics)
    }
}

/// Atomic factory filter: fixed parent, selector and location plus four topic-or-wildcard values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryFragment {
    /// Stable identifier.
    pub id: FragmentId,
    /// Chain the fragment is scoped to.
    pub chain_id: ChainId,
    /// Parent contract address.
    pub address: Address,
    /// Child-creation event selector.
    pub event_selector: B256,
    /// Location of the child address in the creation log.
    pub child_address_location: ChildAddressLocation,
    /// Child topic values, `None` for any.
    pub topics: [Option<B256>; 4],
}

impl FactoryFragment {
    /// Creates a fragment and derives its id.
    pub fn new(
        chain_id: ChainId,
        address: Address,
        event_selector: B256,
        child_address_location: ChildAddressLocation,
        topics: [Option<B256>; 4],
    ) -> Self {
        let mut buf = Vec::with_capacity(1 + 8 + 20 + 32 + 9 + 4 * 33);
        buf.push(FACTORY_DOMAIN);
        buf.extend_from_slice(&chain_id.to_be_bytes());
        buf.extend_from_slice(address.as_slice());
        buf.extend_from_slice(event_selector.as_slice());
        match child_address_location {
            ChildAddressLocation::Topic(slot) => {
                buf.push(0);
                buf.extend_from_slice(&u64::from(slot).to_be_bytes());
            }
            ChildAddressLocation::Offset(offset) => {
                buf.push(1);
                buf.extend_from_slice(&(offset as u64).to_be_bytes());
            }
        }
        encode_topics(&mut buf, &topics);
        Self {
            id: FragmentId(keccak256(&buf)),
            chain_id,
            address,
            event_selector,
            child_address_location,
            topics,
        }
    }

    /// Returns `true` if synced intervals stored for `self` also cover `requested`.
    pub fn covers(&self, requested: &Self) -> bool {
        self.chain_id == requested.chain_id &&
            self.address == requested.address &&
            self.event_selector == requested.event_selector &&
            self.child_address_location == requested.child_address_location &&
            topics_cover(&self.topics, &requested.topics)
    }
}

fn encode_optional(buf: &mut Vec<u8>, value: Option<&[u8]>) {
    match value {
        Some(bytes) => {
            buf.push(1);
            buf.extend_from_slice(bytes);
        }
        None => buf.push(0),
    }
}

fn encode_topics(buf: &mut Vec<u8>, topics: &[Option<B256>; 4]) {
    for topic in topics {
        encode_optional(buf, topic.as_ref().map(|t| t.as_slice()));
    }
}

fn field_covers<T: PartialEq>(stored: Option<&T>, requested: Option<&T>) -> bool {
    stored.is_none() || stored == requested
}

fn topics_cover(stored: &[Option<B256>; 4], requested: &[Option<B256>; 4]) -> bool {
    stored.iter().zip(requested).all(|(s, r)| field_covers(s.as_ref(), r.as_ref()))
}

/// Cartesian product of the four topic slots. An empty value set yields no combinations.
fn topic_combinations(topics: &TopicFilters) -> Vec<[Option<B256>; 4]> {
    let mut combinations = vec![[None; 4]];
    for (slot, filter) in topics.iter().enumerate() {
        let Some(values) = filter.collapsed().values() else {
            continue;
        };
        combinations = combinations
            .into_iter()
            .flat_map(|combination| {
                values.iter().map(move |value| {
                    let mut next = combination;
                    next[slot] = Some(*value);
                    next
                })
            })
            .collect();
    }
    combinations
}

/// Decomposes a log filter into its atomic fragments.
pub fn build_log_filter_fragments(
    chain_id: ChainId,
    criteria: &LogFilterCriteria,
) -> Vec<LogFilterFragment> {
    let addresses: Vec<Option<Address>> = match criteria.address.collapsed().values() {
        Some(values) => values.into_iter().map(Some).collect(),
        None => vec![None],
    };
    let topics = topic_combinations(&criteria.topics);

    addresses
        .into_iter()
        .flat_map(|address| {
            topics.iter().map(move |topics| LogFilterFragment::new(chain_id, address, *topics))
        })
        .collect()
}

/// Decomposes a factory filter into its atomic fragments.
pub fn build_factory_fragments(
    chain_id: ChainId,
    criteria: &FactoryCriteria,
) -> Vec<FactoryFragment> {
    topic_combinations(&criteria.topics)
        .into_iter()
        .map(|topics| {
            FactoryFragment::new(
                chain_id,
                criteria.address,
                criteria.event_selector,
                criteria.child_address_location,
                topics,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::ValueFilter;
    use alloy_primitives::{address, b256};

    const A: Address = address!("0x00000000000000000000000000000000000000aa");
    const B: Address = address!("0x00000000000000000000000000000000000000bb");
    const T1: B256 = b256!("0x0000000000000000000000000000000000000000000000000000000000000001");
    const T2: B256 = b256!("0x0000000000000000000000000000000000000000000000000000000000000002");

    #[test]
    fn test_single_address_yields_one_fragment() {
        let fragments = build_log_filter_fragments(1, &LogFilterCriteria::for_address(vec![A]));
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].address, Some(A));
        assert_eq!(fragments[0].topics, [None; 4]);
    }

    #[test]
    fn test_cartesian_product() {
        let criteria = LogFilterCriteria::for_address(vec![A, B])
            .with_topic(0, vec![T1, T2])
            .with_topic(2, T1);
        let fragments = build_log_filter_fragments(1, &criteria);
        assert_eq!(fragments.len(), 4);
        assert!(fragments.iter().all(|f| f.topics[2] == Some(T1) && f.topics[1].is_none()));
    }

    #[test]
    fn test_decomposition_is_order_independent() {
        let forward = LogFilterCriteria::for_address(vec![A, B]).with_topic(1, vec![T1, T2]);
        let reverse = LogFilterCriteria::for_address(vec![B, A, B]).with_topic(1, vec![T2, T1]);
        assert_eq!(build_log_filter_fragments(5, &forward), build_log_filter_fragments(5, &reverse));
    }

    #[test]
    fn test_empty_set_yields_no_fragments() {
        let criteria = LogFilterCriteria::for_address(ValueFilter::<Address>::AnyOf(vec![]));
        assert!(build_log_filter_fragments(1, &criteria).is_empty());

        let factory = FactoryCriteria::new(A, T1, ChildAddressLocation::Topic(1))
            .with_topic(0, ValueFilter::<B256>::AnyOf(vec![]));
        assert!(build_factory_fragments(1, &factory).is_empty());
    }

    #[test]
    fn test_ids_are_content_derived() {
        let a = LogFilterFragment::new(1, Some(A), [Some(T1), None, None, None]);
        let b = LogFilterFragment::new(1, Some(A), [Some(T1), None, None, None]);
        let other_chain = LogFilterFragment::new(2, Some(A), [Some(T1), None, None, None]);
        let wildcard = LogFilterFragment::new(1, None, [Some(T1), None, None, None]);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, other_chain.id);
        assert_ne!(a.id, wildcard.id);

        let topic = FactoryFragment::new(1, A, T1, ChildAddressLocation::Topic(1), [None; 4]);
        let offset = FactoryFragment::new(1, A, T1, ChildAddressLocation::Offset(1), [None; 4]);
        assert_ne!(topic.id, offset.id);
    }

    #[test]
    fn test_wildcard_covers() {
        let stored = LogFilterFragment::new(1, Some(A), [None; 4]);
        let requested = LogFilterFragment::new(1, Some(A), [Some(T1), None, None, None]);
        assert!(stored.covers(&requested));
        assert!(!requested.covers(&stored));

        let any_address = LogFilterFragment::new(1, None, [None; 4]);
        assert!(any_address.covers(&requested));
        assert!(!any_address.covers(&LogFilterFragment::new(2, Some(A), [None; 4])));
    }

    #[test]
    fn test_factory_fragments_vary_topics_only() {
        let factory = FactoryCriteria::new(A, T1, ChildAddressLocation::Offset(0))
            .with_topic(0, vec![T1, T2]);
        let fragments = build_factory_fragments(10, &factory);
        assert_eq!(fragments.len(), 2);
        assert!(fragments.iter().all(|f| f.address == A && f.event_selector == T1));
        assert!(fragments[0].covers(&fragments[0]));
        assert!(!fragments[0].covers(&fragments[1]));
    }
}
