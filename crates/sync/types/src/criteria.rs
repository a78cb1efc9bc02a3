//! Criteria describing which logs a source watches.

use alloy_primitives::{Address, B256};
use core::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Constraint on a single log field: wildcard, one exact value, or a set of alternatives.
///
/// Deserialises from `null`, a scalar, or an array respectively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueFilter<T> {
    /// Matches any value, including an absent one.
    #[default]
    Any,
    /// Matches exactly one value.
    One(T),
    /// Matches any value of the set. An empty set matches nothing.
    AnyOf(Vec<T>),
}

impl<T> ValueFilter<T>
where
    T: Clone + Ord,
{
    /// Returns the canonical value set of the filter, or `None` for a wildcard.
    ///
    /// Values are sorted and de-duplicated so the result does not depend on declaration order.
    pub fn values(&self) -> Option<Vec<T>> {
        match self {
            Self::Any => None,
            Self::One(value) => Some(vec![value.clone()]),
            Self::AnyOf(values) => {
                let mut values = values.clone();
                values.sort_unstable();
                values.dedup();
                Some(values)
            }
        }
    }

    /// Collapses a single-element set into [`ValueFilter::One`].
    pub fn collapsed(&self) -> Self {
        match self {
            Self::AnyOf(values) if values.len() == 1 => Self::One(values[0].clone()),
            other => other.clone(),
        }
    }

    /// Returns `true` if `value` satisfies the filter.
    pub fn matches(&self, value: Option<&T>) -> bool {
        match self {
            Self::Any => true,
            Self::One(expected) => value == Some(expected),
            Self::AnyOf(expected) => value.is_some_and(|v| expected.contains(v)),
        }
    }

    /// Returns `true` if the filter places no constraint on the field.
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl<T> From<T> for ValueFilter<T> {
    fn from(value: T) -> Self {
        Self::One(value)
    }
}

impl<T> From<Vec<T>> for ValueFilter<T> {
    fn from(values: Vec<T>) -> Self {
        Self::AnyOf(values)
    }
}

/// Per-slot topic constraints, slot 0 being the event selector.
pub type TopicFilters = [ValueFilter<B256>; 4];

/// Returns `true` if every populated topic slot of a log satisfies `filters`.
pub fn topics_match(filters: &TopicFilters, topics: &[Option<B256>; 4]) -> bool {
    filters.iter().zip(topics).all(|(filter, topic)| filter.matches(topic.as_ref()))
}

/// Direct log filter: an address constraint plus four topic slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilterCriteria {
    /// Emitting contract address(es).
    #[serde(default)]
    pub address: ValueFilter<Address>,
    /// Topic constraints.
    #[serde(default)]
    pub topics: TopicFilters,
}

impl LogFilterCriteria {
    /// Creates a criterion constrained to `address` with no topic constraints.
    pub fn for_address(address: impl Into<ValueFilter<Address>>) -> Self {
        Self { address: address.into(), topics: Default::default() }
    }

    /// Sets the constraint for topic slot `slot`.
    ///
    /// # Panics
    /// If `slot` is not in `0..4`.
    pub fn with_topic(mut self, slot: usize, filter: impl Into<ValueFilter<B256>>) -> Self {
        self.topics[slot] = filter.into();
        self
    }

    /// Returns `true` if a log with the given address and topics satisfies the criterion.
    pub fn matches(&self, address: &Address, topics: &[Option<B256>; 4]) -> bool {
        self.address.matches(Some(address)) && topics_match(&self.topics, topics)
    }
}

/// Where a factory's child-creation log carries the child address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChildAddressLocation {
    /// One of the indexed topic slots `1..=3`; the address is the low 20 bytes of the topic.
    Topic(u8),
    /// Byte offset of a 32-byte ABI word in the log data; the address is its low 20 bytes.
    Offset(usize),
}

impl fmt::Display for ChildAddressLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topic(slot) => write!(f, "topic{slot}"),
            Self::Offset(offset) => write!(f, "offset{offset}"),
        }
    }
}

impl ChildAddressLocation {
    /// Reads the child address from a creation log's topics and data.
    pub fn extract(
        &self,
        topics: &[Option<B256>; 4],
        data: &[u8],
    ) -> Result<Address, ChildAddressExtractionError> {
        match *self {
            Self::Topic(slot) => topics
                .get(slot as usize)
                .copied()
                .flatten()
                .map(Address::from_word)
                .ok_or(ChildAddressExtractionError::MissingTopic(slot)),
            Self::Offset(offset) => {
                let end = offset.saturating_add(32);
                if data.len() < end {
                    return Err(ChildAddressExtractionError::DataTooShort {
                        len: data.len(),
                        required: end,
                    });
                }
                Ok(Address::from_slice(&data[offset + 12..end]))
            }
        }
    }
}

/// Error reading a child address out of a creation log.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ChildAddressExtractionError {
    /// The referenced topic slot is empty.
    #[error("topic {0} is missing")]
    MissingTopic(u8),
    /// The log data ends before the addressed word.
    #[error("data is {len} bytes, at least {required} required")]
    DataTooShort {
        /// Actual data length.
        len: usize,
        /// Length needed to read the word.
        required: usize,
    },
}

/// Error parsing a [`ChildAddressLocation`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid child address location: {0}")]
pub struct ChildAddressLocationError(pub String);

impl FromStr for ChildAddressLocation {
    type Err = ChildAddressLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ChildAddressLocationError(s.to_string());
        if let Some(slot) = s.strip_prefix("topic") {
            return match slot.parse::<u8>() {
                Ok(slot @ 1..=3) => Ok(Self::Topic(slot)),
                _ => Err(err()),
            };
        }
        if let Some(offset) = s.strip_prefix("offset") {
            return offset.parse::<usize>().map(Self::Offset).map_err(|_| err());
        }
        Err(err())
    }
}

impl TryFrom<String> for ChildAddressLocation {
    type Error = ChildAddressLocationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChildAddressLocation> for String {
    fn from(location: ChildAddressLocation) -> Self {
        location.to_string()
    }
}

/// Factory filter: child contracts are discovered from a parent contract's creation logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryCriteria {
    /// Parent (factory) contract address.
    pub address: Address,
    /// Selector (topic 0) of the child-creation event.
    pub event_selector: B256,
    /// Where the child address is found in the creation log.
    pub child_address_location: ChildAddressLocation,
    /// Topic constraints applied to logs emitted by the children.
    #[serde(default)]
    pub topics: TopicFilters,
}

impl FactoryCriteria {
    /// Creates a factory criterion without child topic constraints.
    pub fn new(
        address: Address,
        event_selector: B256,
        child_address_location: ChildAddressLocation,
    ) -> Self {
        Self { address, event_selector, child_address_location, topics: Default::default() }
    }

    /// Sets the child constraint for topic slot `slot`.
    ///
    /// # Panics
    /// If `slot` is not in `0..4`.
    pub fn with_topic(mut self, slot: usize, filter: impl Into<ValueFilter<B256>>) -> Self {
        self.topics[slot] = filter.into();
        self
    }

    /// The log filter that observes the factory's own child-creation logs.
    pub fn creation_log_filter(&self) -> LogFilterCriteria {
        LogFilterCriteria::for_address(self.address).with_topic(0, self.event_selector)
    }
}
