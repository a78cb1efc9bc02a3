//! Core types shared by the chain sync store.
//!
//! This crate defines the decoded chain records the store persists, the criteria describing
//! which logs a consumer watches, and the pure algorithms the store builds on:
//! - [`interval`]: union and intersection over closed block ranges
//! - [`fragment`]: decomposition of criteria into atomic, content-addressed fragments
//! - [`event`]: event stream queries, cursors and pages

pub mod interval;
pub use interval::{Interval, IntervalError};

pub mod criteria;
pub use criteria::{
    ChildAddressExtractionError, ChildAddressLocation, ChildAddressLocationError,
    FactoryCriteria, LogFilterCriteria, TopicFilters, ValueFilter,
};

pub mod fragment;
pub use fragment::{
    FactoryFragment, FragmentId, LogFilterFragment, build_factory_fragments,
    build_log_filter_fragments,
};

mod block;
pub use block::Block;

mod transaction;
pub use transaction::{
    ACCESS_LIST_TX_TYPE, DEPOSIT_TX_TYPE, LEGACY_TX_TYPE, PRIORITY_FEE_TX_TYPE, Transaction,
    TransactionKind,
};

mod log;
pub use log::{Log, LogId};

pub mod event;
pub use event::{
    EventCount, EventCursor, EventSource, EventsPage, EventsPageMetadata, FactorySource,
    LogEvent, LogEventsQuery, LogFilterSource,
};
