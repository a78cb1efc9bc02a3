//! Providers for sync store state.
//!
//! Each provider wraps a borrowed MDBX transaction and implements one concern:
//! - Raw chain records and the request cache (via [`RecordProvider`])
//! - Fragment intervals (via [`IntervalProvider`])
//! - Factory child-address resolution (via [`FactoryProvider`])
//! - Event stream pages and counts (via [`EventProvider`])
//! - Reorg repair (via [`RewindProvider`])
mod record_provider;
pub(crate) use record_provider::RecordProvider;

mod interval_provider;
pub(crate) use interval_provider::IntervalProvider;

mod factory_provider;
pub(crate) use factory_provider::{ChildAddressCursor, FactoryProvider};

mod event_provider;
pub(crate) use event_provider::EventProvider;

mod rewind_provider;
pub(crate) use rewind_provider::RewindProvider;
