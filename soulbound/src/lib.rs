//! Soulbound - event-sourced issuance of non-transferable membership tokens
//!
//! This crate implements the write side of the system: the per-organization
//! issuance state machine (`MembershipCollection`), the factory that creates
//! collections for a fee (`SbtFactory`), and the `EventLog` boundary through
//! which every committed state transition is published as an immutable,
//! totally ordered event.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod collection;
pub mod errors;
pub mod event;
pub mod event_log;
pub mod factory;
pub mod testing;
pub mod types;

pub use collection::{CollectionConfig, MembershipCollection, TokenRecord, TokenState};
pub use errors::{
    EventLogError, EventLogResult, FactoryError, FactoryResult, IssuanceError, IssuanceResult,
};
pub use event::{DomainEvent, RecordedEvent};
pub use event_log::EventLog;
pub use factory::{CollectionParams, FactoryConfig, SbtFactory};
pub use types::{
    Address, BaseUri, BurnAuth, Capability, CollectionName, FeeAmount, LogPosition, MaxSupply,
    Timestamp, TokenId, TokenSymbol,
};
