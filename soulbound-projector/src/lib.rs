//! Soulbound projector - derived read models over the event log
//!
//! This crate implements the read side of the system. A [`Projector`]
//! consumes the totally ordered event log produced by the factory and its
//! issuance instances and maintains queryable [`ReadModel`] entities:
//! creators, collections, holders, and tokens. Instances are discovered
//! dynamically from creation events by a [`SubscriptionManager`]; a
//! [`ProjectionRunner`] drives the whole thing against a live log with
//! checkpointed resume.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod projector;
pub mod registry;
pub mod runner;

pub use model::{Collection, Creator, Holder, ReadModel, Token, TokenKey};
pub use projector::Projector;
pub use registry::{Route, SubscriptionManager};
pub use runner::{
    InMemoryCheckpointStore, PollMode, ProjectionError, ProjectionResult, ProjectionRunner,
};
