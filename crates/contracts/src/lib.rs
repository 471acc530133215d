//! # Contracts
//!
//! Shared interface contracts for the streamlab workspace: error taxonomy,
//! subscription lifecycle, stage descriptors, configuration and the demo
//! `Person` record. Every other crate depends on this one, never the reverse.
//!
//! ## Ordering Model
//! - A sequence emits elements in the order defined by its stages
//! - Terminal signals (complete / error / cancel) are delivered at most once

mod config;
mod error;
mod lifecycle;
mod person;
mod stage;
mod subscriber;

pub use config::*;
pub use error::*;
pub use lifecycle::SubscriptionState;
pub use person::Person;
pub use stage::StageKind;
pub use subscriber::{LocalSubscriber, Subscriber};
