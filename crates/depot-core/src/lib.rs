//! Core infrastructure for depot.
//!
//! This crate provides what every depot component shares:
//! - the event sink ([`EventListener`], [`EventListeners`]) through which
//!   pools, retries, transactions, the cache and the health monitor report
//!   what they do
//! - the error taxonomy ([`ErrorKind`], [`Classify`], [`AccessError`])
//! - [`ConfigError`], returned by every configuration builder

pub mod error;
pub mod events;

pub use error::{AccessError, Classify, ConfigError, ErrorKind};
pub use events::{AccessEvent, BoxedEventListener, EventListener, EventListeners, FnListener};
