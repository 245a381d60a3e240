//! In-process domain events for the mxvault engine.

pub mod bus;

pub use bus::{topics, DomainEvent, EventBus};
