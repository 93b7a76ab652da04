//! Core sequencing and validation crate for Strata pipeline execution.
//!
//! The engine owns the stage [`Driver`] and its continuation protocol
//! ([`dispatch`]), the [`queue`] abstraction the protocol rides on, the
//! pipeline [`config`] layer, the registered-function [`registry`] and the
//! medallion [`stages`] built from it, and the data [`contracts`]
//! validation engine.

pub mod config;
pub mod contracts;
pub mod dispatch;
pub mod driver;
pub mod queue;
pub mod registry;
pub mod runner;
pub mod stages;

// Re-export public API for convenience
pub use driver::{Driver, DriverError};
pub use queue::{QueueError, TaskQueue};
pub use runner::create_driver;
