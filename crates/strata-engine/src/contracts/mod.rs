//! Data contract enforcement.
//!
//! A contract declares what a dataset must look like (schema), what must
//! hold inside it (quality rules), and how fresh and complete it must be
//! (SLA). Validation runs the three passes independently and never
//! short-circuits: one failing check still leaves a complete report of
//! everything else.

pub mod dataset;
pub mod loader;
pub mod quality;
pub mod schema;
pub mod sla;
pub mod validator;

pub use dataset::Dataset;
pub use loader::{ContractError, ContractLoader};
pub use validator::ContractValidator;
