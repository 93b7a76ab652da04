//! Shared Strata model types.
//!
//! Pure data types used by the engine, state, and CLI crates: the medallion
//! stage enumeration, the continuation queue payload, the data contract
//! document model, and validation report types. No I/O lives here.

pub mod contract;
pub mod message;
pub mod stage;
pub mod validation;

pub use contract::{
    ColumnConstraint, ColumnDefinition, DataContract, QualityRule, RuleKind, SchemaDefinition,
    Severity, Sla,
};
pub use message::ContinuationMessage;
pub use stage::{Stage, UnknownStage};
pub use validation::{ContractValidationResult, ValidationPhase, ValidationReport};
