//! Saga pattern for compensating multi-step operations.
//!
//! This crate provides infrastructure for executing multi-step operations
//! against resources that offer no transactions of their own. Each step
//! produces an output that becomes the next step's input. When a step fails,
//! every mutating step that already completed is compensated in reverse order,
//! receiving the output it produced so it knows exactly what to undo.

mod audit;
mod builder;
mod cloneable;
mod erased;
mod error;
mod saga;
mod step;

pub use audit::{RollbackOutcome, SagaAuditLog, StepRecord, StepStatus};
pub use builder::SagaBuilder;
pub use error::{CompensationError, SagaError, SagaResult};
pub use saga::Saga;
pub use step::{SagaStep, StepKind};
