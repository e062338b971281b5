mod error;
pub mod checkpoint;
pub mod config;
pub mod context;
pub mod providers;
pub mod sagas;
pub mod traits;

#[cfg(test)]
pub mod mocks;

pub use error::{CompensationFailure, OperationError, Result};
