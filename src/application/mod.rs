//! Application layer: Use cases and services.
//!
//! This module orchestrates domain types with the classifier port.

mod gateway;

pub use gateway::{ClassifierHandle, PredictorGateway};
