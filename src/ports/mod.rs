//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the gateway and the opaque model artifact.

mod classifier;

pub use classifier::{ArtifactError, ArtifactLoader, Classifier, ClassifierError};
