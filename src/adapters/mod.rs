//! Adapters layer: Concrete implementations of ports.
//!
//! - `logistic`: JSON-exported standardized logistic regression

pub mod logistic;

pub use logistic::{LogisticArtifactLoader, LogisticClassifier, ARTIFACT_FILE_NAME};
