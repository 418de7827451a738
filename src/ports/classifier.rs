//! Classifier port: Trait for a pre-trained binary classifier.
//!
//! This trait abstracts the model artifact format from the application logic.
//! The gateway only ever asks for a label decision and a positive-class
//! probability on one row of features.

use std::path::PathBuf;

/// Errors raised while loading a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("model artifact not found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("model artifact is corrupt: {0}")]
    Corrupt(String),

    #[error("model feature order mismatch: expected {expected:?}, artifact has {found:?}")]
    FeatureOrderMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Errors raised by a classifier during inference.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("expected {expected} features, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("{0}")]
    Computation(String),
}

/// A loaded, read-only binary classifier.
///
/// Implementations must be safe to share across threads: the gateway hands
/// out one instance for the whole process lifetime.
pub trait Classifier: Send + Sync {
    /// Column names the model was trained with, in order.
    fn feature_names(&self) -> &[String];

    /// Class label decision (0 or 1) for one row.
    ///
    /// # Errors
    /// Returns `ClassifierError::ShapeMismatch` if the row length is wrong.
    fn classify(&self, row: &[f64]) -> Result<u8, ClassifierError>;

    /// Probability of class 1 for one row.
    ///
    /// # Errors
    /// Returns `ClassifierError::ShapeMismatch` if the row length is wrong.
    fn score(&self, row: &[f64]) -> Result<f64, ClassifierError>;
}

/// Source of a classifier, typically a file on disk.
pub trait ArtifactLoader: Send + Sync {
    type Model: Classifier + 'static;

    /// Short description of where the artifact comes from, for logs.
    fn source(&self) -> String;

    /// Deserialize the artifact into a classifier.
    ///
    /// # Errors
    /// Returns `ArtifactError::NotFound` if the artifact is absent,
    /// `ArtifactError::Corrupt` if it cannot be deserialized, and
    /// `ArtifactError::FeatureOrderMismatch` if its column order is not
    /// the one records are built with.
    fn load(&self) -> Result<Self::Model, ArtifactError>;
}
