//! # Cardiorisk
//!
//! Ten-year coronary heart disease risk prediction from fourteen clinical
//! measurements, using a pre-trained binary classifier loaded from disk.
//!
//! This crate provides:
//! - A predictor gateway that loads the classifier once and runs inference
//! - A versioned JSON model artifact format carrying its own column order
//! - Terminal UI form for interactive use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (PatientRecord, PredictionResult)
//! - `ports`: Trait definitions for the classifier and its loader
//! - `adapters`: Concrete implementations (JSON logistic regression)
//! - `application`: The predictor gateway
//! - `config`: Environment-driven settings
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use application::PredictorGateway;
pub use config::AppConfig;
pub use domain::{PatientInput, PatientRecord, PredictionResult, RiskLabel};

/// Result type for Cardiorisk operations
pub type Result<T> = std::result::Result<T, CardioriskError>;

/// Main error type for Cardiorisk
#[derive(Debug, thiserror::Error)]
pub enum CardioriskError {
    #[error("Model artifact error: {0}")]
    Artifact(#[from] ports::ArtifactError),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Incomplete patient record: {0}")]
    MissingField(#[from] domain::IncompleteRecord),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
