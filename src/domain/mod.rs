//! Domain layer: Core business types and logic.
//!
//! Pure data types with validation; no I/O.

mod patient;
mod prediction;

pub use patient::{
    FieldKind, FieldSpec, IncompleteRecord, MissingValuePolicy, PatientInput, PatientRecord,
    FEATURE_COUNT, FEATURE_NAMES, FIELD_SPECS,
};
pub use prediction::{PredictionResult, RiskLabel};
