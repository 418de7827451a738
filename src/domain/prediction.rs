//! Prediction result types.
//!
//! Represents the output of a single classifier call.

use serde::{Deserialize, Serialize};

/// Binary risk classification for ten-year heart disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    /// Model predicted class 1
    HighRisk,
    /// Model predicted class 0
    LowRisk,
}

impl RiskLabel {
    /// Map a classifier class label. Only 0 and 1 are meaningful.
    #[must_use]
    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            1 => Some(Self::HighRisk),
            0 => Some(Self::LowRisk),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighRisk => "high_risk",
            Self::LowRisk => "low_risk",
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::HighRisk => "High Risk of Heart Disease",
            Self::LowRisk => "Low Risk of Heart Disease",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one prediction. Never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: RiskLabel,

    /// Positive-class probability (0.0 to 1.0)
    pub probability: f64,

    pub evaluated_at: chrono::DateTime<chrono::Utc>,
}

impl PredictionResult {
    #[must_use]
    pub fn new(label: RiskLabel, probability: f64) -> Self {
        Self {
            label,
            probability,
            evaluated_at: chrono::Utc::now(),
        }
    }

    /// Probability as a percentage with two decimals, e.g. `"12.34%"`.
    #[must_use]
    pub fn probability_percent(&self) -> String {
        format!("{:.2}%", self.probability * 100.0)
    }

    #[must_use]
    pub fn is_high_risk(&self) -> bool {
        self.label == RiskLabel::HighRisk
    }
}
