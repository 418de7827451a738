//! Logistic artifact adapter: Implementation of `Classifier` for a
//! standardized logistic-regression model exported as JSON.
//!
//! The artifact stores the scaler statistics, the coefficients and the
//! column order the model was trained with. Loading refuses any artifact
//! whose column order differs from the one patient records are built with,
//! since a permuted row would otherwise produce a meaningless prediction
//! without any error.
//!
//! # Integrity
//!
//! The SHA-256 digest of the artifact bytes is computed on every load and
//! logged as a fingerprint. When an expected digest is configured, a
//! mismatch is treated as a corrupt artifact.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::FEATURE_NAMES;
use crate::ports::{ArtifactError, ArtifactLoader, Classifier, ClassifierError};

/// File name of the artifact shipped next to the executable.
pub const ARTIFACT_FILE_NAME: &str = "heart_model.json";

/// Only artifact format understood by this adapter.
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

const MODEL_TYPE: &str = "standardized_logistic_regression";

/// Model parameters as exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedLogisticModel {
    pub format_version: u32,
    pub model_type: String,
    pub feature_names: Vec<String>,
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub threshold: f64,
}

impl ExportedLogisticModel {
    /// Structural sanity checks. Does not look at feature names.
    fn check(&self) -> Result<(), ArtifactError> {
        if self.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ArtifactError::Corrupt(format!(
                "unsupported format_version {} (expected {SUPPORTED_FORMAT_VERSION})",
                self.format_version
            )));
        }
        if self.model_type != MODEL_TYPE {
            return Err(ArtifactError::Corrupt(format!(
                "unsupported model_type {:?}",
                self.model_type
            )));
        }

        let n = self.feature_names.len();
        if n == 0 {
            return Err(ArtifactError::Corrupt("artifact declares no features".into()));
        }
        if self.coefficients.len() != n
            || self.scaler_mean.len() != n
            || self.scaler_scale.len() != n
        {
            return Err(ArtifactError::Corrupt(
                "parameter lengths do not match feature_names length".into(),
            ));
        }

        let all_finite = self
            .coefficients
            .iter()
            .chain(&self.scaler_mean)
            .chain(&self.scaler_scale)
            .chain([&self.intercept, &self.threshold])
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ArtifactError::Corrupt("non-finite model parameter".into()));
        }
        if self.scaler_scale.iter().any(|s| *s <= 0.0) {
            return Err(ArtifactError::Corrupt("scaler_scale must be positive".into()));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(ArtifactError::Corrupt(format!(
                "threshold {} outside (0, 1)",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// A loaded logistic-regression classifier.
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    model: ExportedLogisticModel,
    fingerprint: Option<String>,
}

impl LogisticClassifier {
    /// Build a classifier from already-deserialized parameters.
    ///
    /// # Errors
    /// Returns `ArtifactError::Corrupt` if the parameters are inconsistent.
    pub fn from_exported(model: ExportedLogisticModel) -> Result<Self, ArtifactError> {
        model.check()?;
        Ok(Self {
            model,
            fingerprint: None,
        })
    }

    /// SHA-256 hex digest of the artifact bytes, when loaded from disk.
    #[must_use]
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.model.threshold
    }

    fn decision_value(&self, row: &[f64]) -> Result<f64, ClassifierError> {
        let m = &self.model;
        if row.len() != m.coefficients.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: m.coefficients.len(),
                got: row.len(),
            });
        }

        let z = row
            .iter()
            .zip(&m.scaler_mean)
            .zip(&m.scaler_scale)
            .zip(&m.coefficients)
            .fold(m.intercept, |acc, (((x, mean), scale), coef)| {
                acc + coef * (x - mean) / scale
            });

        if z.is_finite() {
            Ok(z)
        } else {
            Err(ClassifierError::Computation(
                "decision value is not finite".into(),
            ))
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    // Split on sign so exp() never overflows.
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticClassifier {
    fn feature_names(&self) -> &[String] {
        &self.model.feature_names
    }

    fn classify(&self, row: &[f64]) -> Result<u8, ClassifierError> {
        let p = self.score(row)?;
        Ok(u8::from(p >= self.model.threshold))
    }

    fn score(&self, row: &[f64]) -> Result<f64, ClassifierError> {
        self.decision_value(row).map(sigmoid)
    }
}

fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Loads a [`LogisticClassifier`] from a JSON file.
#[derive(Debug, Clone)]
pub struct LogisticArtifactLoader {
    path: PathBuf,
    expected_sha256: Option<String>,
    expected_features: Vec<String>,
}

impl LogisticArtifactLoader {
    /// Loader for the artifact at `path`, expecting the patient record
    /// column order.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            expected_sha256: None,
            expected_features: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Pin the artifact to a SHA-256 hex digest.
    #[must_use]
    pub fn with_expected_sha256(mut self, digest: impl Into<String>) -> Self {
        self.expected_sha256 = Some(digest.into().to_ascii_lowercase());
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArtifactLoader for LogisticArtifactLoader {
    type Model = LogisticClassifier;

    fn source(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<LogisticClassifier, ArtifactError> {
        let bytes = std::fs::read(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ArtifactError::NotFound {
                path: self.path.clone(),
            },
            _ => ArtifactError::Corrupt(format!(
                "failed to read {}: {e}",
                self.path.display()
            )),
        })?;

        let fingerprint = sha256_hex_bytes(&bytes);
        if let Some(expected) = &self.expected_sha256 {
            if *expected != fingerprint {
                tracing::error!(
                    path = %self.path.display(),
                    "Model artifact digest does not match the pinned SHA-256"
                );
                return Err(ArtifactError::Corrupt(format!(
                    "SHA-256 mismatch: expected {expected}, got {fingerprint}"
                )));
            }
        }

        let model: ExportedLogisticModel = serde_json::from_slice(&bytes)
            .map_err(|e| ArtifactError::Corrupt(format!("invalid artifact JSON: {e}")))?;

        if model.feature_names != self.expected_features {
            return Err(ArtifactError::FeatureOrderMismatch {
                expected: self.expected_features.clone(),
                found: model.feature_names,
            });
        }

        let mut classifier = LogisticClassifier::from_exported(model)?;
        classifier.fingerprint = Some(fingerprint);

        tracing::info!(
            path = %self.path.display(),
            n_features = classifier.model.feature_names.len(),
            threshold = classifier.model.threshold,
            sha256 = classifier.fingerprint().unwrap_or_default(),
            "Loaded model artifact"
        );

        Ok(classifier)
    }
}

/// Path of the artifact bundled in the repository.
#[cfg(test)]
pub(crate) fn bundled_artifact_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("models")
        .join(ARTIFACT_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn two_feature_model() -> ExportedLogisticModel {
        ExportedLogisticModel {
            format_version: 1,
            model_type: MODEL_TYPE.to_string(),
            feature_names: vec!["a".into(), "b".into()],
            scaler_mean: vec![0.0, 10.0],
            scaler_scale: vec![1.0, 2.0],
            coefficients: vec![1.0, -0.5],
            intercept: 0.0,
            threshold: 0.5,
        }
    }

    fn write_artifact(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("Should create temp file");
        file.write_all(contents.as_bytes())
            .expect("Should write artifact");
        file
    }

    fn bundled_json() -> serde_json::Value {
        let text = std::fs::read_to_string(bundled_artifact_path()).expect("Should read bundle");
        serde_json::from_str(&text).expect("Bundle should be JSON")
    }

    #[test]
    fn test_load_bundled_artifact() {
        let classifier = LogisticArtifactLoader::new(bundled_artifact_path())
            .load()
            .expect("Bundled artifact should load");

        assert_eq!(classifier.feature_names().to_vec(), FEATURE_NAMES.to_vec());
        let fp = classifier.fingerprint().expect("Should have fingerprint");
        assert_eq!(fp.len(), 64);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join(ARTIFACT_FILE_NAME);

        let err = LogisticArtifactLoader::new(&path).load().unwrap_err();
        match err {
            ArtifactError::NotFound { path: p } => assert_eq!(p, path),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_artifact() {
        let file = write_artifact("{ not json");
        let err = LogisticArtifactLoader::new(file.path()).load().unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt(_)));
    }

    #[test]
    fn test_unsupported_version() {
        let mut json = bundled_json();
        json["format_version"] = serde_json::json!(2);
        let file = write_artifact(&json.to_string());

        let err = LogisticArtifactLoader::new(file.path()).load().unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt(msg) if msg.contains("format_version")));
    }

    #[test]
    fn test_feature_order_mismatch() {
        let mut json = bundled_json();
        let names = json["feature_names"]
            .as_array_mut()
            .expect("feature_names array");
        names.swap(9, 10); // sysBP <-> diaBP
        let file = write_artifact(&json.to_string());

        let err = LogisticArtifactLoader::new(file.path()).load().unwrap_err();
        match err {
            ArtifactError::FeatureOrderMismatch { found, .. } => {
                assert_eq!(found[9], "diaBP");
                assert_eq!(found[10], "sysBP");
            }
            other => panic!("expected FeatureOrderMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_parameter_length_mismatch() {
        let mut json = bundled_json();
        json["coefficients"]
            .as_array_mut()
            .expect("coefficients array")
            .pop();
        let file = write_artifact(&json.to_string());

        let err = LogisticArtifactLoader::new(file.path()).load().unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt(_)));
    }

    #[test]
    fn test_sha256_pin() {
        let path = bundled_artifact_path();
        let bytes = std::fs::read(&path).expect("Should read bundle");
        let digest = sha256_hex_bytes(&bytes);

        let ok = LogisticArtifactLoader::new(&path)
            .with_expected_sha256(digest.to_uppercase())
            .load();
        assert!(ok.is_ok());

        let err = LogisticArtifactLoader::new(&path)
            .with_expected_sha256("00".repeat(32))
            .load()
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt(msg) if msg.contains("SHA-256")));
    }

    #[test]
    fn test_score_math() {
        let classifier =
            LogisticClassifier::from_exported(two_feature_model()).expect("Should build");

        // z = 1.0 * (0 - 0) / 1 + -0.5 * (10 - 10) / 2 = 0
        let p = classifier.score(&[0.0, 10.0]).expect("Should score");
        assert!((p - 0.5).abs() < 1e-12);
        assert_eq!(classifier.classify(&[0.0, 10.0]).expect("Should classify"), 1);

        // z = -2 -> p = 0.1192
        let p = classifier.score(&[-2.0, 10.0]).expect("Should score");
        assert!((p - 0.119_202_922).abs() < 1e-6);
        assert_eq!(classifier.classify(&[-2.0, 10.0]).expect("Should classify"), 0);
    }

    #[test]
    fn test_extreme_decision_values_stay_in_range() {
        let classifier =
            LogisticClassifier::from_exported(two_feature_model()).expect("Should build");
        let high = classifier.score(&[1e6, 10.0]).expect("Should score");
        let low = classifier.score(&[-1e6, 10.0]).expect("Should score");
        assert!((0.0..=1.0).contains(&high));
        assert!((0.0..=1.0).contains(&low));
    }

    #[test]
    fn test_shape_mismatch() {
        let classifier =
            LogisticClassifier::from_exported(two_feature_model()).expect("Should build");
        let err = classifier.score(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::ShapeMismatch {
                expected: 2,
                got: 3
            }
        ));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let mut model = two_feature_model();
        model.scaler_scale[1] = 0.0;
        assert!(LogisticClassifier::from_exported(model).is_err());

        let mut model = two_feature_model();
        model.threshold = 1.0;
        assert!(LogisticClassifier::from_exported(model).is_err());

        let mut model = two_feature_model();
        model.intercept = f64::NAN;
        assert!(LogisticClassifier::from_exported(model).is_err());
    }
}
