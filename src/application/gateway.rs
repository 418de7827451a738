//! Predictor gateway: Owns the loaded classifier and runs inference.
//!
//! The classifier is loaded lazily on first use and then shared read-only
//! for the rest of the process. Concurrent first calls are serialized so
//! the artifact is read from disk exactly once.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::domain::{
    IncompleteRecord, MissingValuePolicy, PatientInput, PatientRecord, PredictionResult,
    RiskLabel, FEATURE_NAMES,
};
use crate::ports::{ArtifactError, ArtifactLoader, Classifier, ClassifierError};
use crate::CardioriskError;

/// Shared handle to the loaded classifier.
pub type ClassifierHandle<C> = Arc<C>;

/// Mediates between patient records and the opaque classifier.
pub struct PredictorGateway<L>
where
    L: ArtifactLoader,
{
    loader: L,
    handle: OnceLock<ClassifierHandle<L::Model>>,
    init_lock: Mutex<()>,
    missing_values: MissingValuePolicy,
}

impl<L> PredictorGateway<L>
where
    L: ArtifactLoader,
{
    /// Create a gateway. Nothing is loaded until the first call to
    /// [`initialize`](Self::initialize) or a prediction.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            handle: OnceLock::new(),
            init_lock: Mutex::new(()),
            missing_values: MissingValuePolicy::default(),
        }
    }

    /// Set how [`predict_input`](Self::predict_input) treats absent fields.
    #[must_use]
    pub fn with_missing_value_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_values = policy;
        self
    }

    #[must_use]
    pub fn missing_value_policy(&self) -> MissingValuePolicy {
        self.missing_values
    }

    /// Whether the classifier has been loaded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Load the classifier if it is not loaded yet and return the handle.
    ///
    /// # Errors
    /// Returns `CardioriskError::Artifact` if the artifact is missing,
    /// corrupt, or the loaded classifier reports a different column order.
    /// Nothing is cached on failure.
    pub fn initialize(&self) -> Result<ClassifierHandle<L::Model>, CardioriskError> {
        if let Some(handle) = self.handle.get() {
            return Ok(Arc::clone(handle));
        }

        // The guarded value is (), so a poisoned lock carries no broken state.
        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(handle) = self.handle.get() {
            return Ok(Arc::clone(handle));
        }

        tracing::info!(source = %self.loader.source(), "Loading classifier...");
        let model = self
            .loader
            .load()
            .and_then(|model| check_feature_order(&model).map(|()| model))
            .map_err(|e| {
                tracing::error!(source = %self.loader.source(), "Failed to load classifier: {e}");
                e
            })?;

        let handle = self.handle.get_or_init(|| Arc::new(model));
        Ok(Arc::clone(handle))
    }

    /// Run the classifier on one complete record.
    ///
    /// Domain ranges are not checked here; that is the caller's job.
    ///
    /// # Errors
    /// Returns `CardioriskError::MissingField` for a non-finite value,
    /// `CardioriskError::Artifact` if lazy loading fails, and
    /// `CardioriskError::Inference` if the classifier fails, panics, or
    /// returns an invalid label or probability.
    pub fn predict(&self, record: &PatientRecord) -> Result<PredictionResult, CardioriskError> {
        if let Some(field) = record.first_non_finite() {
            return Err(IncompleteRecord { field }.into());
        }

        let classifier = self.initialize()?;
        let row = record.to_row();

        let outcome = panic::catch_unwind(AssertUnwindSafe(
            || -> Result<(u8, f64), ClassifierError> {
                let class = classifier.classify(&row)?;
                let probability = classifier.score(&row)?;
                Ok((class, probability))
            },
        ));

        let (class, probability) = match outcome {
            Ok(Ok(values)) => values,
            Ok(Err(e)) => {
                tracing::warn!("Classifier call failed: {e}");
                return Err(CardioriskError::Inference(e.to_string()));
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!("Classifier panicked: {message}");
                return Err(CardioriskError::Inference(format!(
                    "classifier panicked: {message}"
                )));
            }
        };

        let label = RiskLabel::from_class(class).ok_or_else(|| {
            CardioriskError::Inference(format!("classifier returned unknown label {class}"))
        })?;

        if !(0.0..=1.0).contains(&probability) {
            return Err(CardioriskError::Inference(format!(
                "classifier returned probability {probability} outside [0, 1]"
            )));
        }

        tracing::debug!(label = %label, probability, "Prediction complete");
        Ok(PredictionResult::new(label, probability))
    }

    /// Resolve partial input under the configured missing value policy,
    /// then [`predict`](Self::predict).
    ///
    /// # Errors
    /// Same as [`predict`](Self::predict).
    pub fn predict_input(&self, input: &PatientInput) -> Result<PredictionResult, CardioriskError> {
        let record = input.resolve(self.missing_values)?;
        self.predict(&record)
    }
}

/// Rows are built in `FEATURE_NAMES` order; a model trained on any other
/// order would score them silently wrong.
fn check_feature_order<C: Classifier>(model: &C) -> Result<(), ArtifactError> {
    let found = model.feature_names();
    if found.iter().map(String::as_str).eq(FEATURE_NAMES) {
        Ok(())
    } else {
        Err(ArtifactError::FeatureOrderMismatch {
            expected: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            found: found.to_vec(),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
