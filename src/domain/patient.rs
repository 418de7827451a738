//! Patient record types for ten-year coronary heart disease risk prediction.
//!
//! Based on the Framingham Heart Study cohort features. The column order of
//! [`FEATURE_NAMES`] is the order the classifier was trained with; the model
//! artifact carries its own copy and is rejected at load time if they differ.

use serde::{Deserialize, Serialize};

/// Number of clinical features in a record.
pub const FEATURE_COUNT: usize = 14;

/// Feature names in model column order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "male",
    "age",
    "currentSmoker",
    "cigsPerDay",
    "BPMeds",
    "prevalentStroke",
    "prevalentHyp",
    "diabetes",
    "totChol",
    "sysBP",
    "diaBP",
    "BMI",
    "heartRate",
    "glucose",
];

/// How a form widget constrains a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 0 = no, 1 = yes
    Binary,
    /// Whole numbers
    Integer,
    /// Real numbers
    Decimal,
}

/// Input domain of a single feature.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub hint: &'static str,
    pub kind: FieldKind,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl FieldSpec {
    const fn binary(name: &'static str, label: &'static str, hint: &'static str) -> Self {
        Self {
            name,
            label,
            hint,
            kind: FieldKind::Binary,
            min: 0.0,
            max: 1.0,
            default: 0.0,
        }
    }

    const fn integer(
        name: &'static str,
        label: &'static str,
        hint: &'static str,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self {
            name,
            label,
            hint,
            kind: FieldKind::Integer,
            min,
            max,
            default,
        }
    }

    /// Whether `value` lies inside this field's domain.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        match self.kind {
            FieldKind::Binary => value == 0.0 || value == 1.0,
            FieldKind::Integer | FieldKind::Decimal => (self.min..=self.max).contains(&value),
        }
    }

    /// Coerce a value into the domain the way a bounded form widget does.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        match self.kind {
            FieldKind::Binary => {
                if value >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            FieldKind::Integer => value.round().clamp(self.min, self.max),
            FieldKind::Decimal => value.clamp(self.min, self.max),
        }
    }
}

/// Field domains in column order, with the form's default values.
pub static FIELD_SPECS: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec::binary("male", "Gender", "0 = female, 1 = male"),
    FieldSpec::integer("age", "Age", "years (1-120)", 1.0, 120.0, 40.0),
    FieldSpec::binary("currentSmoker", "Current Smoker", "0 = no, 1 = yes"),
    FieldSpec::integer("cigsPerDay", "Cigarettes Per Day", "0-100", 0.0, 100.0, 0.0),
    FieldSpec::binary("BPMeds", "BP Medication", "0 = no, 1 = yes"),
    FieldSpec::binary("prevalentStroke", "Previous Stroke", "0 = no, 1 = yes"),
    FieldSpec::binary("prevalentHyp", "Hypertension", "0 = no, 1 = yes"),
    FieldSpec::binary("diabetes", "Diabetes", "0 = no, 1 = yes"),
    FieldSpec::integer("totChol", "Total Cholesterol", "mg/dL (100-500)", 100.0, 500.0, 200.0),
    FieldSpec::integer("sysBP", "Systolic BP", "mmHg (80-250)", 80.0, 250.0, 120.0),
    FieldSpec::integer("diaBP", "Diastolic BP", "mmHg (50-150)", 50.0, 150.0, 80.0),
    FieldSpec {
        name: "BMI",
        label: "BMI",
        hint: "kg/m² (10.0-60.0)",
        kind: FieldKind::Decimal,
        min: 10.0,
        max: 60.0,
        default: 22.0,
    },
    FieldSpec::integer("heartRate", "Heart Rate", "bpm (40-200)", 40.0, 200.0, 75.0),
    FieldSpec::integer("glucose", "Glucose Level", "mg/dL (50-400)", 50.0, 400.0, 100.0),
];

/// One patient's complete clinical record.
///
/// Serialized with the model's column names (`currentSmoker`, `sysBP`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatientRecord {
    pub male: f64,
    pub age: f64,
    pub current_smoker: f64,
    pub cigs_per_day: f64,
    #[serde(rename = "BPMeds")]
    pub bp_meds: f64,
    pub prevalent_stroke: f64,
    pub prevalent_hyp: f64,
    pub diabetes: f64,
    pub tot_chol: f64,
    #[serde(rename = "sysBP")]
    pub sys_bp: f64,
    #[serde(rename = "diaBP")]
    pub dia_bp: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    pub heart_rate: f64,
    pub glucose: f64,
}

impl PatientRecord {
    /// The record the input form starts with.
    #[must_use]
    pub fn form_defaults() -> Self {
        let mut row = [0.0; FEATURE_COUNT];
        for (slot, spec) in row.iter_mut().zip(FIELD_SPECS.iter()) {
            *slot = spec.default;
        }
        Self::from_array(row)
    }

    /// Convert to a single model input row in column order.
    #[must_use]
    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        [
            self.male,
            self.age,
            self.current_smoker,
            self.cigs_per_day,
            self.bp_meds,
            self.prevalent_stroke,
            self.prevalent_hyp,
            self.diabetes,
            self.tot_chol,
            self.sys_bp,
            self.dia_bp,
            self.bmi,
            self.heart_rate,
            self.glucose,
        ]
    }

    /// Create a record from a row in column order.
    ///
    /// # Errors
    /// Returns error if the row does not have exactly 14 values.
    pub fn from_row(row: &[f64]) -> Result<Self, String> {
        let row: [f64; FEATURE_COUNT] = row
            .try_into()
            .map_err(|_| format!("Expected {FEATURE_COUNT} features, got {}", row.len()))?;
        Ok(Self::from_array(row))
    }

    fn from_array(row: [f64; FEATURE_COUNT]) -> Self {
        let [male, age, current_smoker, cigs_per_day, bp_meds, prevalent_stroke, prevalent_hyp, diabetes, tot_chol, sys_bp, dia_bp, bmi, heart_rate, glucose] =
            row;
        Self {
            male,
            age,
            current_smoker,
            cigs_per_day,
            bp_meds,
            prevalent_stroke,
            prevalent_hyp,
            diabetes,
            tot_chol,
            sys_bp,
            dia_bp,
            bmi,
            heart_rate,
            glucose,
        }
    }

    /// Name of the first field holding NaN or an infinity, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.to_row()
            .iter()
            .zip(FEATURE_NAMES)
            .find(|(v, _)| !v.is_finite())
            .map(|(_, name)| name)
    }

    /// Validate that all features are within the form's domains.
    ///
    /// # Errors
    /// Returns one message per out-of-range field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        range_errors(self.to_row().into_iter().zip(FIELD_SPECS.iter()))
    }
}

fn range_errors<'a>(
    values: impl Iterator<Item = (f64, &'a FieldSpec)>,
) -> Result<(), Vec<String>> {
    let errors: Vec<String> = values
        .filter(|(v, spec)| !spec.contains(*v))
        .map(|(v, spec)| match spec.kind {
            FieldKind::Binary => format!("{} {} must be 0 or 1", spec.name, v),
            _ => format!(
                "{} {} out of range [{}, {}]",
                spec.name, v, spec.min, spec.max
            ),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// What to do with a field that has no usable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingValuePolicy {
    /// Refuse the record.
    #[default]
    Reject,
    /// Substitute 0.0 for every missing field.
    ZeroFill,
}

impl std::str::FromStr for MissingValuePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "zero" | "zero_fill" | "zero-fill" => Ok(Self::ZeroFill),
            other => Err(format!(
                "unknown missing value policy {other:?} (expected \"reject\" or \"zero\")"
            )),
        }
    }
}

/// A record with no value for a required field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing value for field {field}")]
pub struct IncompleteRecord {
    pub field: &'static str,
}

/// Partially filled patient input, as typed into a form or read from JSON.
///
/// NaN is treated the same as an absent value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct PatientInput {
    pub male: Option<f64>,
    pub age: Option<f64>,
    pub current_smoker: Option<f64>,
    pub cigs_per_day: Option<f64>,
    #[serde(rename = "BPMeds")]
    pub bp_meds: Option<f64>,
    pub prevalent_stroke: Option<f64>,
    pub prevalent_hyp: Option<f64>,
    pub diabetes: Option<f64>,
    pub tot_chol: Option<f64>,
    #[serde(rename = "sysBP")]
    pub sys_bp: Option<f64>,
    #[serde(rename = "diaBP")]
    pub dia_bp: Option<f64>,
    #[serde(rename = "BMI")]
    pub bmi: Option<f64>,
    pub heart_rate: Option<f64>,
    pub glucose: Option<f64>,
}

impl PatientInput {
    /// Build input from optional values in column order.
    #[must_use]
    pub fn from_options(values: [Option<f64>; FEATURE_COUNT]) -> Self {
        let [male, age, current_smoker, cigs_per_day, bp_meds, prevalent_stroke, prevalent_hyp, diabetes, tot_chol, sys_bp, dia_bp, bmi, heart_rate, glucose] =
            values;
        Self {
            male,
            age,
            current_smoker,
            cigs_per_day,
            bp_meds,
            prevalent_stroke,
            prevalent_hyp,
            diabetes,
            tot_chol,
            sys_bp,
            dia_bp,
            bmi,
            heart_rate,
            glucose,
        }
    }

    /// Optional values in column order.
    #[must_use]
    pub fn to_options(&self) -> [Option<f64>; FEATURE_COUNT] {
        [
            self.male,
            self.age,
            self.current_smoker,
            self.cigs_per_day,
            self.bp_meds,
            self.prevalent_stroke,
            self.prevalent_hyp,
            self.diabetes,
            self.tot_chol,
            self.sys_bp,
            self.dia_bp,
            self.bmi,
            self.heart_rate,
            self.glucose,
        ]
    }

    /// Range-check the fields that carry a value.
    ///
    /// Absent and NaN fields are skipped, so this can run before a
    /// missing value policy fills them in.
    ///
    /// # Errors
    /// Returns one message per out-of-range field.
    pub fn validate_present(&self) -> Result<(), Vec<String>> {
        range_errors(
            self.to_options()
                .into_iter()
                .zip(FIELD_SPECS.iter())
                .filter_map(|(value, spec)| value.filter(|v| !v.is_nan()).map(|v| (v, spec))),
        )
    }

    /// Turn the input into a complete record.
    ///
    /// # Errors
    /// Under [`MissingValuePolicy::Reject`], returns the first missing field
    /// in column order.
    pub fn resolve(&self, policy: MissingValuePolicy) -> Result<PatientRecord, IncompleteRecord> {
        let mut row = [0.0; FEATURE_COUNT];
        for ((slot, value), field) in row.iter_mut().zip(self.to_options()).zip(FEATURE_NAMES) {
            *slot = match (value.filter(|v| !v.is_nan()), policy) {
                (Some(v), _) => v,
                (None, MissingValuePolicy::ZeroFill) => 0.0,
                (None, MissingValuePolicy::Reject) => return Err(IncompleteRecord { field }),
            };
        }
        Ok(PatientRecord::from_array(row))
    }
}

impl From<PatientRecord> for PatientInput {
    fn from(record: PatientRecord) -> Self {
        Self::from_options(record.to_row().map(Some))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_defaults() {
        let record = PatientRecord::form_defaults();
        assert!((record.age - 40.0).abs() < f64::EPSILON);
        assert!((record.tot_chol - 200.0).abs() < f64::EPSILON);
        assert!((record.bmi - 22.0).abs() < f64::EPSILON);
        assert!((record.glucose - 100.0).abs() < f64::EPSILON);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_row_follows_column_order() {
        let row: Vec<f64> = (0..FEATURE_COUNT).map(|i| i as f64).collect();
        let record = PatientRecord::from_row(&row).expect("Should parse");

        // Each serialized column must carry the value from its own index.
        let json = serde_json::to_value(record).expect("Should serialize");
        for (i, name) in FEATURE_NAMES.iter().enumerate() {
            assert_eq!(json[*name].as_f64(), Some(i as f64), "column {name}");
        }
        assert_eq!(record.to_row().to_vec(), row);
    }

    #[test]
    fn test_field_specs_match_feature_names() {
        for (spec, name) in FIELD_SPECS.iter().zip(FEATURE_NAMES) {
            assert_eq!(spec.name, name);
        }
    }

    #[test]
    fn test_from_row_wrong_length() {
        let err = PatientRecord::from_row(&[1.0; 9]).unwrap_err();
        assert!(err.contains("Expected 14"));
    }

    #[test]
    fn test_validation() {
        let mut record = PatientRecord::form_defaults();
        record.age = 0.0;
        record.diabetes = 2.0;
        record.bmi = 60.5;

        let errors = record.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.starts_with("diabetes")));
    }

    #[test]
    fn test_clamp_like_widgets() {
        let age = &FIELD_SPECS[1];
        assert!((age.clamp(150.0) - 120.0).abs() < f64::EPSILON);
        assert!((age.clamp(39.6) - 40.0).abs() < f64::EPSILON);

        let bmi = &FIELD_SPECS[11];
        assert!((bmi.clamp(22.45) - 22.45).abs() < f64::EPSILON);
        assert!((bmi.clamp(5.0) - 10.0).abs() < f64::EPSILON);

        let male = &FIELD_SPECS[0];
        assert!((male.clamp(7.0) - 1.0).abs() < f64::EPSILON);
        assert!(male.clamp(-3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resolve_rejects_missing() {
        let mut input = PatientInput::from(PatientRecord::form_defaults());
        input.glucose = None;
        input.sys_bp = Some(f64::NAN);

        let err = input.resolve(MissingValuePolicy::Reject).unwrap_err();
        assert_eq!(err.field, "sysBP");
    }

    #[test]
    fn test_resolve_zero_fills_missing() {
        let mut input = PatientInput::from(PatientRecord::form_defaults());
        input.glucose = None;
        input.bmi = Some(f64::NAN);

        let record = input
            .resolve(MissingValuePolicy::ZeroFill)
            .expect("Should fill");
        assert!(record.glucose.abs() < f64::EPSILON);
        assert!(record.bmi.abs() < f64::EPSILON);
        assert!((record.age - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_present_skips_missing() {
        let mut input = PatientInput::from(PatientRecord::form_defaults());
        input.age = None;
        input.glucose = Some(f64::NAN);
        assert!(input.validate_present().is_ok());

        input.sys_bp = Some(300.0);
        input.diabetes = Some(2.0);
        let errors = input.validate_present().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("diabetes"));
        assert!(errors[1].starts_with("sysBP"));
    }

    #[test]
    fn test_input_from_partial_json() {
        let input: PatientInput =
            serde_json::from_str(r#"{"male": 1, "sysBP": 140, "BMI": 27.5}"#).expect("Should parse");
        assert_eq!(input.male, Some(1.0));
        assert_eq!(input.sys_bp, Some(140.0));
        assert_eq!(input.bmi, Some(27.5));
        assert_eq!(input.age, None);

        let unknown = serde_json::from_str::<PatientInput>(r#"{"sysBp": 140}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_first_non_finite() {
        let mut record = PatientRecord::form_defaults();
        assert_eq!(record.first_non_finite(), None);
        record.heart_rate = f64::INFINITY;
        assert_eq!(record.first_non_finite(), Some("heartRate"));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "reject".parse::<MissingValuePolicy>(),
            Ok(MissingValuePolicy::Reject)
        );
        assert_eq!(
            "Zero".parse::<MissingValuePolicy>(),
            Ok(MissingValuePolicy::ZeroFill)
        );
        assert!("drop".parse::<MissingValuePolicy>().is_err());
    }
}
