//! Score one patient record from the command line.
//!
//! Reads a JSON object with the fourteen model columns (`male`, `age`,
//! `currentSmoker`, ..., `glucose`) and prints the prediction as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin predict_record -- patient.json
//! echo '{"male": 1, "age": 40, ...}' | cargo run --bin predict_record -- -
//! ```
//!
//! Model location and missing value policy come from the same
//! `CARDIORISK_*` environment variables as the terminal form.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cardiorisk::domain::{MissingValuePolicy, PatientInput};
use cardiorisk::{AppConfig, PredictionResult, PredictorGateway};

#[derive(Serialize)]
struct Output<'a> {
    #[serde(flatten)]
    result: &'a PredictionResult,
    probability_percent: String,
}

fn usage() -> String {
    "Usage: predict_record [--zero-fill] <record.json | ->".to_string()
}

fn parse_args() -> std::result::Result<(Option<PathBuf>, bool), String> {
    let mut input: Option<PathBuf> = None;
    let mut zero_fill = false;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--zero-fill" => zero_fill = true,
            "-h" | "--help" => return Err(usage()),
            "-" if input.is_none() => input = None,
            _ if input.is_none() && !arg.starts_with("--") => {
                input = Some(PathBuf::from(arg.as_str()));
            }
            _ => return Err(usage()),
        }
    }

    Ok((input, zero_fill))
}

fn read_input(path: Option<&PathBuf>) -> Result<PatientInput> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("Invalid patient record JSON")
}

/// Range-check what was given, then predict under the configured policy.
///
/// Only present fields are range-checked: a zero-filled field is the
/// policy's substitute, not patient data.
fn score(input: &PatientInput, config: &AppConfig) -> Result<PredictionResult> {
    if let Err(errors) = input.validate_present() {
        bail!("Patient record out of range: {}", errors.join(", "));
    }

    let gateway = PredictorGateway::new(config.artifact_loader())
        .with_missing_value_policy(config.missing_values);
    gateway
        .predict_input(input)
        .with_context(|| format!("Prediction failed (model {})", config.model_path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (path, zero_fill) = parse_args().map_err(anyhow::Error::msg)?;

    let mut config = AppConfig::from_env()?;
    if zero_fill {
        config.missing_values = MissingValuePolicy::ZeroFill;
    }

    let input = read_input(path.as_ref())?;
    let result = score(&input, &config)?;

    let output = Output {
        result: &result,
        probability_percent: result.probability_percent(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(policy: MissingValuePolicy) -> AppConfig {
        let model = concat!(env!("CARGO_MANIFEST_DIR"), "/models/heart_model.json");
        let mut config = AppConfig::from_lookup(|key| {
            (key == "CARDIORISK_MODEL_PATH").then(|| model.to_string())
        })
        .expect("Should build config");
        config.missing_values = policy;
        config
    }

    fn input_without_age() -> PatientInput {
        serde_json::from_str(
            r#"{"male": 1, "currentSmoker": 0, "cigsPerDay": 0, "BPMeds": 0,
                "prevalentStroke": 0, "prevalentHyp": 0, "diabetes": 0,
                "totChol": 200, "sysBP": 120, "diaBP": 80, "BMI": 22.0,
                "heartRate": 75, "glucose": 100}"#,
        )
        .expect("Should parse")
    }

    #[test]
    fn test_zero_fill_missing_bounded_field() {
        let result = score(&input_without_age(), &config(MissingValuePolicy::ZeroFill))
            .expect("Zero-filled age should still predict");
        assert!((0.0..=1.0).contains(&result.probability));
    }

    #[test]
    fn test_reject_missing_field() {
        let err = score(&input_without_age(), &config(MissingValuePolicy::Reject)).unwrap_err();
        assert!(format!("{err:#}").contains("age"));
    }

    #[test]
    fn test_out_of_range_present_field() {
        let mut input = input_without_age();
        input.sys_bp = Some(400.0);
        let err = score(&input, &config(MissingValuePolicy::ZeroFill)).unwrap_err();
        assert!(err.to_string().contains("sysBP"));
    }
}
