//! Environment-driven configuration.
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `CARDIORISK_MODEL_PATH` | model artifact file | `heart_model.json` next to the executable, else `models/heart_model.json` |
//! | `CARDIORISK_MODEL_SHA256` | pin the artifact digest | unset |
//! | `CARDIORISK_MISSING_VALUES` | `reject` or `zero` | `reject` |
//! | `CARDIORISK_LOG_MODE` | `auto`, `file` or `stdout` | `auto` |
//! | `CARDIORISK_LOG_FILE` | log file for file mode | `cardiorisk.log` |

use std::path::{Path, PathBuf};

use crate::adapters::{LogisticArtifactLoader, ARTIFACT_FILE_NAME};
use crate::domain::MissingValuePolicy;
use crate::{CardioriskError, Result};

const MODEL_PATH_ENV: &str = "CARDIORISK_MODEL_PATH";
const MODEL_SHA256_ENV: &str = "CARDIORISK_MODEL_SHA256";
const MISSING_VALUES_ENV: &str = "CARDIORISK_MISSING_VALUES";
const LOG_MODE_ENV: &str = "CARDIORISK_LOG_MODE";
const LOG_FILE_ENV: &str = "CARDIORISK_LOG_FILE";

const DEFAULT_LOG_FILE: &str = "cardiorisk.log";
const BUNDLED_MODEL_DIR: &str = "models";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when attached to a terminal, stdout otherwise.
    #[default]
    Auto,
    File,
    Stdout,
}

impl std::str::FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "file" => Ok(Self::File),
            "stdout" => Ok(Self::Stdout),
            other => Err(format!(
                "unknown log mode {other:?} (expected \"auto\", \"file\" or \"stdout\")"
            )),
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub model_sha256: Option<String>,
    pub missing_values: MissingValuePolicy,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl AppConfig {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `CardioriskError::Config` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// # Errors
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let model_path = match var(MODEL_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => Self::default_model_path(),
        };

        let model_sha256 = var(MODEL_SHA256_ENV)
            .map(|digest| parse_sha256(&digest))
            .transpose()?;

        let missing_values = var(MISSING_VALUES_ENV)
            .map(|v| v.parse::<MissingValuePolicy>())
            .transpose()
            .map_err(|e| CardioriskError::Config(format!("{MISSING_VALUES_ENV}: {e}")))?
            .unwrap_or_default();

        let log_mode = var(LOG_MODE_ENV)
            .map(|v| v.parse::<LogMode>())
            .transpose()
            .map_err(|e| CardioriskError::Config(format!("{LOG_MODE_ENV}: {e}")))?
            .unwrap_or_default();

        let log_file = var(LOG_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        Ok(Self {
            model_path,
            model_sha256,
            missing_values,
            log_mode,
            log_file,
        })
    }

    /// `heart_model.json` next to the running executable when one is there,
    /// otherwise the bundled `models/heart_model.json`.
    #[must_use]
    pub fn default_model_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        model_path_near(exe_dir.as_deref())
    }

    /// Loader for the configured artifact.
    #[must_use]
    pub fn artifact_loader(&self) -> LogisticArtifactLoader {
        let loader = LogisticArtifactLoader::new(&self.model_path);
        match &self.model_sha256 {
            Some(digest) => loader.with_expected_sha256(digest.clone()),
            None => loader,
        }
    }
}

fn model_path_near(exe_dir: Option<&Path>) -> PathBuf {
    exe_dir
        .map(|dir| dir.join(ARTIFACT_FILE_NAME))
        .filter(|path| path.is_file())
        .unwrap_or_else(|| Path::new(BUNDLED_MODEL_DIR).join(ARTIFACT_FILE_NAME))
}

fn parse_sha256(raw: &str) -> Result<String> {
    let digest = raw.trim().to_ascii_lowercase();
    if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CardioriskError::Config(format!(
            "{MODEL_SHA256_ENV} must be 64 hex characters"
        )));
    }
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).expect("Should build defaults");
        assert_eq!(
            config.model_path.file_name().and_then(|n| n.to_str()),
            Some(ARTIFACT_FILE_NAME)
        );
        assert!(config.model_sha256.is_none());
        assert_eq!(config.missing_values, MissingValuePolicy::Reject);
        assert_eq!(config.log_mode, LogMode::Auto);
        assert_eq!(config.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_overrides() {
        let digest = "AB".repeat(32);
        let config = config_from(&[
            (MODEL_PATH_ENV, "/srv/models/heart_model.json"),
            (MODEL_SHA256_ENV, digest.as_str()),
            (MISSING_VALUES_ENV, "zero"),
            (LOG_MODE_ENV, "stdout"),
            (LOG_FILE_ENV, "/tmp/cr.log"),
        ])
        .expect("Should parse");

        assert_eq!(
            config.model_path,
            PathBuf::from("/srv/models/heart_model.json")
        );
        assert_eq!(config.model_sha256.as_deref(), Some("ab".repeat(32).as_str()));
        assert_eq!(config.missing_values, MissingValuePolicy::ZeroFill);
        assert_eq!(config.log_mode, LogMode::Stdout);
        assert_eq!(config.artifact_loader().path(), config.model_path.as_path());
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = config_from(&[(MISSING_VALUES_ENV, "  "), (MODEL_PATH_ENV, "")])
            .expect("Should parse");
        assert_eq!(config.missing_values, MissingValuePolicy::Reject);
        assert_eq!(
            config.model_path.file_name().and_then(|n| n.to_str()),
            Some(ARTIFACT_FILE_NAME)
        );
    }

    #[test]
    fn test_default_model_path_prefers_exe_dir() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        assert_eq!(
            model_path_near(Some(dir.path())),
            Path::new("models").join(ARTIFACT_FILE_NAME)
        );
        assert_eq!(
            model_path_near(None),
            Path::new("models").join(ARTIFACT_FILE_NAME)
        );

        let beside = dir.path().join(ARTIFACT_FILE_NAME);
        std::fs::write(&beside, "{}").expect("Should write");
        assert_eq!(model_path_near(Some(dir.path())), beside);
    }

    #[test]
    fn test_default_model_path_finds_bundled_model() {
        // Test binaries live under target/, which holds no artifact.
        let path = AppConfig::default_model_path();
        assert_eq!(path, Path::new("models").join(ARTIFACT_FILE_NAME));
        assert!(path.is_file());
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            (MODEL_SHA256_ENV, "abc"),
            (MISSING_VALUES_ENV, "median"),
            (LOG_MODE_ENV, "syslog"),
        ] {
            let err = config_from(&[(key, value)]).unwrap_err();
            assert!(matches!(err, CardioriskError::Config(_)), "{key}");
        }
    }
}
