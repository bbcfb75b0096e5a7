//! Solver configuration: built-in defaults, overridden by `QUIZMATCH_*`
//! environment variables, then by command-line flags.

use std::path::PathBuf;

use crate::format::Emphasis;
use crate::matcher::ThresholdPolicy;

pub const ENV_DATASET: &str = "QUIZMATCH_DATASET";
pub const ENV_OCR_LANG: &str = "QUIZMATCH_OCR_LANG";
pub const ENV_TESSERACT: &str = "QUIZMATCH_TESSERACT";
pub const ENV_THRESHOLD: &str = "QUIZMATCH_THRESHOLD";

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub dataset_path: PathBuf,
    /// Tesseract traineddata code.
    pub ocr_language: String,
    pub tesseract_bin: PathBuf,
    /// Minimum confidence as a percentage (0–100). `None` never rejects.
    pub confidence_threshold: Option<f64>,
    pub emphasis: Emphasis,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("databases/questions.json"),
            ocr_language: "spa".to_string(),
            tesseract_bin: PathBuf::from("tesseract"),
            confidence_threshold: None,
            emphasis: Emphasis::Html,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidThreshold(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidThreshold(raw) => {
                write!(f, "invalid confidence threshold {raw:?} (expected 0-100)")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a percentage in [0, 100].
pub fn parse_threshold(raw: &str) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if (0.0..=100.0).contains(&v) => Ok(v),
        _ => Err(ConfigError::InvalidThreshold(raw.to_string())),
    }
}

impl SolverConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup(key)` for each `QUIZMATCH_*` key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(path) = lookup(ENV_DATASET) {
            cfg.dataset_path = PathBuf::from(path);
        }
        if let Some(lang) = lookup(ENV_OCR_LANG) {
            cfg.ocr_language = lang;
        }
        if let Some(bin) = lookup(ENV_TESSERACT) {
            cfg.tesseract_bin = PathBuf::from(bin);
        }
        if let Some(raw) = lookup(ENV_THRESHOLD) {
            cfg.confidence_threshold = Some(parse_threshold(&raw)?);
        }
        Ok(cfg)
    }

    pub fn threshold_policy(&self) -> ThresholdPolicy {
        match self.confidence_threshold {
            Some(percent) => ThresholdPolicy::from_percent(percent),
            None => ThresholdPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn lookup_overrides_defaults() {
        let env: HashMap<&str, &str> = [
            (ENV_DATASET, "/tmp/q.json"),
            (ENV_OCR_LANG, "eng"),
            (ENV_THRESHOLD, "75"),
        ]
        .into_iter()
        .collect();

        let cfg = SolverConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.dataset_path, PathBuf::from("/tmp/q.json"));
        assert_eq!(cfg.ocr_language, "eng");
        assert_eq!(cfg.tesseract_bin, PathBuf::from("tesseract"));
        assert_eq!(cfg.confidence_threshold, Some(75.0));
        assert_eq!(cfg.threshold_policy().min_confidence, Some(0.75));
    }

    #[test]
    fn empty_lookup_gives_defaults() {
        let cfg = SolverConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg, SolverConfig::default());
        assert_eq!(cfg.threshold_policy(), ThresholdPolicy::default());
    }

    #[test]
    fn threshold_must_be_a_percentage() {
        assert!(parse_threshold("101").is_err());
        assert!(parse_threshold("-1").is_err());
        assert!(parse_threshold("abc").is_err());
        assert_eq!(parse_threshold(" 12.5 ").unwrap(), 12.5);
    }
}
