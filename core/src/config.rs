//! Pipeline configuration.
//!
//! RULE: Paths are always passed in explicitly. Nothing here looks at
//! the running executable's location.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const ALERTS_FILE: &str = "alerts.csv";
pub const CUSTOMERS_FILE: &str = "customers.csv";
pub const TRANSACTIONS_FILE: &str = "transactions.csv";
pub const OUTPUT_FILE: &str = "priority_scores.csv";

/// Solver settings for the logistic regression fit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Hard cap on solver iterations.
    pub max_iter: usize,
    /// Inverse L2 regularisation strength. The intercept is never penalised.
    pub c: f64,
    /// Stop once half the Newton decrement (g' H^-1 g / 2) falls below this.
    pub tol: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            c: 1.0,
            tol: 1e-10,
        }
    }
}

/// Shape of the synthetic dataset written by `synth::generate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthConfig {
    pub customers: usize,
    pub alerts: usize,
    /// Mean transaction rows per customer that has any.
    pub mean_txns_per_customer: f64,
    /// Share of customers with no transactions at all.
    pub inactive_share: f64,
    /// Weights for Low / Medium / High.
    pub risk_weights: [f64; 3],
    /// Share of alerts typed AML (the rest are KYC).
    pub aml_share: f64,
    /// Share of alert types written in non-canonical case ("aml", "Kyc").
    pub mixed_case_share: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            customers: 200,
            alerts: 500,
            mean_txns_per_customer: 6.0,
            inactive_share: 0.10,
            risk_weights: [0.60, 0.30, 0.10],
            aml_share: 0.55,
            mixed_case_share: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TriageConfig {
    /// Directory holding alerts.csv, customers.csv and transactions.csv.
    pub raw_dir: PathBuf,
    /// Directory the scored output is written to. Created if missing.
    pub output_dir: PathBuf,
    pub output_file: String,
    pub model: ModelConfig,
    pub synth: SynthConfig,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self::from_data_dir(DEFAULT_DATA_DIR)
    }
}

impl TriageConfig {
    /// Standard layout: `<data_dir>/raw` in, `<data_dir>/outputs` out.
    pub fn from_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            raw_dir: data_dir.join("raw"),
            output_dir: data_dir.join("outputs"),
            output_file: OUTPUT_FILE.to_string(),
            model: ModelConfig::default(),
            synth: SynthConfig::default(),
        }
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::load_over(Self::default(), path)
    }

    /// Load from a JSON file, taking missing fields from `base` instead
    /// of the defaults. Nested objects merge key by key.
    pub fn load_over(base: TriageConfig, path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        Self::from_json_over(base, &content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))
    }

    fn from_json_over(base: TriageConfig, json: &str) -> serde_json::Result<Self> {
        let overlay: serde_json::Value = serde_json::from_str(json)?;
        let mut merged = serde_json::to_value(base)?;
        merge_json(&mut merged, overlay);
        serde_json::from_value(merged)
    }

    pub fn alerts_path(&self) -> PathBuf {
        self.raw_dir.join(ALERTS_FILE)
    }

    pub fn customers_path(&self) -> PathBuf {
        self.raw_dir.join(CUSTOMERS_FILE)
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.raw_dir.join(TRANSACTIONS_FILE)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }
}

fn merge_json(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_layout() {
        let config = TriageConfig::from_data_dir("/tmp/triage");
        assert_eq!(config.alerts_path(), PathBuf::from("/tmp/triage/raw/alerts.csv"));
        assert_eq!(
            config.output_path(),
            PathBuf::from("/tmp/triage/outputs/priority_scores.csv")
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: TriageConfig =
            serde_json::from_str(r#"{ "model": { "max_iter": 50 } }"#).unwrap();
        assert_eq!(config.model.max_iter, 50);
        assert_eq!(config.model.c, 1.0);
        assert_eq!(config.output_file, OUTPUT_FILE);
        assert_eq!(config.synth, SynthConfig::default());
    }

    #[test]
    fn file_fields_land_on_top_of_base() {
        let base = TriageConfig::from_data_dir("/srv/triage");
        let config = TriageConfig::from_json_over(
            base,
            r#"{ "output_file": "scores.csv", "model": { "max_iter": 50 } }"#,
        )
        .unwrap();
        assert_eq!(config.raw_dir, PathBuf::from("/srv/triage/raw"));
        assert_eq!(config.output_path(), PathBuf::from("/srv/triage/outputs/scores.csv"));
        assert_eq!(config.model.max_iter, 50);
        assert_eq!(config.model.c, 1.0);
    }

    #[test]
    fn file_paths_override_base() {
        let base = TriageConfig::from_data_dir("/srv/triage");
        let config =
            TriageConfig::from_json_over(base, r#"{ "raw_dir": "/elsewhere/in" }"#).unwrap();
        assert_eq!(config.raw_dir, PathBuf::from("/elsewhere/in"));
        assert_eq!(config.output_dir, PathBuf::from("/srv/triage/outputs"));
    }
}
