//! The triage pipeline: raw tables in, one scored CSV out.
//!
//! EXECUTION ORDER (fixed, single pass):
//!   1. Load alerts, customers, transactions
//!   2. Build features and labels
//!   3. Require labels (MissingLabels is fatal)
//!   4. Fit the classifier on every row
//!   5. Predict a priority score per alert
//!   6. Assemble and write priority_scores.csv
//!
//! RULES:
//!   - Each step consumes the previous step's value; nothing is shared.
//!   - The output file is written only after every earlier step succeeded.
//!   - All paths come from TriageConfig.

use crate::{
    config::TriageConfig,
    error::TriageResult,
    features::{self, FeatureMatrix},
    model::{self, LogisticModel},
    records::ScoredAlert,
    scoring,
    tables::{self, InputTables},
};
use serde::Serialize;
use std::path::PathBuf;

/// Everything produced by one in-memory scoring pass.
#[derive(Debug, Clone)]
pub struct ScoringOutcome {
    pub features: FeatureMatrix,
    pub model: LogisticModel,
    pub scored: Vec<ScoredAlert>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub output_path: PathBuf,
    pub model: LogisticModel,
}

pub struct TriagePipeline {
    config: TriageConfig,
}

impl TriagePipeline {
    pub fn new(config: TriageConfig) -> Self {
        Self { config }
    }

    /// Full run against the configured directories.
    pub fn run(&self) -> TriageResult<RunSummary> {
        let tables = InputTables::load(
            &self.config.alerts_path(),
            &self.config.customers_path(),
            &self.config.transactions_path(),
        )?;

        let outcome = self.score_tables(&tables)?;

        let output_path = self.config.output_path();
        tables::write_scores(&output_path, &outcome.scored)?;
        log::info!(
            "Wrote {} priority scores to {}",
            outcome.scored.len(),
            output_path.display()
        );

        Ok(RunSummary {
            rows: outcome.scored.len(),
            output_path,
            model: outcome.model,
        })
    }

    /// Steps 2-6 without touching the filesystem.
    pub fn score_tables(&self, tables: &InputTables) -> TriageResult<ScoringOutcome> {
        let (features, labels) = features::build_from(tables);
        let labels = labels.require()?;

        let model = model::fit(&features, labels, &self.config.model)?;
        for (name, weight) in model.named_weights() {
            log::debug!("  weight {name:<16} {weight:+.6}");
        }
        log::info!(
            "Model fit on {} alerts ({} iterations, converged={})",
            features.len(),
            model.iterations,
            model.converged
        );

        let scores = scoring::predict(&model, &features)?;
        let scored = scoring::assemble(&tables.alerts, &scores)?;

        Ok(ScoringOutcome { features, model, scored })
    }
}
