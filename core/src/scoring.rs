//! Scoring and result assembly.
//!
//! `predict` is pure: same model and matrix, same scores, same order.

use crate::{
    error::{TriageError, TriageResult},
    features::FeatureMatrix,
    model::LogisticModel,
    records::ScoredAlert,
    tables::AlertTable,
};

/// Positive-class probability for every row, aligned with the input.
pub fn predict(model: &LogisticModel, features: &FeatureMatrix) -> TriageResult<Vec<f64>> {
    let x = features.dense()?;
    Ok(x.iter().map(|row| model.probability(row)).collect())
}

/// Attach scores to the alerts they were computed for.
pub fn assemble(alerts: &AlertTable, scores: &[f64]) -> TriageResult<Vec<ScoredAlert>> {
    if alerts.len() != scores.len() {
        return Err(TriageError::ScoreLengthMismatch {
            scores: scores.len(),
            alerts: alerts.len(),
        });
    }
    Ok(alerts
        .rows
        .iter()
        .zip(scores)
        .map(|(a, score)| ScoredAlert {
            alert_id: a.alert_id.clone(),
            customer_id: a.customer_id.clone(),
            alert_type: a.alert_type.clone(),
            priority_score: *score,
        })
        .collect())
}
