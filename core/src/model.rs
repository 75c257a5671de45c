//! Binary logistic regression.
//!
//! Objective: 0.5 * |w|^2 + C * sum(log-loss), intercept unpenalised.
//! Solved with Newton steps and a backtracking line search, starting
//! from zero, until the Newton decrement drops below `tol`.
//! No scaling, no split: every row is used for fitting.
//!
//! RULE: The solver never sees a missing value. `fit` rejects the row
//! with `MissingFeatureValue` before any iteration runs.

use crate::{
    config::ModelConfig,
    error::{TriageError, TriageResult},
    features::{FeatureMatrix, FEATURE_COLUMNS, FEATURE_COUNT},
    types::LabelClass,
};
use serde::{Deserialize, Serialize};

/// Weights plus the intercept in the last slot.
const PARAM_COUNT: usize = FEATURE_COUNT + 1;
const ARMIJO: f64 = 1e-4;
const MAX_HALVINGS: usize = 60;

type Params = [f64; PARAM_COUNT];
type Hessian = [[f64; PARAM_COUNT]; PARAM_COUNT];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogisticModel {
    /// One weight per feature, in `FEATURE_COLUMNS` order.
    pub weights: [f64; FEATURE_COUNT],
    pub intercept: f64,
    /// Sorted class values; `classes[1]` is the positive class.
    pub classes: [LabelClass; 2],
    pub iterations: usize,
    pub converged: bool,
}

impl LogisticModel {
    pub fn decision(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        self.intercept + dot(&self.weights, x)
    }

    /// Probability of the positive class, in [0, 1].
    pub fn probability(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        sigmoid(self.decision(x))
    }

    /// Feature name paired with its weight.
    pub fn named_weights(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_COLUMNS.iter().copied().zip(self.weights.iter().copied())
    }
}

/// Fit on the full matrix. Labels must be present, aligned with the rows,
/// and contain exactly two classes.
pub fn fit(
    features: &FeatureMatrix,
    labels: &[Option<LabelClass>],
    config: &ModelConfig,
) -> TriageResult<LogisticModel> {
    if labels.len() != features.len() {
        return Err(TriageError::LabelLengthMismatch {
            labels: labels.len(),
            rows: features.len(),
        });
    }
    if features.is_empty() {
        return Err(TriageError::EmptyTrainingSet);
    }

    let x = features.dense()?;

    let mut raw = Vec::with_capacity(labels.len());
    for (row, label) in labels.iter().enumerate() {
        match label {
            Some(v) => raw.push(*v),
            None => {
                return Err(TriageError::InvalidLabel {
                    row,
                    alert_id: features.rows()[row].alert_id.clone(),
                })
            }
        }
    }
    let mut found = raw.clone();
    found.sort_unstable();
    found.dedup();
    if found.len() != 2 {
        return Err(TriageError::NotBinary { found });
    }
    let classes = [found[0], found[1]];
    let y: Vec<f64> = raw
        .iter()
        .map(|v| if *v == classes[1] { 1.0 } else { 0.0 })
        .collect();

    let c = config.c;
    let mut theta: Params = [0.0; PARAM_COUNT];
    let mut loss = objective(&theta, &x, &y, c);
    let mut iterations = 0;
    let mut converged = false;

    loop {
        let (grad, hess) = gradient_and_hessian(&theta, &x, &y, c);
        // Newton direction; fall back to the gradient if the system is singular.
        let direction = solve(hess, grad).unwrap_or(grad);
        let slope = dot(&grad, &direction);

        // Newton decrement: half the predicted loss reduction of a full step.
        if 0.5 * slope <= config.tol {
            converged = true;
            break;
        }
        if iterations >= config.max_iter {
            log::warn!(
                "Solver hit max_iter={} without converging (decrement={:.3e})",
                config.max_iter,
                0.5 * slope
            );
            break;
        }
        iterations += 1;

        let mut step = 1.0;
        let mut accepted = None;
        for _ in 0..MAX_HALVINGS {
            let candidate = axpy(&theta, -step, &direction);
            let candidate_loss = objective(&candidate, &x, &y, c);
            if candidate_loss <= loss - ARMIJO * step * slope {
                accepted = Some((candidate, candidate_loss));
                break;
            }
            step *= 0.5;
        }

        match accepted {
            Some((next, next_loss)) => {
                theta = next;
                loss = next_loss;
            }
            None => {
                log::warn!("Line search stalled after {iterations} iterations");
                break;
            }
        }
    }

    log::debug!("Fit finished: iterations={iterations} converged={converged} loss={loss:.6}");

    let mut weights = [0.0; FEATURE_COUNT];
    weights.copy_from_slice(&theta[..FEATURE_COUNT]);
    Ok(LogisticModel {
        weights,
        intercept: theta[FEATURE_COUNT],
        classes,
        iterations,
        converged,
    })
}

// ── Numerics ─────────────────────────────────────────────────────────────────

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// log(1 + e^z) without overflow.
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

fn linear(theta: &Params, row: &[f64; FEATURE_COUNT]) -> f64 {
    theta[FEATURE_COUNT] + dot(&theta[..FEATURE_COUNT], row)
}

fn objective(theta: &Params, x: &[[f64; FEATURE_COUNT]], y: &[f64], c: f64) -> f64 {
    let penalty = 0.5 * dot(&theta[..FEATURE_COUNT], &theta[..FEATURE_COUNT]);
    let data: f64 = x
        .iter()
        .zip(y)
        .map(|(row, yi)| {
            let z = linear(theta, row);
            softplus(z) - yi * z
        })
        .sum();
    penalty + c * data
}

fn gradient_and_hessian(
    theta: &Params,
    x: &[[f64; FEATURE_COUNT]],
    y: &[f64],
    c: f64,
) -> (Params, Hessian) {
    let mut grad: Params = [0.0; PARAM_COUNT];
    let mut hess: Hessian = [[0.0; PARAM_COUNT]; PARAM_COUNT];

    for (row, yi) in x.iter().zip(y) {
        let p = sigmoid(linear(theta, row));
        let r = p - yi;
        let w = p * (1.0 - p);
        let xi = augmented(row);
        for j in 0..PARAM_COUNT {
            grad[j] += c * r * xi[j];
            for k in 0..PARAM_COUNT {
                hess[j][k] += c * w * xi[j] * xi[k];
            }
        }
    }
    for j in 0..FEATURE_COUNT {
        grad[j] += theta[j];
        hess[j][j] += 1.0;
    }
    (grad, hess)
}

/// Feature row with a trailing 1.0 for the intercept.
fn augmented(row: &[f64; FEATURE_COUNT]) -> Params {
    let mut out = [1.0; PARAM_COUNT];
    out[..FEATURE_COUNT].copy_from_slice(row);
    out
}

/// Gaussian elimination with partial pivoting. None if singular.
fn solve(mut a: Hessian, mut b: Params) -> Option<Params> {
    let n = PARAM_COUNT;
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut out = [0.0; PARAM_COUNT];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * out[k]).sum();
        out[row] = (b[row] - tail) / a[row][row];
    }
    out.iter().all(|v| v.is_finite()).then_some(out)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn axpy(base: &Params, alpha: f64, dir: &Params) -> Params {
    let mut out = *base;
    for (o, d) in out.iter_mut().zip(dir) {
        *o += alpha * d;
    }
    out
}
