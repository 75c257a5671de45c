//! Feature builder: joins the three input tables into one numeric row per alert.
//!
//! Steps, in order:
//!   1. Aggregate transactions per customer (mean amount, row count)
//!   2. Map customer risk categories to ordinals
//!   3. Left-join alerts -> customer risk -> transaction aggregates
//!   4. Fill missing mean_tx_amount with the joined column's mean,
//!      missing tx_count with 0
//!   5. Encode is_aml
//!
//! RULE: Every alert produces exactly one row, in input order.
//! Unmatched joins and unknown risk bands stay missing here; rejecting
//! them is the classifier's job.

use crate::{
    error::{TriageError, TriageResult},
    records::{CustomerRecord, TransactionRecord},
    tables::{AlertTable, InputTables},
    types::{AlertId, LabelClass},
};
use serde::Serialize;
use std::collections::HashMap;

pub const FEATURE_COUNT: usize = 4;

/// Column order of the feature matrix. Never reorder: model weights
/// are positional.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] =
    ["risk_num", "is_aml", "mean_tx_amount", "tx_count"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub alert_id: AlertId,
    pub risk_num: Option<f64>,
    pub is_aml: f64,
    pub mean_tx_amount: Option<f64>,
    pub tx_count: f64,
}

impl FeatureRow {
    pub fn values(&self) -> [Option<f64>; FEATURE_COUNT] {
        [
            self.risk_num,
            Some(self.is_aml),
            self.mean_tx_amount,
            Some(self.tx_count),
        ]
    }

    /// Dense values, or the name of the first missing column.
    pub fn dense(&self) -> Result<[f64; FEATURE_COUNT], &'static str> {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, value) in self.values().into_iter().enumerate() {
            out[i] = value.ok_or(FEATURE_COLUMNS[i])?;
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureMatrix {
    rows: Vec<FeatureRow>,
}

impl FeatureMatrix {
    pub fn new(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Dense matrix for the solver. Fails on the first missing value.
    pub fn dense(&self) -> TriageResult<Vec<[f64; FEATURE_COUNT]>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(row, r)| {
                r.dense().map_err(|column| TriageError::MissingFeatureValue {
                    row,
                    alert_id: r.alert_id.clone(),
                    column,
                })
            })
            .collect()
    }
}

/// Label vector for training. `Absent` means the alerts table had no
/// `priority_flag` column at all, which is different from zero rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Labels {
    Present(Vec<Option<LabelClass>>),
    Absent,
}

impl Labels {
    /// The label values, or `MissingLabels` if none were supplied.
    pub fn require(&self) -> TriageResult<&[Option<LabelClass>]> {
        match self {
            Self::Present(values) => Ok(values),
            Self::Absent => Err(TriageError::MissingLabels),
        }
    }
}

/// Per-customer transaction summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TxAggregate {
    /// Mean over rows with an amount. None if no row had one.
    pub mean_amount: Option<f64>,
    /// All rows for the customer, with or without an amount.
    pub count: usize,
}

/// Group transactions by customer. Customers without transactions get
/// no entry at all.
pub fn aggregate_transactions(transactions: &[TransactionRecord]) -> HashMap<&str, TxAggregate> {
    // (sum, amounts seen, rows)
    let mut acc: HashMap<&str, (f64, usize, usize)> = HashMap::new();
    for tx in transactions {
        let entry = acc.entry(tx.customer_id.as_str()).or_insert((0.0, 0, 0));
        if let Some(amount) = tx.amount.filter(|a| !a.is_nan()) {
            entry.0 += amount;
            entry.1 += 1;
        }
        entry.2 += 1;
    }
    acc.into_iter()
        .map(|(cid, (sum, seen, rows))| {
            let mean_amount = (seen > 0).then(|| sum / seen as f64);
            (cid, TxAggregate { mean_amount, count: rows })
        })
        .collect()
}

/// Customer id -> risk ordinal (None for unknown bands). First row wins
/// on duplicate ids.
fn risk_lookup(customers: &[CustomerRecord]) -> HashMap<&str, Option<f64>> {
    use std::collections::hash_map::Entry;

    let mut lookup = HashMap::with_capacity(customers.len());
    for c in customers {
        let risk = c.risk();
        if risk.ordinal().is_none() {
            log::debug!(
                "Customer {} has unmapped risk category {:?}",
                c.customer_id,
                risk.as_str()
            );
        }
        match lookup.entry(c.customer_id.as_str()) {
            Entry::Occupied(_) => log::warn!("Duplicate customer_id {} ignored", c.customer_id),
            Entry::Vacant(slot) => {
                slot.insert(risk.ordinal().map(f64::from));
            }
        }
    }
    lookup
}

/// Build the feature matrix and label vector.
pub fn build(
    alerts: &AlertTable,
    customers: &[CustomerRecord],
    transactions: &[TransactionRecord],
) -> (FeatureMatrix, Labels) {
    let tx_agg = aggregate_transactions(transactions);
    let risk = risk_lookup(customers);

    let mut rows: Vec<FeatureRow> = alerts
        .rows
        .iter()
        .map(|alert| {
            let cid = alert.customer_id.as_str();
            let agg = tx_agg.get(cid);
            FeatureRow {
                alert_id: alert.alert_id.clone(),
                risk_num: risk.get(cid).copied().flatten(),
                is_aml: if alert.is_aml() { 1.0 } else { 0.0 },
                mean_tx_amount: agg.and_then(|a| a.mean_amount),
                tx_count: agg.map_or(0, |a| a.count) as f64,
            }
        })
        .collect();

    // Fill value is the mean of the joined column, so a customer with
    // several alerts counts several times.
    let joined: Vec<f64> = rows.iter().filter_map(|r| r.mean_tx_amount).collect();
    let fill = (!joined.is_empty()).then(|| joined.iter().sum::<f64>() / joined.len() as f64);
    let mut filled = 0usize;
    for row in rows.iter_mut().filter(|r| r.mean_tx_amount.is_none()) {
        row.mean_tx_amount = fill;
        filled += 1;
    }

    log::debug!(
        "Built {} feature rows: {} risk-matched, {} mean_tx_amount filled with {:?}",
        rows.len(),
        rows.iter().filter(|r| r.risk_num.is_some()).count(),
        filled,
        fill
    );

    let labels = if alerts.has_priority_flag {
        Labels::Present(alerts.rows.iter().map(|a| a.priority_flag).collect())
    } else {
        Labels::Absent
    };

    (FeatureMatrix::new(rows), labels)
}

/// `build` over a loaded set of tables.
pub fn build_from(tables: &InputTables) -> (FeatureMatrix, Labels) {
    build(&tables.alerts, &tables.customers, &tables.transactions)
}
