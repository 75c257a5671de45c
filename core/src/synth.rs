//! Synthetic alert, customer and transaction generator.
//!
//! Produces a labelled dataset with real signal: the priority flag is
//! drawn from a latent logistic of customer risk, alert type and
//! transaction size, so a fitted model should rank high-risk AML alerts
//! above low-risk KYC ones.
//!
//! All randomness flows through the RngBank; one stream per table.

use crate::{
    config::SynthConfig,
    features::aggregate_transactions,
    model::sigmoid,
    records::{AlertRecord, CustomerRecord, RiskCategory, TransactionRecord},
    rng::{RngBank, TableRng, TableStream},
    tables::{AlertTable, InputTables},
};

const RISK_BANDS: [RiskCategory; 3] = [RiskCategory::Low, RiskCategory::Medium, RiskCategory::High];
const TX_TYPES: [&str; 4] = ["purchase", "deposit", "transfer", "withdrawal"];
const TX_COUNTRIES: [&str; 6] = ["US", "CA", "UK", "DE", "AE", "PA"];

// Latent label model.
const LABEL_BIAS: f64 = -2.4;
const LABEL_RISK_WEIGHT: f64 = 1.1;
const LABEL_AML_WEIGHT: f64 = 0.9;
const LABEL_AMOUNT_WEIGHT: f64 = 0.35;

/// Generate all three tables from a master seed.
pub fn generate(config: &SynthConfig, seed: u64) -> InputTables {
    let bank = RngBank::new(seed);
    let mut customer_rng = bank.for_stream(TableStream::Customer);
    let mut transaction_rng = bank.for_stream(TableStream::Transaction);
    let mut alert_rng = bank.for_stream(TableStream::Alert);

    let customers = generate_customers(config, &mut customer_rng);
    let transactions = generate_transactions(config, &customers, &mut transaction_rng);
    let alerts = generate_alerts(config, &customers, &transactions, &mut alert_rng);

    for rng in [&customer_rng, &transaction_rng, &alert_rng] {
        log::debug!("{} stream: {} draws", rng.stream().name(), rng.draws());
    }
    log::info!(
        "Generated {} customers, {} transactions, {} alerts (seed {seed})",
        customers.len(),
        transactions.len(),
        alerts.len()
    );
    InputTables {
        alerts: AlertTable::new(alerts, true),
        customers,
        transactions,
    }
}

fn customer_id(index: usize) -> String {
    format!("C{:05}", index + 1)
}

fn generate_customers(config: &SynthConfig, rng: &mut TableRng) -> Vec<CustomerRecord> {
    (0..config.customers)
        .map(|i| {
            let band = &RISK_BANDS[rng.weighted(&config.risk_weights)];
            CustomerRecord {
                customer_id: customer_id(i),
                risk_category: Some(band.as_str().to_string()),
            }
        })
        .collect()
}

fn generate_transactions(
    config: &SynthConfig,
    customers: &[CustomerRecord],
    rng: &mut TableRng,
) -> Vec<TransactionRecord> {
    let mut out = Vec::new();
    // Uniform on [1, 2*mean - 1] keeps the requested mean.
    let span = ((2.0 * config.mean_txns_per_customer).round() as usize).saturating_sub(1).max(1);

    for customer in customers {
        if rng.chance(config.inactive_share) {
            continue;
        }
        // Higher-risk customers move more money.
        let scale = 1.0 + customer.risk().ordinal().unwrap_or(0) as f64;
        let count = 1 + rng.below(span);
        for _ in 0..count {
            let raw = rng.pareto(10.0, 1.4).min(5_000.0) * scale;
            out.push(TransactionRecord {
                transaction_id: format!("T{:06}", out.len() + 1),
                customer_id: customer.customer_id.clone(),
                amount: Some((raw * 100.0).round() / 100.0),
                tx_type: Some(TX_TYPES[rng.below(TX_TYPES.len())].to_string()),
                tx_country: Some(TX_COUNTRIES[rng.below(TX_COUNTRIES.len())].to_string()),
            });
        }
    }
    out
}

fn alert_type(is_aml: bool, rng: &mut TableRng, mixed_case_share: f64) -> String {
    let canonical = if is_aml { "AML" } else { "KYC" };
    if rng.chance(mixed_case_share) {
        if rng.chance(0.5) {
            canonical.to_lowercase()
        } else {
            let lower = canonical.to_lowercase();
            format!("{}{}", &canonical[..1], &lower[1..])
        }
    } else {
        canonical.to_string()
    }
}

fn generate_alerts(
    config: &SynthConfig,
    customers: &[CustomerRecord],
    transactions: &[TransactionRecord],
    rng: &mut TableRng,
) -> Vec<AlertRecord> {
    let tx_agg = aggregate_transactions(transactions);
    let pool = customers.len().max(1);

    let mut alerts: Vec<AlertRecord> = (0..config.alerts)
        .map(|i| {
            let idx = rng.below(pool);
            let cid = customer_id(idx);
            let is_aml = rng.chance(config.aml_share);
            let risk = customers
                .get(idx)
                .and_then(|c| c.risk().ordinal())
                .unwrap_or(0) as f64;
            let mean_amount = tx_agg
                .get(cid.as_str())
                .and_then(|a| a.mean_amount)
                .unwrap_or(0.0);

            let z = LABEL_BIAS
                + LABEL_RISK_WEIGHT * risk
                + LABEL_AML_WEIGHT * if is_aml { 1.0 } else { 0.0 }
                + LABEL_AMOUNT_WEIGHT * (1.0 + mean_amount / 100.0).ln();
            let flag = rng.chance(sigmoid(z));

            AlertRecord {
                alert_id: format!("A{:05}", i + 1),
                customer_id: cid,
                alert_type: Some(alert_type(is_aml, rng, config.mixed_case_share)),
                priority_flag: Some(flag as i64),
            }
        })
        .collect();

    ensure_both_classes(&mut alerts);
    alerts
}

/// A single-class label set cannot be trained on; flip the last alert.
fn ensure_both_classes(alerts: &mut [AlertRecord]) {
    if alerts.len() < 2 {
        return;
    }
    let first = alerts[0].priority_flag;
    if alerts.iter().all(|a| a.priority_flag == first) {
        if let Some(last) = alerts.last_mut() {
            last.priority_flag = last.priority_flag.map(|f| 1 - f);
        }
        log::debug!("Generated labels were single-class; flipped the last alert");
    }
}
