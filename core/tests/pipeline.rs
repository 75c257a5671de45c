//! End-to-end pipeline tests against real CSV files.

use std::fs;
use std::path::Path;
use triage_core::{
    config::TriageConfig,
    error::TriageError,
    features::{self, Labels},
    pipeline::TriagePipeline,
    records::{AlertRecord, ScoredAlert},
    synth,
    tables::{self, AlertTable, InputTables},
};

fn write_raw(dir: &Path, alerts: &str, customers: &str, transactions: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("alerts.csv"), alerts).unwrap();
    fs::write(dir.join("customers.csv"), customers).unwrap();
    fs::write(dir.join("transactions.csv"), transactions).unwrap();
}

const CUSTOMERS: &str = "customer_id,risk_category\nC1,High\nC2,Low\nC3,Medium\n";
const TRANSACTIONS: &str = "transaction_id,customer_id,amount,tx_type,tx_country\n\
T1,C1,100.0,purchase,US\n\
T2,C2,50.0,deposit,CA\n\
T3,C3,75.0,transfer,UK\n";

/// The reference scenario through files: header, order and row count.
#[test]
fn run_writes_scores_in_alert_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = TriageConfig::from_data_dir(dir.path());
    write_raw(
        &config.raw_dir,
        "alert_id,customer_id,alert_type,priority_flag\nA1,C1,AML,1\nA2,C2,KYC,0\nA3,C3,AML,1\n",
        CUSTOMERS,
        TRANSACTIONS,
    );

    let summary = TriagePipeline::new(config.clone()).run().unwrap();

    assert_eq!(summary.rows, 3);
    assert_eq!(summary.output_path, config.output_path());

    let content = fs::read_to_string(&summary.output_path).unwrap();
    let header = content.lines().next().unwrap();
    assert_eq!(header, "alert_id,customer_id,alert_type,priority_score");

    let rows: Vec<ScoredAlert> = tables::read_rows(content.as_bytes()).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.alert_id.as_str()).collect();
    assert_eq!(ids, ["A1", "A2", "A3"]);
    for r in &rows {
        assert!((0.0..=1.0).contains(&r.priority_score), "{r:?}");
    }
    assert_eq!(rows[1].alert_type.as_deref(), Some("KYC"));
}

/// No priority_flag column: fatal MissingLabels, and nothing is written.
#[test]
fn missing_label_column_aborts_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = TriageConfig::from_data_dir(dir.path());
    write_raw(
        &config.raw_dir,
        "alert_id,customer_id,alert_type\nA1,C1,AML\nA2,C2,KYC\n",
        CUSTOMERS,
        TRANSACTIONS,
    );

    let err = TriagePipeline::new(config.clone()).run().unwrap_err();

    assert!(matches!(err, TriageError::MissingLabels), "Got {err:?}");
    assert!(!config.output_path().exists(), "No output should be written on failure");
}

/// An unrecognised risk category fails late, at fit time.
#[test]
fn unknown_risk_category_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = TriageConfig::from_data_dir(dir.path());
    write_raw(
        &config.raw_dir,
        "alert_id,customer_id,alert_type,priority_flag\nA1,C1,AML,1\nA2,C2,KYC,0\n",
        "customer_id,risk_category\nC1,High\nC2,Severe\n",
        TRANSACTIONS,
    );

    let err = TriagePipeline::new(config.clone()).run().unwrap_err();

    assert!(
        matches!(err, TriageError::MissingFeatureValue { row: 1, column: "risk_num", .. }),
        "Got {err:?}"
    );
    assert!(!config.output_path().exists());
}

/// Missing input files surface as I/O errors.
#[test]
fn missing_inputs_are_io_errors() {
    let dir = tempfile::tempdir().unwrap();
    let config = TriageConfig::from_data_dir(dir.path());

    let err = TriagePipeline::new(config).run().unwrap_err();
    assert!(matches!(err, TriageError::Io(_)), "Got {err:?}");
}

/// Unmatched customers and customers without transactions still score.
#[test]
fn unmatched_transactions_are_filled_not_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let config = TriageConfig::from_data_dir(dir.path());
    write_raw(
        &config.raw_dir,
        "alert_id,customer_id,alert_type,priority_flag\n\
A1,C1,AML,1\nA2,C2,KYC,0\nA3,C3,aml,1\nA4,C4,kyc,0\n",
        "customer_id,risk_category\nC1,High\nC2,Low\nC3,Medium\nC4,Low\n",
        "transaction_id,customer_id,amount\nT1,C1,100.0\nT2,C2,50.0\n",
    );

    let summary = TriagePipeline::new(config).run().unwrap();
    assert_eq!(summary.rows, 4);
}

/// Generated tables round-trip through CSV and score end to end.
#[test]
fn synthetic_tables_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = TriageConfig::from_data_dir(dir.path());
    config.synth.customers = 60;
    config.synth.alerts = 150;

    let generated = synth::generate(&config.synth, 2024);
    generated.write_to(&config.raw_dir).unwrap();

    let pipeline = TriagePipeline::new(config.clone());
    let in_memory = pipeline.score_tables(&generated).unwrap();
    let summary = pipeline.run().unwrap();

    assert_eq!(summary.rows, 150);
    assert_eq!(in_memory.scored.len(), 150);

    let written: Vec<ScoredAlert> =
        tables::read_rows(fs::File::open(&summary.output_path).unwrap()).unwrap();
    for (disk, mem) in written.iter().zip(&in_memory.scored) {
        assert_eq!(disk.alert_id, mem.alert_id);
        assert!(
            (disk.priority_score - mem.priority_score).abs() < 1e-12,
            "{} vs {}",
            disk.priority_score,
            mem.priority_score
        );
    }
}

/// An unlabelled table written to disk reads back unlabelled, so the run
/// still fails with MissingLabels rather than a per-row label error.
#[test]
fn unlabelled_alerts_stay_unlabelled_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = TriageConfig::from_data_dir(dir.path());
    let unlabelled = InputTables {
        alerts: AlertTable::new(
            vec![AlertRecord {
                alert_id: "A1".into(),
                customer_id: "C1".into(),
                alert_type: Some("AML".into()),
                priority_flag: None,
            }],
            false,
        ),
        customers: tables::read_rows(CUSTOMERS.as_bytes()).unwrap(),
        transactions: tables::read_rows(TRANSACTIONS.as_bytes()).unwrap(),
    };
    unlabelled.write_to(&config.raw_dir).unwrap();

    let header = fs::read_to_string(config.alerts_path()).unwrap();
    assert_eq!(header.lines().next(), Some("alert_id,customer_id,alert_type"));

    let reloaded = tables::read_alerts(fs::File::open(config.alerts_path()).unwrap()).unwrap();
    let (_, labels) = features::build(&reloaded, &unlabelled.customers, &unlabelled.transactions);
    assert_eq!(labels, Labels::Absent);

    let err = TriagePipeline::new(config.clone()).run().unwrap_err();
    assert!(matches!(err, TriageError::MissingLabels), "Got {err:?}");
}

/// Float-formatted labels such as `1.0` train like their integer form.
#[test]
fn float_formatted_labels_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let config = TriageConfig::from_data_dir(dir.path());
    write_raw(
        &config.raw_dir,
        "alert_id,customer_id,alert_type,priority_flag
A1,C1,AML,1.0
A2,C2,KYC,0.0
A3,C3,AML,1
",
        CUSTOMERS,
        TRANSACTIONS,
    );

    let alerts = tables::read_alerts(fs::File::open(config.alerts_path()).unwrap()).unwrap();
    let flags: Vec<Option<i64>> = alerts.rows.iter().map(|a| a.priority_flag).collect();
    assert_eq!(flags, [Some(1), Some(0), Some(1)]);

    let summary = TriagePipeline::new(config).run().unwrap();
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.model.classes, [0, 1]);
}

/// A fractional label is rejected with the offending row and alert.
#[test]
fn fractional_label_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let config = TriageConfig::from_data_dir(dir.path());
    write_raw(
        &config.raw_dir,
        "alert_id,customer_id,alert_type,priority_flag
A1,C1,AML,1
A2,C2,KYC,0.5
",
        CUSTOMERS,
        TRANSACTIONS,
    );

    let err = TriagePipeline::new(config.clone()).run().unwrap_err();
    match err {
        TriageError::InvalidLabel { row, alert_id } => {
            assert_eq!(row, 1);
            assert_eq!(alert_id, "A2");
        }
        other => panic!("Expected InvalidLabel, got {other:?}"),
    }
    assert!(!config.output_path().exists());
}
