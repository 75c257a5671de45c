use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("priority_flag column is missing in alerts; cannot train model")]
    MissingLabels,

    #[error("Missing value for feature '{column}' at row {row} (alert {alert_id})")]
    MissingFeatureValue {
        row: usize,
        alert_id: String,
        column: &'static str,
    },

    #[error("Missing or non-integer priority_flag at row {row} (alert {alert_id})")]
    InvalidLabel { row: usize, alert_id: String },

    #[error("Cannot train on an empty alert set")]
    EmptyTrainingSet,

    #[error("Labels must contain exactly two classes, found {found:?}")]
    NotBinary { found: Vec<i64> },

    #[error("Label count {labels} does not match feature rows {rows}")]
    LabelLengthMismatch { labels: usize, rows: usize },

    #[error("Score count {scores} does not match alert count {alerts}")]
    ScoreLengthMismatch { scores: usize, alerts: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type TriageResult<T> = Result<T, TriageError>;
