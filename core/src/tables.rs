//! CSV loading and writing.
//!
//! RULE: Only this module touches the filesystem for tabular data.
//! Everything downstream works on in-memory `InputTables`.

use crate::{
    error::{TriageError, TriageResult},
    records::{AlertRecord, CustomerRecord, ScoredAlert, TransactionRecord},
    types::{AlertId, CustomerId, LabelClass},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

pub const PRIORITY_FLAG_COLUMN: &str = "priority_flag";

/// The alerts table plus whether its header carried a label column.
/// A header with `priority_flag` is what makes labels "present", even
/// if every cell in it is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertTable {
    pub rows: Vec<AlertRecord>,
    pub has_priority_flag: bool,
}

impl AlertTable {
    pub fn new(rows: Vec<AlertRecord>, has_priority_flag: bool) -> Self {
        Self { rows, has_priority_flag }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputTables {
    pub alerts: AlertTable,
    pub customers: Vec<CustomerRecord>,
    pub transactions: Vec<TransactionRecord>,
}

impl InputTables {
    pub fn load(
        alerts_path: &Path,
        customers_path: &Path,
        transactions_path: &Path,
    ) -> TriageResult<Self> {
        let alerts = read_alerts(std::fs::File::open(alerts_path)?)?;
        let customers = read_rows(std::fs::File::open(customers_path)?)?;
        let transactions = read_rows(std::fs::File::open(transactions_path)?)?;
        log::info!(
            "Loaded {} alerts, {} customers, {} transactions",
            alerts.len(),
            customers.len(),
            transactions.len()
        );
        Ok(Self { alerts, customers, transactions })
    }

    /// Write the three tables as CSV files into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> TriageResult<()> {
        std::fs::create_dir_all(dir)?;
        write_alerts(
            std::fs::File::create(dir.join(crate::config::ALERTS_FILE))?,
            &self.alerts,
        )?;
        write_rows(
            std::fs::File::create(dir.join(crate::config::CUSTOMERS_FILE))?,
            &self.customers,
        )?;
        write_rows(
            std::fs::File::create(dir.join(crate::config::TRANSACTIONS_FILE))?,
            &self.transactions,
        )?;
        Ok(())
    }
}

/// Alerts row as it sits in the file. The label is kept as text until
/// `read_alerts` has decided whether it is a usable class value.
#[derive(Deserialize)]
struct AlertRow {
    alert_id: AlertId,
    customer_id: CustomerId,
    #[serde(default)]
    alert_type: Option<String>,
    #[serde(default)]
    priority_flag: Option<String>,
}

/// Alerts row written without a label column.
#[derive(Serialize)]
struct UnlabelledAlertRow<'a> {
    alert_id: &'a str,
    customer_id: &'a str,
    alert_type: Option<&'a str>,
}

/// Read an alerts table, recording whether `priority_flag` is a column.
///
/// Label cells accept integers and integral floats (`1`, `1.0`); an
/// empty cell is a missing label. Anything else is `InvalidLabel`.
pub fn read_alerts<R: Read>(reader: R) -> TriageResult<AlertTable> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let has_priority_flag = rdr
        .headers()?
        .iter()
        .any(|h| h == PRIORITY_FLAG_COLUMN);

    let mut rows = Vec::new();
    for (row, record) in rdr.deserialize::<AlertRow>().enumerate() {
        let raw = record?;
        let priority_flag = match raw.priority_flag.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(cell) => Some(parse_label(cell).ok_or_else(|| TriageError::InvalidLabel {
                row,
                alert_id: raw.alert_id.clone(),
            })?),
        };
        rows.push(AlertRecord {
            alert_id: raw.alert_id,
            customer_id: raw.customer_id,
            alert_type: raw.alert_type,
            priority_flag,
        });
    }
    Ok(AlertTable::new(rows, has_priority_flag))
}

fn parse_label(cell: &str) -> Option<LabelClass> {
    if let Ok(v) = cell.parse::<LabelClass>() {
        return Some(v);
    }
    let v = cell.parse::<f64>().ok()?;
    let in_range = v >= LabelClass::MIN as f64 && v < LabelClass::MAX as f64;
    (v.is_finite() && v.fract() == 0.0 && in_range).then_some(v as LabelClass)
}

/// Write an alerts table. The label column is only written when the
/// table has one, so an unlabelled table reads back unlabelled.
pub fn write_alerts<W: Write>(writer: W, alerts: &AlertTable) -> TriageResult<()> {
    if alerts.has_priority_flag {
        return write_rows(writer, &alerts.rows);
    }
    let rows: Vec<UnlabelledAlertRow> = alerts
        .rows
        .iter()
        .map(|a| UnlabelledAlertRow {
            alert_id: &a.alert_id,
            customer_id: &a.customer_id,
            alert_type: a.alert_type.as_deref(),
        })
        .collect();
    write_rows(writer, &rows)
}

/// Read any headered table into typed rows. Unknown columns are ignored.
pub fn read_rows<T: DeserializeOwned, R: Read>(reader: R) -> TriageResult<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let rows = rdr.deserialize().collect::<Result<Vec<T>, csv::Error>>()?;
    Ok(rows)
}

/// Write rows with a header line and no index column.
pub fn write_rows<T: Serialize, W: Write>(writer: W, rows: &[T]) -> TriageResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the scored output file, creating its parent directory.
pub fn write_scores(path: &Path, rows: &[ScoredAlert]) -> TriageResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_rows(std::fs::File::create(path)?, rows)
}
