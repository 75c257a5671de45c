//! Row types for the three input tables and the scored output.
//!
//! All input rows are read-only after load.

use crate::types::{AlertId, CustomerId, LabelClass};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertRecord {
    pub alert_id: AlertId,
    pub customer_id: CustomerId,
    #[serde(default)]
    pub alert_type: Option<String>,
    /// Historical label. Only meaningful when the table carries the column.
    #[serde(default)]
    pub priority_flag: Option<LabelClass>,
}

impl AlertRecord {
    /// True iff the alert type, upper-cased, is exactly "AML".
    pub fn is_aml(&self) -> bool {
        self.alert_type
            .as_deref()
            .is_some_and(|t| t.to_uppercase() == "AML")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub risk_category: Option<String>,
}

impl CustomerRecord {
    pub fn risk(&self) -> RiskCategory {
        RiskCategory::parse(self.risk_category.as_deref().unwrap_or(""))
    }
}

/// Contextual columns beyond `amount` are carried for the generator
/// and ignored by the feature builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub customer_id: CustomerId,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub tx_type: Option<String>,
    #[serde(default)]
    pub tx_country: Option<String>,
}

/// Customer risk band. Matching is exact and case-sensitive;
/// anything else is kept verbatim as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Medium,
    High,
    Unknown(String),
}

impl RiskCategory {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Low" => Self::Low,
            "Medium" => Self::Medium,
            "High" => Self::High,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Ordinal encoding Low=0, Medium=1, High=2. None for unknown bands.
    pub fn ordinal(&self) -> Option<u8> {
        match self {
            Self::Low => Some(0),
            Self::Medium => Some(1),
            Self::High => Some(2),
            Self::Unknown(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Unknown(raw) => raw,
        }
    }
}

/// One row of the output file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredAlert {
    pub alert_id: AlertId,
    pub customer_id: CustomerId,
    pub alert_type: Option<String>,
    pub priority_score: f64,
}
