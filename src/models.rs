use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single logged bet. Only `stake` and `payout` are stored; profit and
/// recovery rate are always derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BetRecord {
    pub id: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race_name: Option<String>,
    pub stake: f64,
    #[serde(default)]
    pub payout: Option<f64>,
}

impl BetRecord {
    /// Payout used in arithmetic. An unrecorded payout counts as a loss.
    pub fn payout_amount(&self) -> f64 {
        self.payout.unwrap_or(0.0)
    }

    pub fn profit(&self) -> f64 {
        self.payout_amount() - self.stake
    }

    pub fn recovery_rate(&self) -> f64 {
        if self.stake > 0.0 {
            self.payout_amount() / self.stake * 100.0
        } else {
            0.0
        }
    }

    pub fn is_hit(&self) -> bool {
        self.payout_amount() > self.stake
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BetInput {
    pub date: String,
    #[serde(default)]
    pub race_name: Option<String>,
    pub stake: f64,
    #[serde(default)]
    pub payout: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerData {
    pub entries: Vec<BetRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryView {
    #[serde(flatten)]
    pub record: BetRecord,
    pub profit: f64,
    pub recovery_rate: f64,
}

impl From<BetRecord> for EntryView {
    fn from(record: BetRecord) -> Self {
        Self {
            profit: record.profit(),
            recovery_rate: record.recovery_rate(),
            record,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SummaryStats {
    pub total_stake: f64,
    pub total_payout: f64,
    pub net_profit: f64,
    pub overall_recovery_rate: f64,
    pub hit_rate: f64,
    pub max_single_payout: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSeriesPoint {
    pub label: String,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Deserialize, Default)]
pub struct SeriesQuery {
    #[serde(default)]
    pub granularity: Granularity,
}

#[derive(Debug, Deserialize, Default)]
pub struct RecoverySeriesQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RecoveryRateQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecoveryRateResponse {
    pub from: Option<String>,
    pub to: Option<String>,
    pub count: usize,
    pub recovery_rate: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkImportResponse {
    pub imported: usize,
}

/// Browser form submission. Numeric fields arrive as text.
#[derive(Debug, Deserialize)]
pub struct EntryForm {
    pub date: String,
    #[serde(default)]
    pub race_name: String,
    pub stake: String,
    #[serde(default)]
    pub payout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub race_name: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub predicted_horse: String,
    pub reasoning: String,
}
