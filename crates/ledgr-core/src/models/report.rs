//! Result document models: monthly buckets, analytics summary, report.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::transaction::{StatementHeader, Transaction};
use crate::statement::rules::Locale;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Bucket key. `year` is `None` under month-only granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: Option<i32>,
    pub month: u32,
}

impl MonthKey {
    pub fn year_month(year: i32, month: u32) -> Self {
        Self {
            year: Some(year),
            month,
        }
    }

    pub fn month_only(month: u32) -> Self {
        Self { year: None, month }
    }

    /// Three-letter English month abbreviation.
    pub fn month_name(&self) -> &'static str {
        month_abbreviation(self.month)
    }

    /// Map key in the result document: `2024-01`, or `Jan` without a year.
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{:04}-{:02}", year, self.month),
            None => self.month_name().to_string(),
        }
    }
}

fn month_abbreviation(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_ABBREVIATIONS.get(i as usize))
        .copied()
        .unwrap_or("???")
}

/// Aggregated metrics for one month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    /// Calendar year, absent under month-only granularity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Month abbreviation (`Jan`..`Dec`).
    pub month_name: String,

    pub opening_balance: f64,
    pub closing_balance: f64,
    pub total_credit: f64,
    pub total_debit: f64,
    pub net_change: f64,
    /// Coefficient of variation of in-month balances, in percent.
    pub fluctuation: f64,
    pub minimum_balance: f64,
    pub maximum_balance: f64,
    pub transaction_count: u64,

    pub international_inward_count: u64,
    pub international_inward_total: f64,
    pub international_outward_count: u64,
    pub international_outward_total: f64,
}

impl MonthlyBucket {
    /// Empty bucket for a key.
    pub fn new(key: MonthKey) -> Self {
        Self {
            year: key.year,
            month: key.month,
            month_name: key.month_name().to_string(),
            ..Default::default()
        }
    }

    pub fn key(&self) -> MonthKey {
        MonthKey {
            year: self.year,
            month: self.month,
        }
    }
}

/// Portfolio-level metrics derived from the finalized buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub average_fluctuation: f64,
    pub net_cash_flow_stability: f64,
    pub total_foreign_transactions: u64,
    pub total_foreign_amount: f64,
    pub overdraft_frequency: u64,
    /// Same value as `overdraft_frequency`; not a distinct day count.
    pub overdraft_total_days: u64,
    pub sum_total_inflow: f64,
    pub sum_total_outflow: f64,
    pub avg_total_inflow: f64,
    pub avg_total_outflow: f64,
}

/// Processing facts supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingMetadata {
    /// Source document path or identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// When processing started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<NaiveDateTime>,

    /// Pages read from the source document.
    pub pages_processed: usize,

    /// Candidate records handed to the engine.
    pub records_processed: usize,

    /// Wall time spent by the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

/// The complete result document of one statement-processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementReport {
    /// Locale used for patterns and keywords.
    pub locale: Locale,

    /// Name of the extraction strategy that produced the rows, if any ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    /// Account header fields.
    pub account_info: StatementHeader,

    /// Canonical ledger sorted by date.
    pub transactions: Vec<Transaction>,

    pub total_transactions: usize,

    /// Buckets keyed by [`MonthKey::label`].
    pub monthly_analysis: BTreeMap<String, MonthlyBucket>,

    pub analytics: AnalyticsSummary,

    /// Run-level diagnostics (excluded rows, substituted fields).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    #[serde(default)]
    pub metadata: ProcessingMetadata,
}

impl StatementReport {
    /// Attach caller-supplied processing metadata.
    pub fn with_metadata(mut self, metadata: ProcessingMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Buckets in calendar order regardless of label sort order.
    pub fn buckets_in_order(&self) -> Vec<&MonthlyBucket> {
        let mut buckets: Vec<&MonthlyBucket> = self.monthly_analysis.values().collect();
        buckets.sort_by_key(|b| b.key());
        buckets
    }
}
