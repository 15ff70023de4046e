//! Ledger data models: candidate rows, canonical transactions, statement header.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One canonical ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction date. Holds the run's reference date when the source
    /// date could not be parsed (see [`TransactionIssue::UnparsedDate`]).
    pub date: NaiveDate,

    /// Free-text description, script preserved.
    pub description: String,

    /// Money out.
    pub debit: f64,

    /// Money in.
    pub credit: f64,

    /// Running balance after this transaction (0.0 when unknown).
    pub balance: f64,

    /// Index into the source text or row list. Diagnostics only.
    pub line_number: usize,

    /// Where `balance` came from.
    #[serde(default)]
    pub balance_source: BalanceSource,

    /// Substitutions and anomalies recorded while normalizing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<TransactionIssue>,
}

impl Transaction {
    /// Create a transaction with a statement-supplied balance and no issues.
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        debit: f64,
        credit: f64,
        balance: f64,
    ) -> Self {
        Self {
            date,
            description: description.into(),
            debit,
            credit,
            balance,
            line_number: 0,
            balance_source: BalanceSource::Statement,
            issues: Vec::new(),
        }
    }

    /// Net flow of this transaction (credit minus debit).
    pub fn net(&self) -> f64 {
        self.credit - self.debit
    }

    /// Whether the balance after this transaction is negative.
    pub fn is_overdrawn(&self) -> bool {
        self.balance < 0.0
    }

    /// Whether `date` is the fallback sentinel rather than a parsed value.
    pub fn has_unparsed_date(&self) -> bool {
        self.issues
            .iter()
            .any(|i| matches!(i, TransactionIssue::UnparsedDate { .. }))
    }

    /// Key used for exact-duplicate detection.
    pub(crate) fn identity(&self) -> (NaiveDate, String, u64, u64, u64) {
        (
            self.date,
            self.description.clone(),
            self.debit.to_bits(),
            self.credit.to_bits(),
            self.balance.to_bits(),
        )
    }
}

/// Origin of a transaction's balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSource {
    /// Read from the statement.
    #[default]
    Statement,
    /// Not supplied by the source; left at 0.0.
    Missing,
    /// Recomputed as the cumulative sum of credit minus debit.
    Derived,
}

/// Amount-bearing field of a candidate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountField {
    Debit,
    Credit,
    Balance,
    Amount,
}

/// Something the normalizer had to substitute or flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionIssue {
    /// The date matched no supported format; `date` holds the sentinel.
    UnparsedDate { raw: String },

    /// An amount contained no number; the field holds 0.0.
    UnparsedAmount { field: AmountField, raw: String },

    /// Debit and credit were both non-zero in the source row.
    BothSides { debit: f64, credit: f64 },
}

/// A raw candidate transaction as emitted by an extractor.
///
/// Keys are normalized on insert (trimmed, lowercased, spaces and hyphens
/// mapped to `_`), so lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Value>",
    into = "BTreeMap<String, Value>"
)]
pub struct CandidateRow {
    fields: BTreeMap<String, Value>,
}

impl CandidateRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a field, normalizing the key.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(normalize_key(key), value.into());
    }

    /// Look up a field by any spelling of its key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(&normalize_key(key))
    }

    /// First non-null value among the given aliases.
    pub fn first_of(&self, aliases: &[&str]) -> Option<&Value> {
        aliases
            .iter()
            .filter_map(|alias| self.get(alias))
            .find(|v| !v.is_null())
    }

    /// First alias value rendered as text. Strings are trimmed; numbers are
    /// formatted; null, booleans and containers yield `None`.
    pub fn text_of(&self, aliases: &[&str]) -> Option<String> {
        match self.first_of(aliases)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<BTreeMap<String, Value>> for CandidateRow {
    fn from(map: BTreeMap<String, Value>) -> Self {
        let mut row = CandidateRow::new();
        for (key, value) in map {
            row.insert(&key, value);
        }
        row
    }
}

impl From<CandidateRow> for BTreeMap<String, Value> {
    fn from(row: CandidateRow) -> Self {
        row.fields
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Account-level fields found at the top of a statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementHeader {
    /// Account holder name.
    pub customer_name: String,

    /// Branch or customer city.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// Account number.
    pub account_number: String,

    /// IBAN.
    pub iban_number: String,

    /// National ID or residence permit number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,

    /// Opening balance of the statement period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_balance: Option<f64>,

    /// Closing balance of the statement period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_balance: Option<f64>,

    /// Statement period as printed, e.g. `01/01/2024 - 31/03/2024`.
    pub financial_period: String,
}

impl StatementHeader {
    /// Whether no field has been filled.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fill every empty field from `other`. Fields already set win.
    pub fn merge_missing(&mut self, other: StatementHeader) {
        fn fill(slot: &mut String, value: String) {
            if slot.is_empty() {
                *slot = value;
            }
        }

        fill(&mut self.customer_name, other.customer_name);
        fill(&mut self.account_number, other.account_number);
        fill(&mut self.iban_number, other.iban_number);
        fill(&mut self.financial_period, other.financial_period);
        self.city = self.city.take().or(other.city);
        self.id_number = self.id_number.take().or(other.id_number);
        self.opening_balance = self.opening_balance.or(other.opening_balance);
        self.closing_balance = self.closing_balance.or(other.closing_balance);
    }
}
