//! Candidate row to canonical transaction conversion.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use super::rules::amounts::{amount_from_value, parse_amount_outcome};
use super::rules::dates::parse_date_outcome;
use super::rules::{Direction, TransactionClassifier};
use crate::error::FieldError;
use crate::models::config::{DebitCreditPolicy, ExtractionConfig};
use crate::models::transaction::{
    AmountField, BalanceSource, CandidateRow, Transaction, TransactionIssue,
};

const DATE_KEYS: &[&str] = &[
    "date",
    "transaction_date",
    "trans_date",
    "value_date",
    "posting_date",
];
pub(crate) const DESCRIPTION_KEYS: &[&str] = &[
    "description",
    "transaction_description",
    "details",
    "narrative",
    "memo",
];
const DEBIT_KEYS: &[&str] = &[
    "debit",
    "withdrawal",
    "withdrawals",
    "money_out",
    "debit_amount",
];
const CREDIT_KEYS: &[&str] = &["credit", "deposit", "deposits", "money_in", "credit_amount"];
const BALANCE_KEYS: &[&str] = &["balance", "running_balance"];
const AMOUNT_KEYS: &[&str] = &["amount"];
const LINE_KEYS: &[&str] = &["line_number", "line"];

/// Converts candidate rows into transactions for one run.
///
/// Parsed dates and amounts are memoized per distinct raw string for the
/// lifetime of the normalizer.
pub struct TransactionNormalizer<'a> {
    reference_date: NaiveDate,
    policy: DebitCreditPolicy,
    classifier: &'a dyn TransactionClassifier,
    date_cache: HashMap<String, Result<NaiveDate, FieldError>>,
    amount_cache: HashMap<String, Result<f64, FieldError>>,
}

impl<'a> TransactionNormalizer<'a> {
    /// `reference_date` stands in for unparseable dates.
    pub fn new(
        reference_date: NaiveDate,
        policy: DebitCreditPolicy,
        classifier: &'a dyn TransactionClassifier,
    ) -> Self {
        Self {
            reference_date,
            policy,
            classifier,
            date_cache: HashMap::new(),
            amount_cache: HashMap::new(),
        }
    }

    /// Normalize every row; `index` of each row is its line number unless
    /// the row carries one.
    pub fn normalize_all(&mut self, rows: &[CandidateRow]) -> Vec<Transaction> {
        rows.iter()
            .enumerate()
            .map(|(index, row)| self.normalize(row, index))
            .collect()
    }

    pub fn normalize(&mut self, row: &CandidateRow, index: usize) -> Transaction {
        let mut issues = Vec::new();

        let raw_date = row.text_of(DATE_KEYS).unwrap_or_default();
        let date = match self.date(&raw_date) {
            Ok(date) => date,
            Err(_) => {
                debug!("Unparsed date {:?} on row {}", raw_date, index);
                issues.push(TransactionIssue::UnparsedDate { raw: raw_date });
                self.reference_date
            }
        };

        let description = row.text_of(DESCRIPTION_KEYS).unwrap_or_default();

        let mut debit = self.amount(row, DEBIT_KEYS, AmountField::Debit, &mut issues);
        let mut credit = self.amount(row, CREDIT_KEYS, AmountField::Credit, &mut issues);
        if debit.is_none() && credit.is_none() {
            if let Some(amount) = self.amount(row, AMOUNT_KEYS, AmountField::Amount, &mut issues) {
                match self.split_signed(amount, &description) {
                    Direction::Inbound => credit = Some(amount.abs()),
                    Direction::Outbound => debit = Some(amount.abs()),
                }
            }
        }
        let mut debit = debit.unwrap_or(0.0);
        let mut credit = credit.unwrap_or(0.0);

        if debit != 0.0 && credit != 0.0 {
            match self.policy {
                DebitCreditPolicy::Flag => {
                    issues.push(TransactionIssue::BothSides { debit, credit });
                }
                DebitCreditPolicy::LargerWins => {
                    if debit > credit {
                        credit = 0.0;
                    } else {
                        debit = 0.0;
                    }
                }
                DebitCreditPolicy::Keep => {}
            }
        }

        let (balance, balance_source) =
            match self.amount(row, BALANCE_KEYS, AmountField::Balance, &mut issues) {
                Some(balance) => (balance, BalanceSource::Statement),
                None => (0.0, BalanceSource::Missing),
            };

        Transaction {
            date,
            description,
            debit,
            credit,
            balance,
            line_number: line_number(row).unwrap_or(index),
            balance_source,
            issues,
        }
    }

    fn date(&mut self, raw: &str) -> Result<NaiveDate, FieldError> {
        if let Some(cached) = self.date_cache.get(raw) {
            return cached.clone();
        }
        let parsed = parse_date_outcome(raw);
        self.date_cache.insert(raw.to_string(), parsed.clone());
        parsed
    }

    /// Value of the first present alias. Absent fields are `None`; fields
    /// that fail to parse are recorded as issues and also `None`.
    fn amount(
        &mut self,
        row: &CandidateRow,
        keys: &[&str],
        field: AmountField,
        issues: &mut Vec<TransactionIssue>,
    ) -> Option<f64> {
        let value = row.first_of(keys)?;
        let parsed = match value {
            Value::String(s) if !s.trim().is_empty() => {
                if let Some(cached) = self.amount_cache.get(s) {
                    cached.clone()
                } else {
                    let parsed = parse_amount_outcome(s);
                    self.amount_cache.insert(s.clone(), parsed.clone());
                    parsed
                }
            }
            other => amount_from_value(other)?,
        };

        match parsed {
            Ok(amount) => Some(amount),
            Err(e) => {
                debug!("{}", e);
                let raw = match e {
                    FieldError::UnparsedAmount { raw } | FieldError::UnparsedDate { raw } => raw,
                };
                issues.push(TransactionIssue::UnparsedAmount { field, raw });
                None
            }
        }
    }

    /// Keywords decide first; the sign breaks ties.
    fn split_signed(&self, amount: f64, description: &str) -> Direction {
        self.classifier
            .classify(description)
            .direction()
            .unwrap_or(if amount < 0.0 {
                Direction::Outbound
            } else {
                Direction::Inbound
            })
    }
}

fn line_number(row: &CandidateRow) -> Option<usize> {
    match row.first_of(LINE_KEYS)? {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// What happened to the ledger after normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub unparsed_dates: usize,
    pub unparsed_amounts: usize,
    pub both_sides: usize,
    pub duplicates_removed: usize,
    pub balances_derived: bool,
}

/// Sort the ledger by date (stable, so same-day rows keep source order),
/// optionally drop exact duplicates, and derive balances when no row
/// supplied one.
pub fn finish_ledger(ledger: &mut Vec<Transaction>, config: &ExtractionConfig) -> LedgerStats {
    let mut stats = LedgerStats::default();

    ledger.sort_by_key(|t| t.date);

    if config.deduplicate {
        let before = ledger.len();
        let mut seen = HashSet::new();
        ledger.retain(|t| seen.insert(t.identity()));
        stats.duplicates_removed = before - ledger.len();
    }

    let no_statement_balances = ledger
        .iter()
        .all(|t| t.balance_source != BalanceSource::Statement);
    if config.derive_missing_balances && !ledger.is_empty() && no_statement_balances {
        let mut running = 0.0;
        for t in ledger.iter_mut() {
            running += t.net();
            t.balance = running;
            t.balance_source = BalanceSource::Derived;
        }
        stats.balances_derived = true;
    }

    for issue in ledger.iter().flat_map(|t| t.issues.iter()) {
        match issue {
            TransactionIssue::UnparsedDate { .. } => stats.unparsed_dates += 1,
            TransactionIssue::UnparsedAmount { .. } => stats.unparsed_amounts += 1,
            TransactionIssue::BothSides { .. } => stats.both_sides += 1,
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::rules::{KeywordClassifier, KeywordSet};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 6, 1).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn classifier() -> KeywordClassifier {
        KeywordClassifier::new(KeywordSet::english())
    }

    #[test]
    fn test_aliases_and_defaults() {
        let classifier = classifier();
        let mut normalizer =
            TransactionNormalizer::new(reference(), DebitCreditPolicy::Flag, &classifier);

        let row = CandidateRow::new()
            .with("Transaction Date", "05/01/2024")
            .with("Money In", "1,000.00")
            .with("Running Balance", 1000);
        let tx = normalizer.normalize(&row, 7);

        assert_eq!(tx.date, ymd(2024, 1, 5));
        assert_eq!(tx.description, "");
        assert_eq!(tx.credit, 1000.0);
        assert_eq!(tx.debit, 0.0);
        assert_eq!(tx.balance, 1000.0);
        assert_eq!(tx.line_number, 7);
        assert_eq!(tx.balance_source, BalanceSource::Statement);
        assert!(tx.issues.is_empty());
    }

    #[test]
    fn test_missing_balance_and_bad_fields() {
        let classifier = classifier();
        let mut normalizer =
            TransactionNormalizer::new(reference(), DebitCreditPolicy::Flag, &classifier);

        let row = CandidateRow::new()
            .with("date", "sometime")
            .with("description", "Fee")
            .with("debit", "n/a")
            .with("line", "12");
        let tx = normalizer.normalize(&row, 0);

        assert_eq!(tx.date, reference());
        assert_eq!(tx.debit, 0.0);
        assert_eq!(tx.balance, 0.0);
        assert_eq!(tx.balance_source, BalanceSource::Missing);
        assert_eq!(tx.line_number, 12);
        assert_eq!(
            tx.issues,
            vec![
                TransactionIssue::UnparsedDate {
                    raw: "sometime".to_string()
                },
                TransactionIssue::UnparsedAmount {
                    field: AmountField::Debit,
                    raw: "n/a".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_negative_values_pass_through() {
        let classifier = classifier();
        let mut normalizer =
            TransactionNormalizer::new(reference(), DebitCreditPolicy::Flag, &classifier);

        let row = CandidateRow::new()
            .with("date", "2024-01-05")
            .with("debit", -25.0)
            .with("balance", "-150.00");
        let tx = normalizer.normalize(&row, 0);

        assert_eq!(tx.debit, -25.0);
        assert_eq!(tx.balance, -150.0);
    }

    #[test]
    fn test_signed_amount_split() {
        let classifier = classifier();
        let mut normalizer =
            TransactionNormalizer::new(reference(), DebitCreditPolicy::Flag, &classifier);

        let by_sign = normalizer.normalize(
            &CandidateRow::new()
                .with("date", "04/22/2024")
                .with("description", "E-Payment")
                .with("amount", "-15.00"),
            0,
        );
        assert_eq!((by_sign.debit, by_sign.credit), (15.0, 0.0));

        let by_keyword = normalizer.normalize(
            &CandidateRow::new()
                .with("date", "04/22/2024")
                .with("description", "Card purchase reversal")
                .with("amount", 30.0),
            1,
        );
        assert_eq!((by_keyword.debit, by_keyword.credit), (30.0, 0.0));

        let positive = normalizer.normalize(
            &CandidateRow::new()
                .with("date", "04/22/2024")
                .with("description", "Misc")
                .with("amount", json!(12.5)),
            2,
        );
        assert_eq!((positive.debit, positive.credit), (0.0, 12.5));
    }

    #[test]
    fn test_debit_credit_policies() {
        let classifier = classifier();
        let row = CandidateRow::new()
            .with("date", "2024-01-05")
            .with("debit", 40.0)
            .with("credit", 100.0);

        let flagged = TransactionNormalizer::new(reference(), DebitCreditPolicy::Flag, &classifier)
            .normalize(&row, 0);
        assert_eq!((flagged.debit, flagged.credit), (40.0, 100.0));
        assert_eq!(
            flagged.issues,
            vec![TransactionIssue::BothSides {
                debit: 40.0,
                credit: 100.0
            }]
        );

        let larger =
            TransactionNormalizer::new(reference(), DebitCreditPolicy::LargerWins, &classifier)
                .normalize(&row, 0);
        assert_eq!((larger.debit, larger.credit), (0.0, 100.0));
        assert!(larger.issues.is_empty());

        let kept = TransactionNormalizer::new(reference(), DebitCreditPolicy::Keep, &classifier)
            .normalize(&row, 0);
        assert_eq!((kept.debit, kept.credit), (40.0, 100.0));
        assert!(kept.issues.is_empty());
    }

    #[test]
    fn test_memoized_parses_are_stable() {
        let classifier = classifier();
        let mut normalizer =
            TransactionNormalizer::new(reference(), DebitCreditPolicy::Flag, &classifier);
        let row = CandidateRow::new()
            .with("date", "20/01/2024")
            .with("debit", "400.00");

        let first = normalizer.normalize(&row, 0);
        let second = normalizer.normalize(&row, 0);

        assert_eq!(first, second);
        assert_eq!(normalizer.date_cache.len(), 1);
        assert_eq!(normalizer.amount_cache.len(), 1);
    }

    #[test]
    fn test_finish_ledger_sorts_and_derives_balances() {
        let mut ledger = vec![
            Transaction {
                balance_source: BalanceSource::Missing,
                ..Transaction::new(ymd(2024, 1, 20), "Rent", 400.0, 0.0, 0.0)
            },
            Transaction {
                balance_source: BalanceSource::Missing,
                ..Transaction::new(ymd(2024, 1, 5), "Salary", 0.0, 1000.0, 0.0)
            },
        ];

        let stats = finish_ledger(&mut ledger, &ExtractionConfig::default());

        assert!(stats.balances_derived);
        assert_eq!(ledger[0].description, "Salary");
        assert_eq!(ledger[0].balance, 1000.0);
        assert_eq!(ledger[1].balance, 600.0);
        assert_eq!(ledger[1].balance_source, BalanceSource::Derived);
    }

    #[test]
    fn test_finish_ledger_keeps_statement_balances_and_dedupes() {
        let tx = Transaction::new(ymd(2024, 1, 5), "Salary", 0.0, 1000.0, 1000.0);
        let mut ledger = vec![tx.clone(), tx.clone(), tx];

        let config = ExtractionConfig {
            deduplicate: true,
            ..Default::default()
        };
        let stats = finish_ledger(&mut ledger, &config);

        assert_eq!(ledger.len(), 1);
        assert_eq!(stats.duplicates_removed, 2);
        assert!(!stats.balances_derived);
        assert_eq!(ledger[0].balance_source, BalanceSource::Statement);
    }
}
