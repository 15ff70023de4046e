//! Monthly bucketing of the ledger.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::models::config::{AnalyticsConfig, Granularity, UnparsedDatePolicy};
use crate::models::report::{MonthKey, MonthlyBucket};
use crate::models::transaction::Transaction;
use crate::statement::rules::TransactionClassifier;

/// Finalized buckets in key order plus bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyAnalysis {
    pub buckets: Vec<MonthlyBucket>,
    /// Transactions left out because their date was a sentinel.
    pub excluded: usize,
}

impl MonthlyAnalysis {
    /// Buckets keyed by their label.
    pub fn labelled(&self) -> BTreeMap<String, MonthlyBucket> {
        self.buckets
            .iter()
            .map(|b| (b.key().label(), b.clone()))
            .collect()
    }
}

/// Per-bucket state that only lives until finalization.
struct Accumulator {
    bucket: MonthlyBucket,
    balances: Vec<f64>,
}

impl Accumulator {
    fn new(key: MonthKey) -> Self {
        Self {
            bucket: MonthlyBucket::new(key),
            balances: Vec::new(),
        }
    }

    fn add(&mut self, tx: &Transaction, international: bool) {
        let b = &mut self.bucket;

        if self.balances.is_empty() {
            b.minimum_balance = tx.balance;
            b.maximum_balance = tx.balance;
        } else {
            b.minimum_balance = b.minimum_balance.min(tx.balance);
            b.maximum_balance = b.maximum_balance.max(tx.balance);
        }
        self.balances.push(tx.balance);

        b.transaction_count += 1;
        b.total_credit += tx.credit;
        b.total_debit += tx.debit;
        b.closing_balance = tx.balance;

        if international {
            if tx.credit > 0.0 {
                b.international_inward_count += 1;
                b.international_inward_total += tx.credit;
            }
            if tx.debit > 0.0 {
                b.international_outward_count += 1;
                b.international_outward_total += tx.debit;
            }
        }
    }

    fn finalize(self, previous_closing: f64) -> MonthlyBucket {
        let mut bucket = self.bucket;
        bucket.opening_balance = if previous_closing > 0.0 {
            previous_closing
        } else {
            bucket.closing_balance
        };
        bucket.net_change = bucket.total_credit - bucket.total_debit;
        bucket.fluctuation = fluctuation(&self.balances);
        bucket
    }
}

/// Coefficient of variation in percent: sample standard deviation over the
/// magnitude of the mean. Zero for fewer than two samples or a zero mean.
///
/// The ratio is scale-free, so samples are divided by their largest
/// magnitude first and sums of huge balances cannot overflow.
fn fluctuation(balances: &[f64]) -> f64 {
    if balances.len() < 2 {
        return 0.0;
    }
    let scale = balances.iter().fold(0.0_f64, |m, b| m.max(b.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return 0.0;
    }

    let n = balances.len() as f64;
    let mean = balances.iter().map(|b| b / scale).sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = balances
        .iter()
        .map(|b| (b / scale - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);

    let value = variance.sqrt() / mean.abs() * 100.0;
    if value.is_finite() { value } else { 0.0 }
}

/// Buckets a ledger by month.
pub struct MonthlyAggregator<'a> {
    classifier: &'a dyn TransactionClassifier,
    granularity: Granularity,
    unparsed_dates: UnparsedDatePolicy,
}

impl<'a> MonthlyAggregator<'a> {
    pub fn new(classifier: &'a dyn TransactionClassifier) -> Self {
        Self {
            classifier,
            granularity: Granularity::default(),
            unparsed_dates: UnparsedDatePolicy::default(),
        }
    }

    pub fn from_config(config: &AnalyticsConfig, classifier: &'a dyn TransactionClassifier) -> Self {
        Self::new(classifier)
            .with_granularity(config.granularity)
            .with_unparsed_dates(config.unparsed_dates)
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_unparsed_dates(mut self, policy: UnparsedDatePolicy) -> Self {
        self.unparsed_dates = policy;
        self
    }

    /// Bucket key for a date under the configured granularity.
    pub fn key_for(&self, date: NaiveDate) -> MonthKey {
        match self.granularity {
            Granularity::YearMonth => MonthKey::year_month(date.year(), date.month()),
            Granularity::MonthOnly => MonthKey::month_only(date.month()),
        }
    }

    /// Sort, bucket and finalize. The input ledger is not modified.
    pub fn aggregate(&self, ledger: &[Transaction]) -> MonthlyAnalysis {
        let mut sorted: Vec<&Transaction> = ledger.iter().collect();
        sorted.sort_by_key(|t| t.date);

        let mut accumulators: BTreeMap<MonthKey, Accumulator> = BTreeMap::new();
        let mut excluded = 0;

        for tx in sorted {
            if tx.has_unparsed_date() && self.unparsed_dates == UnparsedDatePolicy::Exclude {
                excluded += 1;
                continue;
            }

            let key = self.key_for(tx.date);
            let international = self.classifier.classify(&tx.description).international;
            accumulators
                .entry(key)
                .or_insert_with(|| Accumulator::new(key))
                .add(tx, international);
        }

        let mut previous_closing = 0.0;
        let buckets: Vec<MonthlyBucket> = accumulators
            .into_values()
            .map(|acc| {
                let bucket = acc.finalize(previous_closing);
                previous_closing = bucket.closing_balance;
                bucket
            })
            .collect();

        debug!(
            "Aggregated {} buckets ({} transactions excluded)",
            buckets.len(),
            excluded
        );

        MonthlyAnalysis { buckets, excluded }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::TransactionIssue;
    use crate::statement::rules::{KeywordClassifier, KeywordSet};
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(date: NaiveDate, desc: &str, debit: f64, credit: f64, balance: f64) -> Transaction {
        Transaction::new(date, desc, debit, credit, balance)
    }

    fn classifier() -> KeywordClassifier {
        KeywordClassifier::new(KeywordSet::english())
    }

    #[test]
    fn test_single_month_scenario() {
        let classifier = classifier();
        let ledger = vec![
            tx(ymd(2024, 1, 20), "Rent", 400.0, 0.0, 600.0),
            tx(ymd(2024, 1, 5), "Salary", 0.0, 1000.0, 1000.0),
        ];

        let analysis = MonthlyAggregator::new(&classifier)
            .with_granularity(Granularity::MonthOnly)
            .aggregate(&ledger);
        let buckets = analysis.labelled();
        let jan = &buckets["Jan"];

        assert_eq!(buckets.len(), 1);
        assert_eq!(jan.total_credit, 1000.0);
        assert_eq!(jan.total_debit, 400.0);
        assert_eq!(jan.net_change, 600.0);
        assert_eq!(jan.transaction_count, 2);
        assert_eq!(jan.minimum_balance, 600.0);
        assert_eq!(jan.maximum_balance, 1000.0);
        assert_eq!(jan.closing_balance, 600.0);
        assert_eq!(jan.opening_balance, 600.0);
    }

    #[test]
    fn test_year_month_keys_keep_years_apart() {
        let classifier = classifier();
        let ledger = vec![
            tx(ymd(2024, 1, 5), "a", 0.0, 100.0, 100.0),
            tx(ymd(2025, 1, 5), "b", 0.0, 50.0, 150.0),
        ];

        let year_month = MonthlyAggregator::new(&classifier).aggregate(&ledger);
        assert_eq!(
            year_month.labelled().keys().cloned().collect::<Vec<_>>(),
            vec!["2024-01".to_string(), "2025-01".to_string()]
        );

        let month_only = MonthlyAggregator::new(&classifier)
            .with_granularity(Granularity::MonthOnly)
            .aggregate(&ledger);
        assert_eq!(month_only.buckets.len(), 1);
        assert_eq!(month_only.buckets[0].transaction_count, 2);
    }

    #[test]
    fn test_opening_balance_carries_previous_closing() {
        let classifier = classifier();
        let ledger = vec![
            tx(ymd(2024, 1, 5), "a", 0.0, 500.0, 500.0),
            tx(ymd(2024, 2, 5), "b", 100.0, 0.0, 400.0),
            tx(ymd(2024, 3, 5), "c", 600.0, 0.0, -200.0),
            tx(ymd(2024, 4, 5), "d", 0.0, 250.0, 50.0),
        ];

        let buckets = MonthlyAggregator::new(&classifier).aggregate(&ledger).buckets;

        assert_eq!(buckets[0].opening_balance, 500.0);
        assert_eq!(buckets[1].opening_balance, 500.0);
        assert_eq!(buckets[2].opening_balance, 400.0);
        // Previous closing is negative: fall back to own closing
        assert_eq!(buckets[3].opening_balance, 50.0);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let classifier = classifier();
        let ledger = vec![
            tx(ymd(2024, 2, 1), "wire transfer", 0.0, 500.0, 1500.0),
            tx(ymd(2024, 1, 5), "Salary", 0.0, 1000.0, 1000.0),
            tx(ymd(2024, 2, 9), "Fee", 20.0, 0.0, 1480.0),
        ];
        let aggregator = MonthlyAggregator::new(&classifier);

        assert_eq!(aggregator.aggregate(&ledger), aggregator.aggregate(&ledger));
    }

    #[test]
    fn test_fluctuation() {
        assert_eq!(fluctuation(&[]), 0.0);
        assert_eq!(fluctuation(&[1234.0]), 0.0);
        assert_eq!(fluctuation(&[-50.0, 50.0]), 0.0);
        assert_eq!(fluctuation(&[100.0, 100.0, 100.0]), 0.0);

        // mean 150, sample stdev 70.71..
        let value = fluctuation(&[100.0, 200.0]);
        assert!((value - 47.140452).abs() < 1e-5);

        for samples in [vec![-10.0, -30.0], vec![5.0, -400.0, 12.0], vec![1e6, 3.0]] {
            assert!(fluctuation(&samples) >= 0.0, "samples {samples:?}");
        }
    }

    #[test]
    fn test_fluctuation_with_balances_near_f64_max() {
        let classifier = classifier();
        let huge = "9".repeat(308).parse::<f64>().unwrap();
        let ledger = vec![
            tx(ymd(2024, 6, 1), "x", 0.0, 0.0, huge),
            tx(ymd(2024, 6, 2), "y", 0.0, 0.0, huge),
            tx(ymd(2024, 6, 3), "z", 0.0, 0.0, huge * 0.9),
        ];

        let bucket = &MonthlyAggregator::new(&classifier).aggregate(&ledger).buckets[0];
        assert!(bucket.fluctuation.is_finite());
        assert!(bucket.fluctuation > 0.0);

        assert_eq!(fluctuation(&[huge, huge]), 0.0);
        assert_eq!(fluctuation(&[f64::MAX, -f64::MAX]), 0.0);
        assert_eq!(fluctuation(&[f64::INFINITY, 1.0]), 0.0);
    }

    #[test]
    fn test_single_transaction_bucket_has_zero_fluctuation() {
        let classifier = classifier();
        let ledger = vec![tx(ymd(2024, 5, 1), "x", 0.0, 10.0, 10.0)];
        let buckets = MonthlyAggregator::new(&classifier).aggregate(&ledger).buckets;
        assert_eq!(buckets[0].fluctuation, 0.0);
    }

    #[test]
    fn test_international_inward_scenario() {
        let classifier = classifier();
        let ledger = vec![
            tx(ymd(2024, 3, 2), "Incoming WIRE TRANSFER ref 88", 0.0, 500.0, 900.0),
            tx(ymd(2024, 3, 3), "Groceries", 30.0, 0.0, 870.0),
        ];

        let bucket = &MonthlyAggregator::new(&classifier).aggregate(&ledger).buckets[0];

        assert_eq!(bucket.international_inward_count, 1);
        assert_eq!(bucket.international_inward_total, 500.0);
        assert_eq!(bucket.international_outward_count, 0);
    }

    #[test]
    fn test_both_sided_international_counts_twice() {
        let classifier = classifier();
        let ledger = vec![tx(ymd(2024, 3, 2), "SWIFT", 20.0, 500.0, 900.0)];

        let bucket = &MonthlyAggregator::new(&classifier).aggregate(&ledger).buckets[0];

        assert_eq!(bucket.international_inward_count, 1);
        assert_eq!(bucket.international_outward_count, 1);
        assert_eq!(bucket.international_outward_total, 20.0);
    }

    #[test]
    fn test_unparsed_dates_policy() {
        let classifier = classifier();
        let mut sentinel = tx(ymd(2030, 6, 1), "??", 5.0, 0.0, -5.0);
        sentinel.issues.push(TransactionIssue::UnparsedDate {
            raw: "garbage".to_string(),
        });
        let ledger = vec![tx(ymd(2024, 1, 5), "a", 0.0, 10.0, 10.0), sentinel];

        let excluded = MonthlyAggregator::new(&classifier).aggregate(&ledger);
        assert_eq!(excluded.buckets.len(), 1);
        assert_eq!(excluded.excluded, 1);

        let bucketed = MonthlyAggregator::new(&classifier)
            .with_unparsed_dates(UnparsedDatePolicy::Bucket)
            .aggregate(&ledger);
        assert_eq!(bucketed.buckets.len(), 2);
        assert_eq!(bucketed.excluded, 0);
    }
}
