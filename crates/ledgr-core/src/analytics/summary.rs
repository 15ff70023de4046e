//! Portfolio-level analytics over finalized buckets.

use crate::models::report::{AnalyticsSummary, MonthlyBucket};
use crate::models::transaction::Transaction;

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    if scaled.is_finite() {
        scaled.round() / factor
    } else {
        value
    }
}

/// Derives [`AnalyticsSummary`] from a ledger and its monthly buckets.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsCalculator;

impl AnalyticsCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Averages are taken over the number of buckets, not elapsed months.
    /// Returns the all-zero summary when either input is empty.
    pub fn calculate(&self, ledger: &[Transaction], buckets: &[MonthlyBucket]) -> AnalyticsSummary {
        if ledger.is_empty() || buckets.is_empty() {
            return AnalyticsSummary::default();
        }

        let months = buckets.len() as f64;
        let total_inflow: f64 = buckets.iter().map(|b| b.total_credit).sum();
        let total_outflow: f64 = buckets.iter().map(|b| b.total_debit).sum();
        // Mean of the per-bucket ratios; saturates instead of overflowing.
        let average_fluctuation = buckets
            .iter()
            .map(|b| b.fluctuation / months)
            .filter(|f| !f.is_nan())
            .sum::<f64>()
            .min(f64::MAX);
        let stability = (100.0 - average_fluctuation).clamp(0.0, 100.0);

        let foreign_count: u64 = buckets
            .iter()
            .map(|b| b.international_inward_count + b.international_outward_count)
            .sum();
        let foreign_amount: f64 = buckets
            .iter()
            .map(|b| b.international_inward_total + b.international_outward_total)
            .sum();

        let overdrafts = ledger.iter().filter(|t| t.is_overdrawn()).count() as u64;

        AnalyticsSummary {
            average_fluctuation: round_to(average_fluctuation, 2),
            net_cash_flow_stability: round_to(stability, 4),
            total_foreign_transactions: foreign_count,
            total_foreign_amount: round_to(foreign_amount, 2),
            overdraft_frequency: overdrafts,
            overdraft_total_days: overdrafts,
            sum_total_inflow: round_to(total_inflow, 2),
            sum_total_outflow: round_to(total_outflow, 2),
            avg_total_inflow: round_to(total_inflow / months, 2),
            avg_total_outflow: round_to(total_outflow / months, 2),
        }
    }
}
