//! Report rendering: JSON document, CSV ledger, plain-text summary.

use std::fmt::Write as _;

use ledgr_core::models::transaction::{AmountField, TransactionIssue};
use ledgr_core::{BalanceSource, StatementReport};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON result document
    Json,
    /// CSV ledger rows
    Csv,
    /// Plain text monthly table and analytics
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn format_report(
    report: &StatementReport,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Json => Ok(serde_json::to_string(report)?),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

fn balance_source_label(source: BalanceSource) -> &'static str {
    match source {
        BalanceSource::Statement => "statement",
        BalanceSource::Missing => "missing",
        BalanceSource::Derived => "derived",
    }
}

fn issue_label(issue: &TransactionIssue) -> String {
    match issue {
        TransactionIssue::UnparsedDate { .. } => "unparsed_date".to_string(),
        TransactionIssue::UnparsedAmount { field, .. } => {
            let field = match field {
                AmountField::Debit => "debit",
                AmountField::Credit => "credit",
                AmountField::Balance => "balance",
                AmountField::Amount => "amount",
            };
            format!("unparsed_{}", field)
        }
        TransactionIssue::BothSides { .. } => "both_sides".to_string(),
    }
}

fn format_csv(report: &StatementReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "date",
        "description",
        "debit",
        "credit",
        "balance",
        "balance_source",
        "line_number",
        "issues",
    ])?;

    for tx in &report.transactions {
        let issues: Vec<String> = tx.issues.iter().map(issue_label).collect();
        wtr.write_record([
            &tx.date.to_string(),
            &tx.description,
            &format!("{:.2}", tx.debit),
            &format!("{:.2}", tx.credit),
            &format!("{:.2}", tx.balance),
            balance_source_label(tx.balance_source),
            &tx.line_number.to_string(),
            &issues.join(";"),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &StatementReport) -> String {
    let mut output = String::new();
    let info = &report.account_info;

    // Writing into a String cannot fail.
    let _ = writeln!(output, "Locale: {}", report.locale);
    if let Some(strategy) = &report.strategy {
        let _ = writeln!(output, "Strategy: {}", strategy);
    }
    if !info.customer_name.is_empty() {
        let _ = writeln!(output, "Customer: {}", info.customer_name);
    }
    if !info.account_number.is_empty() {
        let _ = writeln!(output, "Account: {}", info.account_number);
    }
    if !info.iban_number.is_empty() {
        let _ = writeln!(output, "IBAN: {}", info.iban_number);
    }
    if !info.financial_period.is_empty() {
        let _ = writeln!(output, "Period: {}", info.financial_period);
    }
    if let Some(opening) = info.opening_balance {
        let _ = writeln!(output, "Opening balance: {:.2}", opening);
    }
    if let Some(closing) = info.closing_balance {
        let _ = writeln!(output, "Closing balance: {:.2}", closing);
    }
    let _ = writeln!(output, "Transactions: {}", report.total_transactions);
    output.push('\n');

    let _ = writeln!(
        output,
        "{:<8} {:>12} {:>12} {:>12} {:>12} {:>8} {:>6}",
        "Month", "Opening", "Credit", "Debit", "Closing", "Fluct%", "Count"
    );
    for bucket in report.buckets_in_order() {
        let _ = writeln!(
            output,
            "{:<8} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>8.2} {:>6}",
            bucket.key().label(),
            bucket.opening_balance,
            bucket.total_credit,
            bucket.total_debit,
            bucket.closing_balance,
            bucket.fluctuation,
            bucket.transaction_count
        );
    }
    output.push('\n');

    let a = &report.analytics;
    output.push_str("Analytics:\n");
    let _ = writeln!(output, "  Cash flow stability: {:.2}%", a.net_cash_flow_stability);
    let _ = writeln!(output, "  Average fluctuation: {:.2}%", a.average_fluctuation);
    let _ = writeln!(output, "  Total inflow:        {:.2}", a.sum_total_inflow);
    let _ = writeln!(output, "  Total outflow:       {:.2}", a.sum_total_outflow);
    let _ = writeln!(output, "  Average inflow:      {:.2}", a.avg_total_inflow);
    let _ = writeln!(output, "  Average outflow:     {:.2}", a.avg_total_outflow);
    let _ = writeln!(
        output,
        "  Foreign:             {} ({:.2})",
        a.total_foreign_transactions, a.total_foreign_amount
    );
    let _ = writeln!(output, "  Overdrafts:          {}", a.overdraft_frequency);

    if !report.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &report.warnings {
            let _ = writeln!(output, "  - {}", warning);
        }
    }

    output
}
