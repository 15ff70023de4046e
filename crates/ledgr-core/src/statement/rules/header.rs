//! Statement header (account summary) extraction.

use tracing::debug;

use super::amounts::parse_amount_outcome;
use super::locale::{normalize_digits, Locale};
use super::patterns::{HeaderField, PatternRegistry};
use crate::models::transaction::StatementHeader;

const AR_NAME_LABEL: &str = "اسم العميل";

/// Pull account summary fields out of the statement text. Each field takes
/// the first match of its locale pattern; unmatched fields stay empty.
pub fn extract_header(text: &str, locale: Locale, registry: &PatternRegistry) -> StatementHeader {
    let text = match locale {
        Locale::English => text.to_string(),
        Locale::Arabic => normalize_digits(text),
    };

    let mut header = StatementHeader::default();
    for (field, re) in registry.header_patterns(locale) {
        let Some(value) = re
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
        else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        match field {
            HeaderField::CustomerName => header.customer_name = repair_customer_name(&value, locale),
            HeaderField::City => header.city = Some(value),
            HeaderField::AccountNumber => header.account_number = value,
            HeaderField::IbanNumber => header.iban_number = value,
            HeaderField::OpeningBalance => header.opening_balance = parse_amount_outcome(&value).ok(),
            HeaderField::ClosingBalance => header.closing_balance = parse_amount_outcome(&value).ok(),
            HeaderField::FinancialPeriod => header.financial_period = value,
        }
    }

    debug!(
        "Header extraction: customer={:?}, account={:?}",
        header.customer_name, header.account_number
    );

    header
}

/// Right-to-left extraction can leave the Arabic label in the middle of the
/// captured name with the halves swapped.
fn repair_customer_name(value: &str, locale: Locale) -> String {
    if locale != Locale::Arabic || !value.contains(AR_NAME_LABEL) {
        return value.to_string();
    }

    let mut parts: Vec<&str> = value
        .split(AR_NAME_LABEL)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    parts.reverse();
    parts.join(" ")
}
