//! Compiled regex registry for statement extraction.
//!
//! Row patterns capture named groups `date`, `desc` and up to three numeric
//! fields (`debit`, `credit`, `balance`, or a signed `amount`). Patterns are
//! listed in priority order per locale.

use lazy_static::lazy_static;
use regex::Regex;

use super::keywords::KeywordSet;
use super::locale::Locale;
use crate::models::config::KeywordConfig;

/// Day-first, month-first or year-first date with `/` or `-`.
const DATE: &str = r"\d{4}[/-]\d{1,2}[/-]\d{1,2}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4}";

/// Unsigned amount with optional thousands separators.
const NUM: &str = r"\d[\d,]*(?:\.\d+)?";

/// Signed amount.
const SIGNED_NUM: &str = r"-?\d[\d,]*(?:\.\d+)?";

fn row(template: &str) -> Regex {
    let pattern = template
        .replace("{DATE}", DATE)
        .replace("{SNUM}", SIGNED_NUM)
        .replace("{NUM}", NUM);
    Regex::new(&pattern).unwrap()
}

lazy_static! {
    // Tokens used by the loose line scan
    pub static ref DATE_TOKEN: Regex = Regex::new(
        r"\b(?:\d{4}[/-]\d{1,2}[/-]\d{1,2}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})\b"
    ).unwrap();

    // Date somewhere inside a longer value, e.g. an ISO timestamp
    pub static ref EMBEDDED_DATE: Regex = Regex::new(
        r"\d{4}[/-]\d{1,2}[/-]\d{1,2}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4}"
    ).unwrap();

    pub static ref NUMBER_TOKEN: Regex = Regex::new(
        r"-?\d[\d,]*(?:\.\d+)?"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    // Amount cleanup: first signed decimal in a separator-free string
    pub static ref AMOUNT_VALUE: Regex = Regex::new(r"-?\d+(?:\.\d+)?").unwrap();

    // Upstream JSON responses
    pub static ref CODE_FENCE_START: Regex = Regex::new(r"(?i)^```(?:json)?").unwrap();
    pub static ref CODE_FENCE_END: Regex = Regex::new(r"```$").unwrap();
    pub static ref JSON_OBJECT: Regex = Regex::new(r"(?s)\{.*\}").unwrap();

    // English row patterns
    pub static ref EN_ROW_PATTERNS: Vec<Regex> = vec![
        // 05/01/2024  Salary ACME  0.00  5,000.00  7,250.00
        row(r"^(?P<date>{DATE})\s+(?P<desc>.+?)\s+(?P<debit>{NUM})\s+(?P<credit>{NUM})\s+(?P<balance>{SNUM})\s*$"),
        // Same columns with SAR suffixes
        row(r"(?i)^(?P<date>{DATE})\s+(?P<desc>.+?)\s+(?P<debit>{NUM})\s*(?:SAR)?\s+(?P<credit>{NUM})\s*(?:SAR)?\s+(?P<balance>{SNUM})\s*(?:SAR)?\s*$"),
        // Single signed amount and running balance
        row(r"(?i)^(?P<date>{DATE})\s+(?P<desc>.+?)\s+(?P<amount>{SNUM})\s*(?:SAR)?\s+(?P<balance>{SNUM})\s*(?:SAR)?\s*$"),
    ];

    // Arabic row patterns (lines are digit-normalized first)
    pub static ref AR_ROW_PATTERNS: Vec<Regex> = vec![
        // Date first, as rendered by most text extractors
        row(r"^(?P<date>{DATE})\s+(?P<desc>.+?)\s+(?P<debit>{NUM})\s*(?:ر\.س|SAR)?\s+(?P<credit>{NUM})\s*(?:ر\.س|SAR)?\s+(?P<balance>{SNUM})\s*(?:ر\.س|SAR)?\s*$"),
        // Right-to-left column order: balance, credit, debit, description, date
        row(r"^(?P<balance>{SNUM})\s*(?:ر\.س|SAR)?\s+(?P<credit>{NUM})\s*(?:ر\.س|SAR)?\s+(?P<debit>{NUM})\s*(?:ر\.س|SAR)?\s+(?P<desc>.+?)\s+(?P<date>{DATE})$"),
    ];

    // English header fields
    pub static ref EN_HEADER_PATTERNS: Vec<(HeaderField, Regex)> = vec![
        (HeaderField::CustomerName, Regex::new(r"(?i)Customer Name[ \t:]+([^\n]+)").unwrap()),
        (HeaderField::City, Regex::new(r"(?i)\bCity[ \t:]+([^\n]+)").unwrap()),
        (HeaderField::AccountNumber, Regex::new(r"(?i)Account Number[ \t:]+(\d+)").unwrap()),
        (HeaderField::IbanNumber, Regex::new(r"(?i)IBAN(?: Number)?[ \t:]+([A-Z0-9]+)").unwrap()),
        (HeaderField::OpeningBalance, Regex::new(r"(?i)Opening Balance[ \t:]+(-?[\d,]+\.?\d*)").unwrap()),
        (HeaderField::ClosingBalance, Regex::new(r"(?i)Closing Balance[ \t:]+(-?[\d,]+\.?\d*)").unwrap()),
        (HeaderField::FinancialPeriod, Regex::new(r"(?i)On The Period[ \t:]+([\d/]+\s*-\s*[\d/]+)").unwrap()),
    ];

    // Arabic header fields (bilingual labels)
    pub static ref AR_HEADER_PATTERNS: Vec<(HeaderField, Regex)> = vec![
        (HeaderField::CustomerName, Regex::new(r"(?i)(?:اسم العميل|Customer Name)[ \t:]+([^\n]+)").unwrap()),
        (HeaderField::City, Regex::new(r"(?i)(?:المدينة|\bCity)[ \t:]+([^\n]+)").unwrap()),
        (HeaderField::AccountNumber, Regex::new(r"(?i)(?:رقم الحساب|Account Number)[ \t:]+(\d+)").unwrap()),
        (HeaderField::IbanNumber, Regex::new(r"(?i)(?:رقم الآيبان|IBAN(?: Number)?)[ \t:]+([A-Z0-9]+)").unwrap()),
        (HeaderField::OpeningBalance, Regex::new(r"(?i)(?:الرصيد[^\n]*?الإفتتاحي|Opening Balance)[ \t:]+(-?[\d,]+\.?\d*)").unwrap()),
        (HeaderField::ClosingBalance, Regex::new(r"(?i)(?:الرصيد[^\n]*?الإقفال|Closing Balance)[ \t:]+(-?[\d,]+\.?\d*)").unwrap()),
        (HeaderField::FinancialPeriod, Regex::new(r"(?i)(?:خلال الفترة|On The Period)[ \t:]+([\d/]+\s*-\s*[\d/]+)").unwrap()),
    ];
}

/// Statement header field captured by a header pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    CustomerName,
    City,
    AccountNumber,
    IbanNumber,
    OpeningBalance,
    ClosingBalance,
    FinancialPeriod,
}

/// Per-locale patterns and keyword sets. Pure configuration: it selects
/// what to match with and never matches anything itself.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    english: KeywordSet,
    arabic: KeywordSet,
}

impl PatternRegistry {
    /// Registry with the built-in keyword sets.
    pub fn new() -> Self {
        Self {
            english: KeywordSet::english(),
            arabic: KeywordSet::arabic(),
        }
    }

    /// Append configured keywords to every locale's sets.
    pub fn with_keywords(mut self, extra: &KeywordConfig) -> Self {
        self.english.extend(extra);
        self.arabic.extend(extra);
        self
    }

    /// Row patterns for a locale, in priority order.
    pub fn row_patterns(&self, locale: Locale) -> &'static [Regex] {
        match locale {
            Locale::English => EN_ROW_PATTERNS.as_slice(),
            Locale::Arabic => AR_ROW_PATTERNS.as_slice(),
        }
    }

    /// Header field patterns for a locale.
    pub fn header_patterns(&self, locale: Locale) -> &'static [(HeaderField, Regex)] {
        match locale {
            Locale::English => EN_HEADER_PATTERNS.as_slice(),
            Locale::Arabic => AR_HEADER_PATTERNS.as_slice(),
        }
    }

    /// Classification keywords for a locale.
    pub fn keywords(&self, locale: Locale) -> &KeywordSet {
        match locale {
            Locale::English => &self.english,
            Locale::Arabic => &self.arabic,
        }
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::new()
    }
}
