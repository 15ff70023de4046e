//! Rule-based building blocks for bank statements.

pub mod amounts;
pub mod dates;
pub mod header;
pub mod keywords;
pub mod locale;
pub mod patterns;

pub use amounts::{amount_from_value, parse_amount, parse_amount_outcome};
pub use dates::{parse_date, parse_date_or, parse_date_outcome};
pub use header::extract_header;
pub use keywords::{
    Classification, Direction, KeywordClassifier, KeywordSet, TransactionClassifier,
};
pub use locale::{detect_locale, normalize_digits, normalize_line, Locale, LocaleDetection};
pub use patterns::{HeaderField, PatternRegistry};
