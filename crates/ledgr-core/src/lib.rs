//! Core library for bank statement normalization and analytics.
//!
//! This crate provides:
//! - Locale detection and per-locale row/header patterns (English, Arabic)
//! - Lenient amount and date parsing with tagged outcomes
//! - An ordered extraction strategy ladder with a loose line-scan fallback
//! - Candidate row normalization into a canonical ledger
//! - Monthly bucketing and portfolio analytics (stability, overdrafts, foreign exposure)
//! - PDF text extraction (feature `pdf`)

pub mod analytics;
pub mod engine;
pub mod error;
pub mod models;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod statement;

pub use analytics::{AnalyticsCalculator, MonthlyAggregator, MonthlyAnalysis};
pub use engine::StatementEngine;
pub use error::{FieldError, LedgrError, Result, SourceError, StrategyError};
pub use models::config::LedgrConfig;
pub use models::report::{
    AnalyticsSummary, MonthKey, MonthlyBucket, ProcessingMetadata, StatementReport,
};
pub use models::transaction::{
    BalanceSource, CandidateRow, StatementHeader, Transaction, TransactionIssue,
};
#[cfg(feature = "pdf")]
pub use pdf::{PdfExtractor, TextSource};
pub use statement::rules::{
    detect_locale, parse_amount, parse_date, Classification, KeywordClassifier, Locale,
    PatternRegistry, TransactionClassifier,
};
pub use statement::{
    parse_candidate_document, CandidateDocument, ExtractionStrategy, LooseLineScanner,
    PatternRowStrategy, SourceDocument, StrategySelector,
};
