//! Statement processing pipeline.
//!
//! One [`StatementEngine`] call is one run: locale detection, extraction,
//! normalization, bucketing and analytics, in that order, with no state
//! carried between runs.

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::analytics::{AnalyticsCalculator, MonthlyAggregator};
use crate::models::config::LedgrConfig;
use crate::models::report::{ProcessingMetadata, StatementReport};
use crate::models::transaction::{BalanceSource, CandidateRow, StatementHeader, Transaction};
use crate::statement::rules::{
    detect_locale, extract_header, KeywordClassifier, Locale, PatternRegistry,
    TransactionClassifier,
};
use crate::statement::normalizer::DESCRIPTION_KEYS;
use crate::statement::{
    finish_ledger, CandidateDocument, LedgerStats, SourceDocument, StrategySelector,
    TransactionNormalizer,
};

/// Produces a [`StatementReport`] from text or candidate rows.
pub struct StatementEngine {
    config: LedgrConfig,
    registry: PatternRegistry,
    classifier: Option<Box<dyn TransactionClassifier>>,
    reference_time: NaiveDateTime,
}

impl StatementEngine {
    /// Create an engine. The reference time (the sentinel for unparseable
    /// dates) is the local time now.
    pub fn new(config: LedgrConfig) -> Self {
        let registry = PatternRegistry::new().with_keywords(&config.keywords);
        Self {
            config,
            registry,
            classifier: None,
            reference_time: Local::now().naive_local(),
        }
    }

    /// Replace the per-locale keyword classifier.
    pub fn with_classifier(mut self, classifier: impl TransactionClassifier + 'static) -> Self {
        self.classifier = Some(Box::new(classifier));
        self
    }

    pub fn with_reference_time(mut self, reference_time: NaiveDateTime) -> Self {
        self.reference_time = reference_time;
        self
    }

    pub fn config(&self) -> &LedgrConfig {
        &self.config
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Configured locale, or the detected one.
    pub fn resolve_locale(&self, sample: &str) -> Locale {
        match self.config.locale.force {
            Some(locale) => locale,
            None => detect_locale(sample, self.config.locale.sample_chars).locale,
        }
    }

    /// Built-in ladder: registry row patterns, then the loose line scan.
    pub fn default_selector(&self) -> StrategySelector {
        StrategySelector::from_config(&self.config.extraction, self.registry.clone())
    }

    /// Run the built-in ladder over raw statement text.
    pub fn process_text(&self, text: &str) -> StatementReport {
        let document = SourceDocument::new("text", text);
        self.process_document(&self.default_selector(), &document)
    }

    /// Run a caller-supplied ladder over a document.
    pub fn process_document(
        &self,
        selector: &StrategySelector,
        document: &SourceDocument,
    ) -> StatementReport {
        let locale = self.resolve_locale(&document.text);
        let selection = selector.select(document, locale);
        let header = extract_header(&document.text, locale, &self.registry);

        let warnings = selection
            .failures()
            .map(|a| {
                format!(
                    "strategy {} failed: {}",
                    a.strategy,
                    a.error.as_deref().unwrap_or_default()
                )
            })
            .collect();

        let mut report = self.build_report(&selection.rows, locale, header, warnings);
        report.strategy = selection.strategy;
        report
    }

    /// Process rows handed over by an upstream extractor.
    pub fn process_rows(&self, rows: &[CandidateRow]) -> StatementReport {
        let locale = self.resolve_locale(&description_sample(rows));
        self.build_report(rows, locale, StatementHeader::default(), Vec::new())
    }

    /// Process a parsed upstream JSON document, header included.
    pub fn process_candidates(&self, document: CandidateDocument) -> StatementReport {
        let sample = format!(
            "{}\n{}",
            document.header.customer_name,
            description_sample(&document.rows)
        );
        let locale = self.resolve_locale(&sample);
        self.build_report(&document.rows, locale, document.header, Vec::new())
    }

    fn build_report(
        &self,
        rows: &[CandidateRow],
        locale: Locale,
        mut header: StatementHeader,
        mut warnings: Vec<String>,
    ) -> StatementReport {
        let keyword_classifier;
        let classifier: &dyn TransactionClassifier = match &self.classifier {
            Some(custom) => custom.as_ref(),
            None => {
                keyword_classifier = KeywordClassifier::new(self.registry.keywords(locale).clone());
                &keyword_classifier
            }
        };

        let mut normalizer = TransactionNormalizer::new(
            self.reference_time.date(),
            self.config.extraction.debit_credit_policy,
            classifier,
        );
        let mut ledger = normalizer.normalize_all(rows);
        let stats = finish_ledger(&mut ledger, &self.config.extraction);
        warnings.extend(ledger_warnings(&stats));

        fill_header_balances(&mut header, &ledger);

        let monthly = MonthlyAggregator::from_config(&self.config.analytics, classifier)
            .aggregate(&ledger);
        if monthly.excluded > 0 {
            let message = format!(
                "{} transactions with unparsed dates left out of monthly analysis",
                monthly.excluded
            );
            warn!("{}", message);
            warnings.push(message);
        }

        let analytics = AnalyticsCalculator::new().calculate(&ledger, &monthly.buckets);

        info!(
            "Processed {} transactions into {} monthly buckets ({})",
            ledger.len(),
            monthly.buckets.len(),
            locale
        );

        StatementReport {
            locale,
            strategy: None,
            account_info: header,
            total_transactions: ledger.len(),
            transactions: ledger,
            monthly_analysis: monthly.labelled(),
            analytics,
            warnings,
            metadata: ProcessingMetadata::default(),
        }
    }
}

impl Default for StatementEngine {
    fn default() -> Self {
        Self::new(LedgrConfig::default())
    }
}

fn description_sample(rows: &[CandidateRow]) -> String {
    rows.iter()
        .filter_map(|row| row.text_of(DESCRIPTION_KEYS))
        .collect::<Vec<_>>()
        .join("\n")
}

fn ledger_warnings(stats: &LedgerStats) -> Vec<String> {
    let mut warnings = Vec::new();
    if stats.unparsed_dates > 0 {
        warnings.push(format!(
            "{} dates could not be parsed and were replaced by the processing date",
            stats.unparsed_dates
        ));
    }
    if stats.unparsed_amounts > 0 {
        warnings.push(format!(
            "{} amounts could not be parsed and were read as 0.00",
            stats.unparsed_amounts
        ));
    }
    if stats.both_sides > 0 {
        warnings.push(format!(
            "{} transactions have both debit and credit set",
            stats.both_sides
        ));
    }
    if stats.duplicates_removed > 0 {
        debug!("Removed {} duplicate transactions", stats.duplicates_removed);
    }
    if stats.balances_derived {
        warnings.push("no running balances in source; balances derived from flows".to_string());
    }

    for message in &warnings {
        warn!("{}", message);
    }
    warnings
}

/// Opening and closing balances from the ledger when the header lacks them.
fn fill_header_balances(header: &mut StatementHeader, ledger: &[Transaction]) {
    let mut known = ledger
        .iter()
        .filter(|t| t.balance_source != BalanceSource::Missing);
    let Some(first) = known.next() else {
        return;
    };
    let last = known.last().unwrap_or(first);

    if header.opening_balance.is_none() {
        header.opening_balance = Some(first.balance - first.net());
    }
    if header.closing_balance.is_none() {
        header.closing_balance = Some(last.balance);
    }
}
