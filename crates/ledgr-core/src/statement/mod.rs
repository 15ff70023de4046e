//! Bank statement extraction: rules, strategies and row normalization.

pub mod candidates;
pub mod extractor;
pub mod normalizer;
pub mod rules;
pub mod selector;

pub use candidates::{parse_candidate_document, CandidateDocument};
pub use extractor::{LooseLineScanner, PatternRowStrategy};
pub use normalizer::{finish_ledger, LedgerStats, TransactionNormalizer};
pub use selector::{Selection, StrategyAttempt, StrategySelector};

use crate::error::StrategyError;
use crate::models::transaction::CandidateRow;
use rules::Locale;

/// A statement as handed to extraction strategies.
#[derive(Debug, Clone, Default)]
pub struct SourceDocument {
    /// Caller-chosen identifier, usually a file path.
    pub id: String,
    /// Full extracted text, pages joined by newlines.
    pub text: String,
    /// Number of source pages, when known.
    pub pages: usize,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            pages: 0,
        }
    }

    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages = pages;
        self
    }

    /// Lines with their 1-based line numbers.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.text.lines().enumerate().map(|(i, line)| (i + 1, line))
    }
}

/// One layout-specific way of turning a document into candidate rows.
///
/// Implementations may fail freely; the [`StrategySelector`] treats any
/// error as "no rows" and moves on to the next strategy.
pub trait ExtractionStrategy {
    /// Short name used in logs and the result document.
    fn name(&self) -> &str;

    /// Extract candidate rows from the document.
    fn extract(
        &self,
        document: &SourceDocument,
        locale: Locale,
    ) -> Result<Vec<CandidateRow>, StrategyError>;
}
