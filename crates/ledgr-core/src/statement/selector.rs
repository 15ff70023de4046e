//! Ordered extraction strategy ladder.

use tracing::{debug, info, warn};

use super::extractor::{LooseLineScanner, PatternRowStrategy};
use super::rules::{Locale, PatternRegistry};
use super::{ExtractionStrategy, SourceDocument};
use crate::models::config::ExtractionConfig;
use crate::models::transaction::CandidateRow;

/// Record of one strategy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    pub strategy: String,
    pub rows: usize,
    /// Error text when the strategy failed; a failure counts as zero rows.
    pub error: Option<String>,
}

/// Outcome of running the ladder over one document.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Name of the strategy whose rows were taken, if any produced rows.
    pub strategy: Option<String>,
    pub rows: Vec<CandidateRow>,
    pub attempts: Vec<StrategyAttempt>,
}

impl Selection {
    /// Attempts that ended in an error.
    pub fn failures(&self) -> impl Iterator<Item = &StrategyAttempt> {
        self.attempts.iter().filter(|a| a.error.is_some())
    }
}

/// Runs strategies in order and keeps the first non-empty result.
///
/// Errors from strategies are logged and swallowed. When every strategy
/// comes back empty, the loose line scan (if enabled) gets the last word.
pub struct StrategySelector {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    fallback: Option<LooseLineScanner>,
}

impl StrategySelector {
    /// Empty ladder without a fallback.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
            fallback: None,
        }
    }

    /// The in-engine ladder: registry row patterns, then the loose scan
    /// when the configuration allows it.
    pub fn from_config(config: &ExtractionConfig, registry: PatternRegistry) -> Self {
        let selector = Self::new().with_strategy(PatternRowStrategy::new(registry));
        if config.loose_fallback {
            selector.with_loose_fallback(LooseLineScanner::new(
                config.placeholder_description.clone(),
            ))
        } else {
            selector
        }
    }

    /// Append a strategy to the end of the ladder.
    pub fn with_strategy(mut self, strategy: impl ExtractionStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn with_loose_fallback(mut self, scanner: LooseLineScanner) -> Self {
        self.fallback = Some(scanner);
        self
    }

    /// Names of the configured strategies, in order.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the ladder over a document.
    pub fn select(&self, document: &SourceDocument, locale: Locale) -> Selection {
        let mut selection = Selection::default();

        let mut ladder: Vec<&dyn ExtractionStrategy> = self
            .strategies
            .iter()
            .map(|s| s.as_ref() as &dyn ExtractionStrategy)
            .collect();
        if let Some(fallback) = &self.fallback {
            ladder.push(fallback);
        }

        for strategy in ladder {
            let name = strategy.name().to_string();
            let (rows, error) = match strategy.extract(document, locale) {
                Ok(rows) => (rows, None),
                Err(e) => {
                    warn!("Strategy {} failed on {}: {}", name, document.id, e);
                    (Vec::new(), Some(e.to_string()))
                }
            };

            debug!("Strategy {} produced {} rows", name, rows.len());
            selection.attempts.push(StrategyAttempt {
                strategy: name.clone(),
                rows: rows.len(),
                error,
            });

            if !rows.is_empty() {
                info!("Using {} rows from strategy {}", rows.len(), name);
                selection.strategy = Some(name);
                selection.rows = rows;
                return selection;
            }
        }

        warn!("No strategy produced rows for {}", document.id);
        selection
    }
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default(), PatternRegistry::new())
    }
}
