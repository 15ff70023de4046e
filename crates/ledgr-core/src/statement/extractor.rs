//! In-engine line extractors.

use regex::Captures;
use tracing::{debug, trace};

use super::rules::patterns::{DATE_TOKEN, NUMBER_TOKEN, WHITESPACE};
use super::rules::{normalize_line, Locale, PatternRegistry};
use super::{ExtractionStrategy, SourceDocument};
use crate::error::StrategyError;
use crate::models::transaction::CandidateRow;

const NUMERIC_GROUPS: [&str; 4] = ["debit", "credit", "balance", "amount"];

/// Matches whole lines against the registry's row patterns.
///
/// Patterns are tried in priority order over the full document; the first
/// pattern that yields at least one row wins and later patterns are not run.
#[derive(Debug, Clone, Default)]
pub struct PatternRowStrategy {
    registry: PatternRegistry,
}

impl PatternRowStrategy {
    pub fn new(registry: PatternRegistry) -> Self {
        Self { registry }
    }

    fn row_from_captures(caps: &Captures<'_>, line_number: usize) -> CandidateRow {
        let mut row = CandidateRow::new()
            .with("date", caps.name("date").map_or("", |m| m.as_str()))
            .with(
                "description",
                caps.name("desc").map_or("", |m| m.as_str().trim()),
            )
            .with("line_number", line_number);

        for group in NUMERIC_GROUPS {
            if let Some(m) = caps.name(group) {
                row.insert(group, m.as_str());
            }
        }
        row
    }
}

impl ExtractionStrategy for PatternRowStrategy {
    fn name(&self) -> &str {
        "pattern_rows"
    }

    fn extract(
        &self,
        document: &SourceDocument,
        locale: Locale,
    ) -> Result<Vec<CandidateRow>, StrategyError> {
        let lines: Vec<(usize, String)> = document
            .numbered_lines()
            .map(|(n, line)| (n, normalize_line(line, locale)))
            .filter(|(_, line)| !line.is_empty())
            .collect();

        for (index, pattern) in self.registry.row_patterns(locale).iter().enumerate() {
            let rows: Vec<CandidateRow> = lines
                .iter()
                .filter_map(|(n, line)| {
                    pattern
                        .captures(line)
                        .map(|caps| Self::row_from_captures(&caps, *n))
                })
                .collect();

            debug!("Row pattern {} ({}) matched {} lines", index, locale, rows.len());
            if !rows.is_empty() {
                return Ok(rows);
            }
        }

        Ok(Vec::new())
    }
}

/// Structural fallback: any line with a date and at least three numbers.
///
/// The last three numbers on the line are read as debit, credit and
/// balance. The description is the text after the date with the numbers
/// removed, or the placeholder when nothing is left.
#[derive(Debug, Clone)]
pub struct LooseLineScanner {
    placeholder: String,
}

impl LooseLineScanner {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }

    /// Scan a single, already normalized line.
    pub fn scan_line(&self, line: &str, line_number: usize) -> Option<CandidateRow> {
        let date = DATE_TOKEN.find(line)?;
        let before = &line[..date.start()];
        let after = &line[date.end()..];

        let numbers: Vec<&str> = NUMBER_TOKEN
            .find_iter(before)
            .chain(NUMBER_TOKEN.find_iter(after))
            .map(|m| m.as_str())
            .collect();
        if numbers.len() < 3 {
            return None;
        }
        let &[debit, credit, balance] = &numbers[numbers.len() - 3..] else {
            return None;
        };

        let stripped = NUMBER_TOKEN.replace_all(after, " ");
        let description = WHITESPACE.replace_all(stripped.trim(), " ");
        let description = if description.is_empty() {
            self.placeholder.clone()
        } else {
            description.into_owned()
        };

        trace!("Loose match on line {}: {}", line_number, line);

        Some(
            CandidateRow::new()
                .with("date", date.as_str())
                .with("description", description)
                .with("debit", debit)
                .with("credit", credit)
                .with("balance", balance)
                .with("line_number", line_number),
        )
    }
}

impl Default for LooseLineScanner {
    fn default() -> Self {
        Self::new("Transaction")
    }
}

impl ExtractionStrategy for LooseLineScanner {
    fn name(&self) -> &str {
        "loose_scan"
    }

    fn extract(
        &self,
        document: &SourceDocument,
        locale: Locale,
    ) -> Result<Vec<CandidateRow>, StrategyError> {
        Ok(document
            .numbered_lines()
            .filter_map(|(n, line)| self.scan_line(&normalize_line(line, locale), n))
            .collect())
    }
}
