//! Configuration structures for the statement pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LedgrError, Result};
use crate::statement::rules::Locale;

/// Main configuration for the ledgr pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgrConfig {
    /// Locale detection configuration.
    pub locale: LocaleConfig,

    /// Transaction extraction configuration.
    pub extraction: ExtractionConfig,

    /// Monthly aggregation configuration.
    pub analytics: AnalyticsConfig,

    /// Extra classification keywords.
    pub keywords: KeywordConfig,
}

/// Locale detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Number of leading characters sampled for script counting.
    pub sample_chars: usize,

    /// Skip detection and always use this locale.
    pub force: Option<Locale>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            sample_chars: 1000,
            force: None,
        }
    }
}

/// What to do when a source row has both debit and credit set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebitCreditPolicy {
    /// Keep both values and record an issue on the transaction.
    #[default]
    Flag,
    /// Keep the larger side, zero the other (ties keep credit).
    LargerWins,
    /// Keep both values without recording anything.
    Keep,
}

/// Transaction extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Run the loose line scan when every strategy comes back empty.
    pub loose_fallback: bool,

    /// Description used when the loose scan finds no text.
    pub placeholder_description: String,

    /// Handling of rows with both debit and credit.
    pub debit_credit_policy: DebitCreditPolicy,

    /// Recompute balances when no row supplied one.
    pub derive_missing_balances: bool,

    /// Drop exact duplicate transactions.
    pub deduplicate: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            loose_fallback: true,
            placeholder_description: "Transaction".to_string(),
            debit_credit_policy: DebitCreditPolicy::default(),
            derive_missing_balances: true,
            deduplicate: false,
        }
    }
}

/// Bucket key granularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One bucket per calendar year and month.
    #[default]
    YearMonth,
    /// One bucket per month name; merges the same month of different years.
    MonthOnly,
}

/// Treatment of transactions whose date could not be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnparsedDatePolicy {
    /// Leave them out of the monthly buckets.
    #[default]
    Exclude,
    /// Bucket them under the sentinel date.
    Bucket,
}

/// Monthly aggregation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub granularity: Granularity,
    pub unparsed_dates: UnparsedDatePolicy,
}

/// Keywords appended to the built-in per-locale sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub inbound: Vec<String>,
    pub outbound: Vec<String>,
    pub international: Vec<String>,
}

impl LedgrConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| LedgrError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
