//! Keyword-based transaction classification.

use crate::models::config::KeywordConfig;

const EN_INBOUND: &[&str] = &["incoming transfer", "deposit", "credit", "salary", "refund"];
const EN_OUTBOUND: &[&str] = &[
    "outgoing transfer",
    "withdrawal",
    "debit",
    "fee",
    "purchase",
    "gosi fee",
];
const EN_INTERNATIONAL: &[&str] = &["international", "swift", "wire", "transfer", "intl"];

const AR_INBOUND: &[&str] = &["إيداع", "وارد", "راتب"];
const AR_OUTBOUND: &[&str] = &["رسوم", "صادر", "سحب", "شراء"];
const AR_INTERNATIONAL: &[&str] = &["دولي", "حوالة", "سويفت"];

/// How a description reads to a classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    /// Looks like money coming in.
    pub inbound: bool,
    /// Looks like money going out.
    pub outbound: bool,
    /// Looks cross-border.
    pub international: bool,
}

impl Classification {
    /// Direction when exactly one of inbound/outbound matched.
    pub fn direction(&self) -> Option<Direction> {
        match (self.inbound, self.outbound) {
            (true, false) => Some(Direction::Inbound),
            (false, true) => Some(Direction::Outbound),
            _ => None,
        }
    }
}

/// Unambiguous money direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Capability that reads a transaction description.
pub trait TransactionClassifier {
    fn classify(&self, description: &str) -> Classification;
}

/// Lowercased keyword lists for one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    pub inbound: Vec<String>,
    pub outbound: Vec<String>,
    pub international: Vec<String>,
}

impl KeywordSet {
    /// Built-in English keywords.
    pub fn english() -> Self {
        Self {
            inbound: owned(EN_INBOUND),
            outbound: owned(EN_OUTBOUND),
            international: owned(EN_INTERNATIONAL),
        }
    }

    /// Built-in Arabic keywords. Statements in Arabic are usually bilingual,
    /// so the English lists are included.
    pub fn arabic() -> Self {
        let mut set = Self {
            inbound: owned(AR_INBOUND),
            outbound: owned(AR_OUTBOUND),
            international: owned(AR_INTERNATIONAL),
        };
        let english = Self::english();
        set.inbound.extend(english.inbound);
        set.outbound.extend(english.outbound);
        set.international.extend(english.international);
        set
    }

    /// Append configured keywords, skipping blanks and duplicates.
    pub fn extend(&mut self, extra: &KeywordConfig) {
        push_unique(&mut self.inbound, &extra.inbound);
        push_unique(&mut self.outbound, &extra.outbound);
        push_unique(&mut self.international, &extra.international);
    }
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

fn push_unique(target: &mut Vec<String>, words: &[String]) {
    for word in words {
        let word = word.trim().to_lowercase();
        if !word.is_empty() && !target.contains(&word) {
            target.push(word);
        }
    }
}

/// Substring keyword matcher over a [`KeywordSet`].
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: KeywordSet,
}

impl KeywordClassifier {
    pub fn new(keywords: KeywordSet) -> Self {
        Self { keywords }
    }
}

impl TransactionClassifier for KeywordClassifier {
    fn classify(&self, description: &str) -> Classification {
        let lowered = description.to_lowercase();
        let any = |words: &[String]| words.iter().any(|w| lowered.contains(w.as_str()));

        Classification {
            inbound: any(&self.keywords.inbound),
            outbound: any(&self.keywords.outbound),
            international: any(&self.keywords.international),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_international_keywords() {
        let classifier = KeywordClassifier::new(KeywordSet::english());

        assert!(classifier.classify("Wire Transfer from ABC").international);
        assert!(classifier.classify("SWIFT INTL 9981").international);
        assert!(!classifier.classify("Coffee shop").international);
    }

    #[test]
    fn test_direction() {
        let classifier = KeywordClassifier::new(KeywordSet::english());

        assert_eq!(
            classifier.classify("Monthly SALARY").direction(),
            Some(Direction::Inbound)
        );
        assert_eq!(
            classifier.classify("GOSI FEE").direction(),
            Some(Direction::Outbound)
        );
        // "debit" and "credit" both present
        assert_eq!(classifier.classify("credit card debit").direction(), None);
    }

    #[test]
    fn test_arabic_set_includes_english() {
        let classifier = KeywordClassifier::new(KeywordSet::arabic());

        assert!(classifier.classify("حوالة دولية").international);
        assert!(classifier.classify("swift transfer").international);
        assert_eq!(classifier.classify("إيداع نقدي").direction(), Some(Direction::Inbound));
    }

    #[test]
    fn test_extend_with_config() {
        let mut set = KeywordSet::english();
        set.extend(&KeywordConfig {
            international: vec!["  Remittance ".to_string(), "wire".to_string(), String::new()],
            ..Default::default()
        });

        assert_eq!(set.international.iter().filter(|w| *w == "wire").count(), 1);
        let classifier = KeywordClassifier::new(set);
        assert!(classifier.classify("REMITTANCE to PK").international);
    }
}
