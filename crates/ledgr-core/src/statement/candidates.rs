//! Candidate documents: JSON emitted by upstream extractors.
//!
//! Upstream extractors (vision models in particular) return JSON that is
//! only mostly well-formed: wrapped in Markdown fences, prefixed with prose,
//! or split per page. Parsing here is lenient and never fails; unusable
//! input yields an empty document.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::rules::amounts::amount_from_value;
use super::rules::patterns::{CODE_FENCE_END, CODE_FENCE_START, JSON_OBJECT};
use crate::models::transaction::{CandidateRow, StatementHeader};

const NAME_KEYS: &[&str] = &["account_holder_name", "customer_name"];
const ACCOUNT_KEYS: &[&str] = &["account_number"];
const IBAN_KEYS: &[&str] = &["iban_number", "iban"];
const ID_KEYS: &[&str] = &["id_or_iqama_number", "id_number"];
const CITY_KEYS: &[&str] = &["city"];
const PERIOD_KEYS: &[&str] = &["financial_period"];

/// Header fields plus raw candidate rows from one upstream response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateDocument {
    pub header: StatementHeader,
    pub rows: Vec<CandidateRow>,
}

impl CandidateDocument {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.header.is_empty()
    }

    /// Fold another page into this one: header fields keep their first
    /// non-empty value, rows are appended.
    pub fn merge(&mut self, other: CandidateDocument) {
        self.header.merge_missing(other.header);
        self.rows.extend(other.rows);
    }

    /// Merge per-page documents in page order.
    pub fn merge_pages(pages: impl IntoIterator<Item = CandidateDocument>) -> Self {
        pages.into_iter().fold(Self::default(), |mut acc, page| {
            acc.merge(page);
            acc
        })
    }
}

/// Parse an upstream JSON response into a candidate document.
pub fn parse_candidate_document(text: &str) -> CandidateDocument {
    let Some(value) = parse_lenient_json(text) else {
        warn!("Upstream response contained no usable JSON ({} chars)", text.len());
        return CandidateDocument::default();
    };

    let document = match value {
        Value::Array(items) => CandidateDocument {
            header: StatementHeader::default(),
            rows: rows_from_items(&items),
        },
        Value::Object(map) => document_from_object(&map),
        other => {
            warn!("Unexpected JSON root: {}", type_name(&other));
            CandidateDocument::default()
        }
    };

    debug!("Candidate document with {} rows", document.rows.len());
    document
}

fn parse_lenient_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    let without_start = CODE_FENCE_START.replace(trimmed, "");
    let without_fences = CODE_FENCE_END.replace(without_start.trim(), "");
    let body = without_fences.trim();

    if let Ok(value) = serde_json::from_str(body) {
        return Some(value);
    }

    JSON_OBJECT
        .find(body)
        .and_then(|m| serde_json::from_str(m.as_str()).ok())
}

fn document_from_object(map: &Map<String, Value>) -> CandidateDocument {
    let text = |keys: &[&str]| {
        keys.iter()
            .filter_map(|k| map.get(*k))
            .find_map(value_text)
            .unwrap_or_default()
    };
    let amount = |key: &str| map.get(key).and_then(amount_from_value).and_then(Result::ok);

    let city = text(CITY_KEYS);
    let id_number = text(ID_KEYS);
    let header = StatementHeader {
        customer_name: text(NAME_KEYS),
        city: (!city.is_empty()).then_some(city),
        account_number: text(ACCOUNT_KEYS),
        iban_number: text(IBAN_KEYS),
        id_number: (!id_number.is_empty()).then_some(id_number),
        opening_balance: amount("opening_balance"),
        closing_balance: amount("closing_balance"),
        financial_period: text(PERIOD_KEYS),
    };

    let rows = match map.get("transactions") {
        Some(Value::Array(items)) => rows_from_items(items),
        _ => Vec::new(),
    };

    CandidateDocument { header, rows }
}

fn rows_from_items(items: &[Value]) -> Vec<CandidateRow> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(fields) => {
                let mut row = CandidateRow::new();
                for (key, value) in fields {
                    row.insert(key, value.clone());
                }
                Some(row)
            }
            _ => None,
        })
        .collect()
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
