//! Script-family locale detection and per-locale line normalization.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::patterns::WHITESPACE;

/// Script/language family of a statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    /// Latin script.
    #[default]
    #[serde(rename = "en")]
    English,
    /// Arabic script (right-to-left).
    #[serde(rename = "ar")]
    Arabic,
}

impl Locale {
    /// Short code (`en`/`ar`).
    pub fn code(&self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Arabic => "ar",
        }
    }

    /// Parse a short code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Locale::English),
            "ar" | "arabic" => Some(Locale::Arabic),
            _ => None,
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of locale detection with the raw character counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleDetection {
    pub locale: Locale,
    pub latin_chars: usize,
    pub arabic_chars: usize,
}

/// Classify a text sample by counting script characters in its first
/// `sample_chars` characters. Arabic wins only with a strictly greater
/// count; ties go to English.
pub fn detect_locale(text: &str, sample_chars: usize) -> LocaleDetection {
    let mut latin_chars = 0;
    let mut arabic_chars = 0;

    for c in text.chars().take(sample_chars) {
        if c.is_ascii_alphabetic() {
            latin_chars += 1;
        } else if is_arabic_char(c) {
            arabic_chars += 1;
        }
    }

    let locale = if arabic_chars > latin_chars {
        Locale::Arabic
    } else {
        Locale::English
    };

    debug!(
        "Detected locale {} (latin={}, arabic={})",
        locale, latin_chars, arabic_chars
    );

    LocaleDetection {
        locale,
        latin_chars,
        arabic_chars,
    }
}

/// Arabic script blocks: base, supplement, extended-A, presentation forms A and B.
pub fn is_arabic_char(c: char) -> bool {
    matches!(
        c,
        '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{08A0}'..='\u{08FF}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}'
    )
}

/// Map Arabic-Indic digits and separators to ASCII, leaving other text alone.
pub fn normalize_digits(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\u{066C}')
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => ascii_digit(c as u32 - 0x0660),
            '\u{06F0}'..='\u{06F9}' => ascii_digit(c as u32 - 0x06F0),
            '\u{066B}' => '.',
            other => other,
        })
        .collect()
}

fn ascii_digit(offset: u32) -> char {
    char::from_digit(offset, 10).unwrap_or('0')
}

/// Prepare one source line for pattern matching: trimmed, and for Arabic
/// statements digit-normalized with whitespace runs collapsed.
pub fn normalize_line(line: &str, locale: Locale) -> String {
    match locale {
        Locale::English => line.trim().to_string(),
        Locale::Arabic => WHITESPACE
            .replace_all(normalize_digits(line).trim(), " ")
            .into_owned(),
    }
}
