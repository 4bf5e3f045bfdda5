// Character-level cleanup of OCR'd MRZ text.
// Confusable correction is opt-in: the decoder never rewrites characters on
// its own, and clean input passes through unchanged.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::models::FILLER;

/// Character classes an MRZ slice can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Numeric,
    Alphabetic,
}

/// Letter/digit pairs OCR engines commonly swap on MRZ fonts.
pub const CONFUSABLE_PAIRS: [(char, char); 6] = [
    ('O', '0'),
    ('I', '1'),
    ('S', '5'),
    ('B', '8'),
    ('G', '6'),
    ('Z', '2'),
];

lazy_static! {
    static ref FIELD_CHAR_PREFERENCES: HashMap<FieldType, HashMap<char, char>> = {
        let mut prefs = HashMap::new();
        prefs.insert(
            FieldType::Numeric,
            CONFUSABLE_PAIRS.iter().map(|&(letter, digit)| (letter, digit)).collect(),
        );
        prefs.insert(
            FieldType::Alphabetic,
            CONFUSABLE_PAIRS.iter().map(|&(letter, digit)| (digit, letter)).collect(),
        );
        prefs
    };
}

/// Rewrites confusable characters toward the class `field_type` expects.
/// Fillers and characters outside the table are kept as they are.
pub fn correct_text_with_context(text: &str, field_type: FieldType) -> String {
    let preferences = &FIELD_CHAR_PREFERENCES[&field_type];
    text.chars()
        .map(|c| preferences.get(&c).copied().unwrap_or(c))
        .collect()
}

/// Normalizes one OCR'd MRZ line: uppercase, separator noise read as
/// filler, anything outside `A-Z0-9<` dropped.
pub fn clean_mrz_line(line: &str) -> String {
    line.trim()
        .chars()
        .filter_map(|c| match c {
            ' ' | '_' | '-' | '.' | '«' | '‹' => Some(FILLER),
            c if c.is_ascii_alphanumeric() => Some(c.to_ascii_uppercase()),
            FILLER => Some(FILLER),
            _ => None,
        })
        .collect()
}
