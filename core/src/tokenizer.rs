use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Tokens shorter than this (in characters) are dropped.
pub const MIN_TOKEN_CHARS: usize = 2;

lazy_static! {
    // \w and \s are Unicode-aware, so umlauts, ß and accented letters survive.
    static ref PUNCT: Regex = Regex::new(r"[^\w\s]").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            // articles
            "der","die","das","den","dem","des",
            "ein","eine","einer","eines","einem","einen",
            // prepositions and conjunctions
            "in","im","an","am","auf","und","oder","mit","bei",
            "zu","zum","zur","von","für","aus","nach",
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Tokenize free text: NFC + lowercase, punctuation replaced by spaces, split on
/// whitespace, then drop stop words and tokens shorter than two characters.
///
/// Order and duplicates are preserved. Never fails; empty input gives an empty vec.
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let normalized = text.nfc().collect::<String>().to_lowercase();
    let cleaned = PUNCT.replace_all(&normalized, " ");
    cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS && !is_stopword(t))
        .map(str::to_string)
        .collect()
}
