//! Whitespace tokenizer shared by indexing and querying
//!
//! Indexing and querying deliberately tokenize differently:
//! - Index tokens are lowercased, stripped of surrounding punctuation and
//!   must be longer than two bytes.
//! - Query tokens are only lowercased. `"rust?"` in a question therefore
//!   never matches the indexed `"rust"`, and short query words are kept
//!   (they simply never match anything).

use std::collections::HashMap;

/// Characters stripped from both ends of an index token
pub const TRIM_CHARS: &[char] = &['.', ',', '!', '?', '(', ')', '[', ']', '{', '}', '"', '\''];

/// Index tokens must be strictly longer than this many bytes
pub const MIN_TOKEN_LEN: usize = 2;

/// Tokenize document text for the keyword index
pub fn index_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|word| word.to_lowercase())
        .map(|word| word.trim_matches(TRIM_CHARS).to_string())
        .filter(|word| word.len() > MIN_TOKEN_LEN)
}

/// Tokenize a query. No trimming, no length filter.
pub fn query_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect()
}

/// Count occurrences of every index token in `text`
pub fn keyword_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in index_tokens(text) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}
