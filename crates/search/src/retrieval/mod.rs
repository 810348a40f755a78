//! Keyword-frequency retrieval
//!
//! A document's score for a query is the sum, over every query token, of that
//! token's occurrence count in the document's keyword index. Documents scoring
//! zero are dropped; the rest are ranked by descending score with ties kept in
//! corpus order.

use crate::corpus::{Corpus, Document};
use crate::tokenizer::query_tokens;
use docchat_common::metrics;
use tracing::debug;

/// A document paired with its score for one query
#[derive(Debug, Clone, Copy)]
pub struct ScoredDocument<'a> {
    pub document: &'a Document,
    pub score: usize,
}

/// Score one document against already-tokenized query terms
pub fn score(tokens: &[String], document: &Document) -> usize {
    tokens.iter().map(|token| document.count(token)).sum()
}

/// Rank every document with a non-zero score, highest first.
///
/// `sort_by` is stable, so equal scores keep their corpus order.
pub fn rank<'a>(query: &str, corpus: &'a Corpus) -> Vec<ScoredDocument<'a>> {
    let tokens = query_tokens(query);

    let mut ranked: Vec<ScoredDocument<'a>> = corpus
        .iter()
        .map(|document| ScoredDocument {
            document,
            score: score(&tokens, document),
        })
        .filter(|scored| scored.score > 0)
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    debug!(
        terms = tokens.len(),
        candidates = corpus.len(),
        hits = ranked.len(),
        "Keyword retrieval complete"
    );
    metrics::record_search(ranked.len());

    ranked
}

/// Documents relevant to `query`, most relevant first. Empty means no relevant context.
pub fn search<'a>(query: &str, corpus: &'a Corpus) -> Vec<&'a Document> {
    rank(query, corpus)
        .into_iter()
        .map(|scored| scored.document)
        .collect()
}

/// The single most relevant document, if any scores above zero
pub fn best_match<'a>(query: &str, corpus: &'a Corpus) -> Option<&'a Document> {
    rank(query, corpus).into_iter().next().map(|scored| scored.document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(docs: &[(&str, &str)]) -> Corpus {
        Corpus::from_documents(
            docs.iter()
                .map(|(path, content)| Document::new(*path, *content))
                .collect(),
        )
    }

    fn paths(docs: &[&Document]) -> Vec<String> {
        docs.iter().map(|d| d.path().to_string()).collect()
    }

    #[test]
    fn test_ranks_by_descending_score() {
        let corpus = corpus(&[
            ("one", "rust"),
            ("three", "rust rust rust"),
            ("two", "rust rust"),
        ]);

        let results = search("rust", &corpus);
        assert_eq!(paths(&results), vec!["three", "two", "one"]);
    }

    #[test]
    fn test_equal_scores_keep_corpus_order() {
        let corpus = corpus(&[
            ("first", "tokio runtime"),
            ("best", "tokio tokio runtime"),
            ("second", "runtime tokio"),
            ("third", "tokio and friends runtime"),
        ]);

        let results = search("tokio runtime", &corpus);
        assert_eq!(paths(&results), vec!["best", "first", "second", "third"]);
    }

    #[test]
    fn test_zero_scores_are_dropped() {
        let corpus = corpus(&[
            ("cats", "cats purr softly"),
            ("dogs", "dogs bark loudly"),
        ]);

        let results = search("dogs", &corpus);
        assert_eq!(paths(&results), vec!["dogs"]);

        assert!(search("elephants", &corpus).is_empty());
        assert!(best_match("elephants", &corpus).is_none());
    }

    #[test]
    fn test_empty_corpus() {
        let corpus = Corpus::default();
        assert!(search("anything at all", &corpus).is_empty());
        assert!(rank("anything", &corpus).is_empty());
    }

    #[test]
    fn test_empty_query() {
        let corpus = corpus(&[("doc", "some words here")]);
        assert!(search("", &corpus).is_empty());
        assert!(search("   \t\n", &corpus).is_empty());
    }

    #[test]
    fn test_score_sums_counts_per_query_token() {
        let doc = Document::new("doc", "apple apple banana cherry");
        let tokens = query_tokens("apple banana durian apple");
        // apple counted once per query occurrence: 2 + 1 + 0 + 2
        assert_eq!(score(&tokens, &doc), 5);

        let corpus = corpus(&[("doc", "apple apple banana cherry")]);
        let ranked = rank("apple banana durian apple", &corpus);
        assert_eq!(ranked[0].score, 5);
    }

    #[test]
    fn test_query_case_insensitive() {
        let corpus = corpus(&[("doc", "Ownership and Borrowing")]);
        assert_eq!(paths(&search("OWNERSHIP", &corpus)), vec!["doc"]);
    }

    #[test]
    fn test_query_punctuation_not_trimmed() {
        // Index strips "?" but queries do not, so a trailing "?" misses
        let corpus = corpus(&[("doc", "What is ownership?")]);
        assert!(search("ownership?", &corpus).is_empty());
        assert_eq!(paths(&search("ownership", &corpus)), vec!["doc"]);
    }

    #[test]
    fn test_short_query_tokens_never_match() {
        let corpus = corpus(&[("doc", "an io ok rust")]);
        assert!(search("io ok an", &corpus).is_empty());
    }

    #[test]
    fn test_search_is_idempotent() {
        let corpus = corpus(&[
            ("a", "alpha beta gamma"),
            ("b", "beta beta beta delta"),
            ("c", "gamma delta beta"),
        ]);

        let first = paths(&search("beta gamma", &corpus));
        let second = paths(&search("beta gamma", &corpus));
        assert_eq!(first, second);
        assert_eq!(first, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_best_match() {
        let corpus = corpus(&[
            ("services", "we offer consulting services and training services"),
            ("culture", "our culture values training"),
        ]);
        let best = best_match("training services", &corpus).unwrap();
        assert_eq!(best.path(), "services");
    }

    #[test]
    fn test_results_sorted_non_increasing() {
        let corpus = corpus(&[
            ("a", "x1x y2y z3z x1x"),
            ("b", "z3z"),
            ("c", "x1x x1x x1x y2y"),
            ("d", "nothing"),
            ("e", "y2y z3z"),
        ]);
        let ranked = rank("x1x y2y z3z", &corpus);
        assert!(ranked.iter().all(|s| s.score > 0));
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        // a and c both score 4; a was discovered first
        let order: Vec<&str> = ranked.iter().map(|s| s.document.path()).collect();
        assert_eq!(order, vec!["a", "c", "e", "b"]);
    }
}
