//! Candidate retrieval and relevance scoring.
//!
//! Each query token is expanded to every vocabulary token containing it. A document
//! matches a query token if any expansion occurs in any field; it is a candidate if
//! it matches every query token. Its score sums, over all (query token, expansion,
//! field) triples it appears in, `idf(field, expansion) * weight(field) * similarity`,
//! where similarity is `len(query token) / len(expansion)`.

use crate::index::{Field, InvertedIndex};
use crate::tokenizer::tokenize;
use crate::DocId;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub doc_id: DocId,
    pub score: f32,
}

/// Vocabulary tokens containing `token` as a substring, in vocabulary order.
pub fn expand<'a>(index: &'a InvertedIndex, token: &str) -> Vec<&'a str> {
    index
        .vocabulary()
        .iter()
        .filter(|t| t.contains(token))
        .map(String::as_str)
        .collect()
}

fn similarity(query_token: &str, token: &str) -> f32 {
    query_token.chars().count() as f32 / token.chars().count() as f32
}

/// Every document matching one query token, with that token's share of its score.
fn token_contributions(index: &InvertedIndex, query_token: &str) -> HashMap<DocId, f32> {
    expand(index, query_token)
        .into_iter()
        .flat_map(|t| Field::ALL.into_iter().map(move |f| (t, f)))
        .fold(HashMap::new(), |mut acc, (token, field)| {
            let postings = index.postings(field, token);
            if postings.is_empty() {
                return acc;
            }
            let contrib = index.idf(field, token) * index.weight(field) * similarity(query_token, token);
            for &doc_id in postings {
                *acc.entry(doc_id).or_insert(0.0) += contrib;
            }
            acc
        })
}

/// Score descending, then ordinal ascending.
pub fn rank(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.doc_id.cmp(&b.doc_id))
    });
}

/// Retrieve and score the documents matching every token of `query`, ranked.
///
/// An empty token list or a token with no vocabulary match yields no candidates.
pub fn score_query(index: &InvertedIndex, query: &str) -> Vec<ScoredCandidate> {
    let tokens = tokenize(query);
    let per_token: Vec<HashMap<DocId, f32>> =
        tokens.iter().map(|t| token_contributions(index, t)).collect();

    let Some(smallest) = per_token.iter().min_by_key(|m| m.len()) else {
        return Vec::new();
    };

    // Summing Options in query-token order both intersects and keeps float addition
    // order independent of hash iteration.
    let mut candidates: Vec<ScoredCandidate> = smallest
        .keys()
        .filter_map(|&doc_id| {
            let score: Option<f32> = per_token.iter().map(|m| m.get(&doc_id).copied()).sum();
            score.map(|score| ScoredCandidate { doc_id, score })
        })
        .collect();
    rank(&mut candidates);
    candidates
}
