use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// BM25 saturation parameter.
const BM25_K1: f32 = 1.5;
/// BM25 length-normalization parameter.
const BM25_B: f32 = 0.75;
/// Average document length assumed in the absence of corpus-wide statistics.
/// Streaming ingestion never holds the whole corpus in memory at once, so
/// unlike a vocabulary built ahead of time, term weighting here is local to
/// each document rather than corrected by a global inverse document
/// frequency table.
const ASSUMED_AVG_DOC_LEN: f32 = 200.0;

/// A sparse keyword vector in Qdrant's `(indices, values)` representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn empty() -> Self {
        Self { indices: Vec::new(), values: Vec::new() }
    }
}

/// Deterministic local BM25 sparse vectorizer.
///
/// Tokens are hashed into a fixed index space with FNV-1a rather than kept
/// in an in-memory vocabulary table, so the same term always lands on the
/// same dimension across process restarts and across machines.
#[derive(Clone, Copy)]
pub struct SparseEmbedder;

impl SparseEmbedder {
    pub fn new() -> Self {
        Self
    }

    pub fn embed(&self, text: &str) -> SparseVector {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return SparseVector::empty();
        }

        let doc_len = tokens.len() as f32;
        let mut term_counts: HashMap<String, u32> = HashMap::new();
        for token in tokens {
            *term_counts.entry(token).or_insert(0) += 1;
        }

        let mut indices = Vec::with_capacity(term_counts.len());
        let mut values = Vec::with_capacity(term_counts.len());
        for (term, count) in term_counts {
            let tf = count as f32;
            let normalization = 1.0 - BM25_B + BM25_B * (doc_len / ASSUMED_AVG_DOC_LEN);
            let weight = (tf * (BM25_K1 + 1.0)) / (tf + BM25_K1 * normalization);

            indices.push(fnv1a_32(&term));
            values.push(weight);
        }

        SparseVector { indices, values }
    }

    pub fn embed_batch(&self, texts: &[String]) -> Vec<SparseVector> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

impl Default for SparseEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .map(|word| word.to_string())
        .collect()
}

fn fnv1a_32(term: &str) -> u32 {
    const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let mut hash = FNV_OFFSET_BASIS;
    for byte in term.as_bytes() {
        hash ^= *byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_empty_vector() {
        let embedder = SparseEmbedder::new();
        let vector = embedder.embed("   ");
        assert!(vector.indices.is_empty());
        assert!(vector.values.is_empty());
    }

    #[test]
    fn same_text_hashes_to_the_same_indices() {
        let embedder = SparseEmbedder::new();
        let a = embedder.embed("the quick brown fox");
        let b = embedder.embed("the quick brown fox");
        assert_eq!(a, b);
    }

    #[test]
    fn repeated_terms_increase_their_weight() {
        let embedder = SparseEmbedder::new();
        let single = embedder.embed("fox jumps over dog");
        let repeated = embedder.embed("fox fox fox jumps over dog");

        let fox_index = fnv1a_32("fox");
        let single_weight = single.indices.iter().position(|&i| i == fox_index).map(|p| single.values[p]).unwrap();
        let repeated_weight = repeated.indices.iter().position(|&i| i == fox_index).map(|p| repeated.values[p]).unwrap();

        assert!(repeated_weight > single_weight);
    }

    #[test]
    fn punctuation_and_case_are_normalized() {
        let embedder = SparseEmbedder::new();
        let a = embedder.embed("Fox, Fox!");
        let b = embedder.embed("fox fox");
        assert_eq!(a.indices, b.indices);
    }
}
