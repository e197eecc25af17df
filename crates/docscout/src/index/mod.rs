//! Minimal in-memory text search index.
//!
//! Each text field gets its own TF-IDF model with smoothed IDF
//! (`ln((1 + n) / (1 + df)) + 1`) and L2-normalized document vectors.
//! A query is scored against every field by cosine similarity, and the
//! per-field scores are summed with optional boosts.

mod tokenizer;

pub use tokenizer::tokenize;

use std::cmp::Ordering;
use std::collections::HashMap;

/// Gives the index access to a document's text fields
pub trait Indexable {
    /// Text of the named field, or `None` if the document lacks it
    fn text_field(&self, field: &str) -> Option<&str>;
}

/// Postings and IDF weights for one text field
#[derive(Debug, Default)]
struct FieldIndex {
    idf: HashMap<String, f32>,
    /// term -> (document index, normalized tf-idf weight)
    postings: HashMap<String, Vec<(u32, f32)>>,
}

impl FieldIndex {
    fn build(texts: &[&str]) -> Self {
        let n = texts.len() as f32;
        let term_counts: Vec<HashMap<String, u32>> = texts
            .iter()
            .map(|text| {
                let mut counts = HashMap::new();
                for token in tokenize(text) {
                    *counts.entry(token).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let mut df: HashMap<&str, u32> = HashMap::new();
        for counts in &term_counts {
            for term in counts.keys() {
                *df.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let idf: HashMap<String, f32> = df
            .iter()
            .map(|(term, &df)| {
                let weight = ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0;
                (term.to_string(), weight)
            })
            .collect();

        let mut postings: HashMap<String, Vec<(u32, f32)>> = HashMap::new();
        for (doc_id, counts) in term_counts.iter().enumerate() {
            let mut weights: Vec<(&String, f32)> = counts
                .iter()
                .map(|(term, &tf)| (term, tf as f32 * idf[term.as_str()]))
                .collect();
            weights.sort_by(|a, b| a.0.cmp(b.0));
            let norm = weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            if norm == 0.0 {
                continue;
            }
            for (term, weight) in weights {
                postings
                    .entry(term.clone())
                    .or_default()
                    .push((doc_id as u32, weight / norm));
            }
        }

        Self { idf, postings }
    }

    /// Add `boost * cosine(query, doc)` to `scores` for every matching doc
    fn accumulate(&self, query_counts: &[(String, u32)], boost: f32, scores: &mut [f32]) {
        let weights: Vec<(&str, f32)> = query_counts
            .iter()
            .filter_map(|(term, tf)| {
                self.idf
                    .get(term)
                    .map(|idf| (term.as_str(), *tf as f32 * idf))
            })
            .collect();
        let norm = weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm == 0.0 {
            return;
        }

        for (term, weight) in weights {
            let q = weight / norm;
            if let Some(postings) = self.postings.get(term) {
                for &(doc_id, d) in postings {
                    scores[doc_id as usize] += boost * q * d;
                }
            }
        }
    }
}

/// Text index over a fixed set of fields
#[derive(Debug)]
pub struct Index {
    text_fields: Vec<String>,
    fields: Vec<FieldIndex>,
    doc_count: usize,
}

impl Index {
    /// Create an empty index over the given text fields
    pub fn new<S: Into<String>>(text_fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            text_fields: text_fields.into_iter().map(Into::into).collect(),
            fields: Vec::new(),
            doc_count: 0,
        }
    }

    /// Build the index from `docs`, replacing any previous contents
    ///
    /// Result indices returned by [`Index::search`] refer to positions in
    /// `docs`.
    pub fn fit<D: Indexable>(&mut self, docs: &[D]) -> &mut Self {
        self.doc_count = docs.len();
        self.fields = self
            .text_fields
            .iter()
            .map(|field| {
                let texts: Vec<&str> = docs
                    .iter()
                    .map(|doc| doc.text_field(field).unwrap_or(""))
                    .collect();
                FieldIndex::build(&texts)
            })
            .collect();
        self
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.doc_count
    }

    /// Returns true if no documents are indexed
    pub fn is_empty(&self) -> bool {
        self.doc_count == 0
    }

    /// Search with every field weighted 1.0
    pub fn search(&self, query: &str, num_results: usize) -> Vec<(usize, f32)> {
        self.search_with_boosts(query, &HashMap::new(), num_results)
    }

    /// Search with per-field boosts (missing fields default to 1.0)
    ///
    /// Returns `(document index, score)` pairs with a positive score,
    /// sorted by descending score; equal scores keep document order.
    pub fn search_with_boosts(
        &self,
        query: &str,
        boosts: &HashMap<String, f32>,
        num_results: usize,
    ) -> Vec<(usize, f32)> {
        if num_results == 0 || self.doc_count == 0 {
            return Vec::new();
        }

        let mut counts: HashMap<String, u32> = HashMap::new();
        for token in tokenize(query) {
            *counts.entry(token).or_insert(0) += 1;
        }
        if counts.is_empty() {
            return Vec::new();
        }
        // Fixed accumulation order keeps scores of identical documents identical
        let mut query_counts: Vec<(String, u32)> = counts.into_iter().collect();
        query_counts.sort();

        let mut scores = vec![0.0f32; self.doc_count];
        for (name, field) in self.text_fields.iter().zip(&self.fields) {
            let boost = boosts.get(name).copied().unwrap_or(1.0);
            field.accumulate(&query_counts, boost, &mut scores);
        }

        let mut results: Vec<(usize, f32)> = scores
            .into_iter()
            .enumerate()
            .filter(|&(_, score)| score > 0.0)
            .collect();
        results.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        results.truncate(num_results);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doc {
        title: &'static str,
        body: &'static str,
    }

    impl Indexable for Doc {
        fn text_field(&self, field: &str) -> Option<&str> {
            match field {
                "title" => Some(self.title),
                "body" => Some(self.body),
                _ => None,
            }
        }
    }

    fn corpus() -> Vec<Doc> {
        vec![
            Doc {
                title: "rust",
                body: "rust programming systems language fast",
            },
            Doc {
                title: "python",
                body: "python programming scripting easy",
            },
            Doc {
                title: "java",
                body: "java enterprise programming verbose",
            },
            Doc {
                title: "safety",
                body: "rust memory safety zero cost abstractions",
            },
        ]
    }

    fn fitted(docs: &[Doc]) -> Index {
        let mut index = Index::new(["title", "body"]);
        index.fit(docs);
        index
    }

    #[test]
    fn test_empty_query() {
        let docs = corpus();
        let index = fitted(&docs);
        assert!(index.search("", 10).is_empty());
        assert!(index.search("   ", 10).is_empty());
        assert!(index.search("the and of", 10).is_empty());
    }

    #[test]
    fn test_empty_index() {
        let docs: Vec<Doc> = Vec::new();
        let index = fitted(&docs);
        assert!(index.is_empty());
        assert!(index.search("rust", 10).is_empty());
    }

    #[test]
    fn test_unfitted_index() {
        let index = Index::new(["body"]);
        assert!(index.search("rust", 10).is_empty());
    }

    #[test]
    fn test_finds_matching_docs() {
        let docs = corpus();
        let index = fitted(&docs);
        let ids: Vec<usize> = index.search("rust", 10).into_iter().map(|(id, _)| id).collect();
        assert!(ids.contains(&0));
        assert!(ids.contains(&3));
        assert!(!ids.contains(&1));
    }

    #[test]
    fn test_ranking_prefers_title_match() {
        let docs = corpus();
        let index = fitted(&docs);
        let results = index.search("rust", 10);
        assert_eq!(results[0].0, 0, "title and body match should rank first");
    }

    #[test]
    fn test_scores_positive_and_descending() {
        let docs = corpus();
        let index = fitted(&docs);
        let results = index.search("rust programming", 10);
        assert!(!results.is_empty());
        for pair in results.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        for &(_, score) in &results {
            assert!(score > 0.0);
        }
    }

    #[test]
    fn test_ties_keep_document_order() {
        let docs = vec![
            Doc {
                title: "",
                body: "alpha beta",
            },
            Doc {
                title: "",
                body: "gamma delta",
            },
            Doc {
                title: "",
                body: "alpha beta",
            },
            Doc {
                title: "",
                body: "alpha beta",
            },
        ];
        let index = fitted(&docs);
        let results = index.search("alpha", 10);
        let ids: Vec<usize> = results.iter().map(|&(id, _)| id).collect();
        assert_eq!(ids, vec![0, 2, 3]);
        assert_eq!(results[0].1, results[1].1);
        assert_eq!(results[1].1, results[2].1);
    }

    #[test]
    fn test_truncation() {
        let docs = corpus();
        let index = fitted(&docs);
        assert_eq!(index.search("programming", 2).len(), 2);
        assert!(index.search("programming", 0).is_empty());
    }

    #[test]
    fn test_boosts_change_ranking() {
        let docs = vec![
            Doc {
                title: "search",
                body: "unrelated words here",
            },
            Doc {
                title: "other",
                body: "search search search",
            },
        ];
        let index = fitted(&docs);

        let mut boosts = HashMap::new();
        boosts.insert("title".to_string(), 10.0);
        assert_eq!(index.search_with_boosts("search", &boosts, 10)[0].0, 0);

        boosts.insert("title".to_string(), 0.0);
        boosts.insert("body".to_string(), 10.0);
        assert_eq!(index.search_with_boosts("search", &boosts, 10)[0].0, 1);
    }

    #[test]
    fn test_no_match() {
        let docs = corpus();
        let index = fitted(&docs);
        assert!(index.search("nonexistent_xyz_term", 10).is_empty());
    }
}
