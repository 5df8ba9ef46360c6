//! Knowledge base — ranked snippet retrieval for the `search_knowledge` tool.
//!
//! The interface is the contract: `search(query, category, k)` returns
//! best-match-first snippets. The shipped implementation ranks by token
//! overlap over an in-memory document set seeded from JSON files; swapping
//! in a real vector index only requires implementing `KnowledgeBase`.

pub mod loader;

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::KnowledgeError;

/// A retrieved knowledge snippet.
#[derive(Debug, Clone, Serialize)]
pub struct Snippet {
    pub content: String,
    pub source: String,
    pub category: String,
}

/// Retrieval interface consumed by the tools.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Return up to `k` snippets matching `query`, best match first.
    /// `category` restricts results to one category.
    async fn search(
        &self,
        query: &str,
        category: Option<&str>,
        k: usize,
    ) -> Result<Vec<Snippet>, KnowledgeError>;

    /// Add a document to the base.
    async fn add_document(
        &self,
        content: &str,
        source: &str,
        category: &str,
    ) -> Result<(), KnowledgeError>;
}

struct IndexedDoc {
    content: String,
    source: String,
    category: String,
    tokens: HashSet<String>,
}

/// In-memory knowledge base ranked by token overlap.
pub struct InMemoryKnowledgeBase {
    docs: RwLock<Vec<IndexedDoc>>,
}

impl InMemoryKnowledgeBase {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryKnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase, diacritic-folded tokens of at least 3 characters.
fn tokenize(text: &str) -> HashSet<String> {
    crate::agent::intent::fold(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl KnowledgeBase for InMemoryKnowledgeBase {
    async fn search(
        &self,
        query: &str,
        category: Option<&str>,
        k: usize,
    ) -> Result<Vec<Snippet>, KnowledgeError> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let docs = self.docs.read().await;
        let mut scored: Vec<(usize, &IndexedDoc)> = docs
            .iter()
            .filter(|doc| category.is_none_or(|c| doc.category.eq_ignore_ascii_case(c)))
            .map(|doc| {
                let overlap = query_tokens.intersection(&doc.tokens).count();
                (overlap, doc)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable sort keeps insertion order on ties.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, doc)| Snippet {
                content: doc.content.clone(),
                source: doc.source.clone(),
                category: doc.category.clone(),
            })
            .collect())
    }

    async fn add_document(
        &self,
        content: &str,
        source: &str,
        category: &str,
    ) -> Result<(), KnowledgeError> {
        let doc = IndexedDoc {
            content: content.to_string(),
            source: source.to_string(),
            category: category.to_string(),
            tokens: tokenize(content),
        };
        self.docs.write().await.push(doc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> InMemoryKnowledgeBase {
        let kb = InMemoryKnowledgeBase::new();
        kb.add_document(
            "Question: Comment s'inscrire à France Travail ?\nRéponse: Créer son espace personnel en ligne.",
            "FAQ France Travail",
            "general",
        )
        .await
        .unwrap();
        kb.add_document(
            "Le CPF permet de financer une formation professionnelle.",
            "Guide formations",
            "formation",
        )
        .await
        .unwrap();
        kb.add_document(
            "L'actualisation mensuelle conditionne le paiement des allocations.",
            "FAQ France Travail",
            "aide",
        )
        .await
        .unwrap();
        kb
    }

    #[tokio::test]
    async fn returns_best_match_first() {
        let kb = seeded().await;
        let results = kb.search("financer une formation", None, 3).await.unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].category, "formation");
    }

    #[tokio::test]
    async fn category_filter_restricts_results() {
        let kb = seeded().await;
        let results = kb
            .search("formation inscription", Some("formation"), 3)
            .await
            .unwrap();
        assert!(results.iter().all(|s| s.category == "formation"));
    }

    #[tokio::test]
    async fn no_match_yields_empty() {
        let kb = seeded().await;
        let results = kb.search("astronomie quantique", None, 3).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn limit_is_respected() {
        let kb = seeded().await;
        let results = kb.search("France Travail formation", None, 1).await.unwrap();
        assert!(results.len() <= 1);
    }

    #[tokio::test]
    async fn diacritics_are_folded() {
        let kb = seeded().await;
        // "créer" indexed; query without accent must still match
        let results = kb.search("creer espace personnel", None, 3).await.unwrap();
        assert!(!results.is_empty());
    }
}
