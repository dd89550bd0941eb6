//! The retrieval engine: query term in, filtered catalog hits out.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;

use embedding::Embedder;
use search::{SearchClient, SearchHit};

use crate::config::RetrievalConfig;
use crate::error::RetrievalError;
use crate::Result;

/// Hits for one query term, in engine score order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TermResults {
    pub term: String,
    pub hits: Vec<SearchHit>,
}

/// Composes the embedder and the search client into the retrieval path.
#[derive(Debug, Clone)]
pub struct Retriever {
    embedder: Embedder,
    search: SearchClient,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        embedder: Embedder,
        search: SearchClient,
        config: RetrievalConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            embedder,
            search,
            config,
        })
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Embed one term, run the k-NN query, and keep hits scoring strictly
    /// above the threshold. Engine order is preserved.
    pub async fn retrieve(&self, term: &str) -> Result<TermResults> {
        let embedding = self.embedder.embed(term).await?;
        let hits = self
            .search
            .knn_search(&embedding.vector, self.config.top_k)
            .await?;

        let kept: Vec<SearchHit> = hits
            .into_iter()
            .filter(|hit| hit.score > self.config.min_score)
            .collect();

        tracing::debug!(term, hits = kept.len(), "retrieval complete");
        Ok(TermResults {
            term: term.to_string(),
            hits: kept,
        })
    }

    /// Retrieve several terms concurrently.
    ///
    /// Fan-out is bounded by `max_concurrency`; output order matches input
    /// order. A failure on any term fails the whole call — terms are never
    /// silently dropped.
    pub async fn retrieve_many(&self, terms: &[String]) -> Result<Vec<TermResults>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let terms = if terms.len() > self.config.max_terms {
            tracing::warn!(
                given = terms.len(),
                kept = self.config.max_terms,
                "dropping excess query terms"
            );
            &terms[..self.config.max_terms]
        } else {
            terms
        };

        stream::iter(terms)
            .map(|term| self.retrieve(term))
            .buffered(self.config.max_concurrency)
            .try_collect()
            .await
    }
}

/// Compact JSON used as the reference context for grounded generation.
///
/// Only the fields the reply model needs (score, id, name, price) go in;
/// descriptions would blow up the prompt for little gain.
pub fn summarize_for_grounding(results: &[TermResults]) -> String {
    let summary: Vec<_> = results
        .iter()
        .map(|result| {
            json!({
                "search_term": result.term,
                "products": result
                    .hits
                    .iter()
                    .map(|hit| {
                        json!({
                            "score": hit.score,
                            "id": hit.id,
                            "name": hit.name,
                            "price": hit.price,
                        })
                    })
                    .collect::<Vec<_>>(),
            })
        })
        .collect();
    serde_json::to_string(&summary).unwrap_or_else(|_| "[]".to_string())
}
