use std::sync::Arc;

use anzsic_domain::{Candidate, RankedHit};

use crate::{EmbeddingProvider, Error, Result, SearchStore, fusion};

/// Stage one: embeds the query, runs vector and keyword search and fuses the two lists.
pub struct HybridRetriever {
	embedding: Arc<dyn EmbeddingProvider>,
	store: Arc<dyn SearchStore>,
	rrf_k: u32,
}
impl HybridRetriever {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, store: Arc<dyn SearchStore>, rrf_k: u32) -> Self {
		Self { embedding, store, rrf_k }
	}

	pub fn embed_model(&self) -> &str {
		self.embedding.model_name()
	}

	/// Returns up to `pool_size` candidates ordered by descending fusion score.
	///
	/// Keyword search failures degrade to zero keyword hits. Embedding, vector search and
	/// record fetch failures propagate.
	pub async fn retrieve(&self, query: &str, pool_size: u32) -> Result<Vec<Candidate>> {
		let vector = self.embedding.embed_query(query).await?;

		if vector.is_empty() {
			return Err(Error::Embedding {
				message: "Embedding provider returned an empty query vector.".to_string(),
			});
		}

		let vector_hits = self.store.vector_search(&vector, pool_size).await?;
		let fts_hits = self.keyword_hits(query, pool_size).await;

		tracing::debug!(
			vector_hits = vector_hits.len(),
			fts_hits = fts_hits.len(),
			"Search systems returned hits."
		);

		let mut fused = fusion::fuse(&vector_hits, &fts_hits, self.rrf_k);

		fused.sort_by(|a, b| b.score.total_cmp(&a.score));
		fused.truncate(pool_size as usize);

		let codes: Vec<String> = fused.iter().map(|c| c.code.clone()).collect();
		let mut records = self.store.fetch_by_codes(&codes).await?;
		let mut candidates = Vec::with_capacity(fused.len());

		for item in &fused {
			let Some(record) = records.remove(&item.code) else {
				tracing::warn!(code = %item.code, "Fused code is missing from storage. Dropping it.");

				continue;
			};

			candidates.push(Candidate::new(record, item, round_score(item.score)));
		}

		tracing::info!(
			candidates = candidates.len(),
			pool_size,
			"Hybrid retrieval completed."
		);

		Ok(candidates)
	}

	async fn keyword_hits(&self, query: &str, limit: u32) -> Vec<RankedHit> {
		match self.store.fts_search(query, limit).await {
			Ok(hits) => hits,
			Err(err) => {
				tracing::warn!(error = %err, "Keyword search failed. Continuing with vector hits only.");

				Vec::new()
			},
		}
	}
}

fn round_score(score: f64) -> f64 {
	(score * 1_000_000.0).round() / 1_000_000.0
}
