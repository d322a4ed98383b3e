use time::OffsetDateTime;

use anzsic_config::Config;
use anzsic_domain::{ClassifyRequest, ClassifyResponse, ClassifyResult, SearchMode};
use anzsic_storage::db::Db;

use crate::{HybridRetriever, LlmReranker, Providers, ReferenceTable, Result};

const QUERY_LOG_CHARS: usize = 80;

/// Two-stage classifier shared by every request.
pub struct ClassifierPipeline {
	retriever: HybridRetriever,
	reranker: LlmReranker,
}
impl ClassifierPipeline {
	/// Builds the pipeline over the HTTP providers and Postgres store named in `cfg`.
	pub fn new(cfg: &Config, db: Db) -> Self {
		let reference = match cfg.reference.master_csv_path.as_deref() {
			Some(path) => ReferenceTable::load(path),
			None => {
				tracing::info!("No reference CSV configured. Fallback runs without it.");

				None
			},
		};

		Self::with_providers(Providers::from_config(cfg, db), cfg.retrieval.rrf_k, reference)
	}

	pub fn with_providers(
		providers: Providers,
		rrf_k: u32,
		reference: Option<ReferenceTable>,
	) -> Self {
		Self {
			retriever: HybridRetriever::new(providers.embedding, providers.store, rrf_k),
			reranker: LlmReranker::new(providers.llm, reference),
		}
	}

	pub async fn classify(&self, mut request: ClassifyRequest) -> Result<ClassifyResponse> {
		request.validate()?;

		tracing::info!(
			query = %query_preview(&request.query),
			mode = %request.mode,
			top_k = request.top_k,
			retrieval_n = request.retrieval_n,
			"Classifying query."
		);

		let candidates = self.retriever.retrieve(&request.query, request.retrieval_n).await?;
		let candidates_retrieved = candidates.len() as u32;
		let (results, llm_model) = match request.mode {
			SearchMode::Fast => {
				let results = candidates
					.iter()
					.take(request.top_k as usize)
					.zip(1..)
					.map(|(candidate, rank)| ClassifyResult::from_candidate(candidate, rank))
					.collect();

				(results, String::new())
			},
			SearchMode::HighFidelity => {
				let results =
					self.reranker.rerank(&request.query, &candidates, request.top_k).await?;

				(results, self.reranker.model_name().to_string())
			},
		};

		tracing::info!(
			mode = %request.mode,
			candidates = candidates_retrieved,
			results = results.len(),
			"Classification completed."
		);

		Ok(ClassifyResponse {
			query: request.query,
			mode: request.mode,
			results,
			candidates_retrieved,
			generated_at: OffsetDateTime::now_utc(),
			embed_model: self.retriever.embed_model().to_string(),
			llm_model,
		})
	}
}

fn query_preview(query: &str) -> String {
	query.chars().take(QUERY_LOG_CHARS).collect()
}
