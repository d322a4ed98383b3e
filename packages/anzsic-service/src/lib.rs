pub mod fusion;
pub mod pipeline;
pub mod prompt;
pub mod reference;
pub mod rerank;
pub mod retrieval;

mod error;

pub use error::{Error, Result};
pub use fusion::{DEFAULT_RRF_K, fuse};
pub use pipeline::ClassifierPipeline;
pub use reference::ReferenceTable;
pub use rerank::{LlmReranker, RERANK_ATTEMPTS, ResponseShape};
pub use retrieval::HybridRetriever;

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use anzsic_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use anzsic_domain::{CodeRecord, RankedHit};
use anzsic_providers::{
	embedding::{self, EmbedTask},
	llm,
};
use anzsic_storage::{db::Db, queries};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn model_name(&self) -> &str;

	fn dimensions(&self) -> u32;

	/// Embeds a search query using the provider's query-side mode.
	fn embed_query<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>>;

	/// Embeds a stored document. Providers without title support ignore `title`.
	fn embed_document<'a>(
		&'a self,
		text: &'a str,
		title: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<f32>>>;

	/// Embeds many documents. Items that fail individually come back as `None`.
	fn embed_batch<'a>(
		&'a self,
		texts: &'a [String],
		titles: Option<&'a [String]>,
	) -> BoxFuture<'a, Result<Vec<Option<Vec<f32>>>>>;
}

pub trait SearchStore
where
	Self: Send + Sync,
{
	fn vector_search<'a>(
		&'a self,
		vector: &'a [f32],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<RankedHit>>>;

	fn fts_search<'a>(&'a self, text: &'a str, limit: u32) -> BoxFuture<'a, Result<Vec<RankedHit>>>;

	fn fetch_by_codes<'a>(
		&'a self,
		codes: &'a [String],
	) -> BoxFuture<'a, Result<HashMap<String, CodeRecord>>>;
}

pub trait LlmProvider
where
	Self: Send + Sync,
{
	fn model_name(&self) -> &str;

	/// Returns the raw JSON text the model produced.
	///
	/// `Ok(None)` is a recoverable failure and yields zero results for the attempt.
	fn generate_json<'a>(
		&'a self,
		system_prompt: &'a str,
		user_message: &'a str,
	) -> BoxFuture<'a, Result<Option<String>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub store: Arc<dyn SearchStore>,
	pub llm: Arc<dyn LlmProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		store: Arc<dyn SearchStore>,
		llm: Arc<dyn LlmProvider>,
	) -> Self {
		Self { embedding, store, llm }
	}

	/// Wires the HTTP adapters selected by each `provider_id` and the Postgres store.
	pub fn from_config(cfg: &Config, db: Db) -> Self {
		tracing::info!(
			embedding_provider = %cfg.providers.embedding.provider_id,
			embedding_model = %cfg.providers.embedding.model,
			llm_provider = %cfg.providers.llm.provider_id,
			llm_model = %cfg.providers.llm.model,
			"Providers selected."
		);

		Self {
			embedding: Arc::new(HttpEmbedding::new(cfg.providers.embedding.clone())),
			store: Arc::new(db),
			llm: Arc::new(HttpLlm::new(cfg.providers.llm.clone())),
		}
	}
}

/// Embedding adapter for the OpenAI-compatible and Vertex AI wire formats.
pub struct HttpEmbedding {
	cfg: EmbeddingProviderConfig,
}
impl HttpEmbedding {
	pub fn new(cfg: EmbeddingProviderConfig) -> Self {
		Self { cfg }
	}

	async fn embed_one(&self, text: &str, title: Option<&str>, task: EmbedTask) -> Result<Vec<f32>> {
		let texts = [text.to_string()];
		let titles = title.map(|title| [title.to_string()]);
		let mut vectors = embedding::embed(&self.cfg, &texts, titles.as_ref().map(|t| &t[..]), task)
			.await
			.map_err(Error::from_embedding)?;

		Ok(vectors.pop().unwrap_or_default())
	}
}

impl EmbeddingProvider for HttpEmbedding {
	fn model_name(&self) -> &str {
		&self.cfg.model
	}

	fn dimensions(&self) -> u32 {
		self.cfg.dimensions
	}

	fn embed_query<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(self.embed_one(text, None, EmbedTask::Query))
	}

	fn embed_document<'a>(
		&'a self,
		text: &'a str,
		title: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(self.embed_one(text, title, EmbedTask::Document))
	}

	fn embed_batch<'a>(
		&'a self,
		texts: &'a [String],
		titles: Option<&'a [String]>,
	) -> BoxFuture<'a, Result<Vec<Option<Vec<f32>>>>> {
		Box::pin(async move {
			embedding::embed_batch(&self.cfg, texts, titles, EmbedTask::Document)
				.await
				.map_err(Error::from_embedding)
		})
	}
}

/// Language-model adapter for OpenAI-compatible chat completions and Gemini.
pub struct HttpLlm {
	cfg: LlmProviderConfig,
}
impl HttpLlm {
	pub fn new(cfg: LlmProviderConfig) -> Self {
		Self { cfg }
	}
}

impl LlmProvider for HttpLlm {
	fn model_name(&self) -> &str {
		&self.cfg.model
	}

	fn generate_json<'a>(
		&'a self,
		system_prompt: &'a str,
		user_message: &'a str,
	) -> BoxFuture<'a, Result<Option<String>>> {
		Box::pin(async move {
			llm::generate_json(&self.cfg, system_prompt, user_message).await.map_err(Error::from_llm)
		})
	}
}

impl SearchStore for Db {
	fn vector_search<'a>(
		&'a self,
		vector: &'a [f32],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<RankedHit>>> {
		Box::pin(async move { Ok(queries::vector_search(self, vector, limit).await?) })
	}

	fn fts_search<'a>(&'a self, text: &'a str, limit: u32) -> BoxFuture<'a, Result<Vec<RankedHit>>> {
		Box::pin(async move { Ok(queries::fts_search(self, text, limit).await?) })
	}

	fn fetch_by_codes<'a>(
		&'a self,
		codes: &'a [String],
	) -> BoxFuture<'a, Result<HashMap<String, CodeRecord>>> {
		Box::pin(async move { Ok(queries::fetch_by_codes(self, codes).await?) })
	}
}
