use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub reference: Reference,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	/// Texts per request when embedding in bulk.
	#[serde(default = "default_batch_size")]
	pub batch_size: usize,
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
	#[serde(default = "default_retry_backoff_ms")]
	pub retry_backoff_ms: u64,
	/// Sent as `input_type` when embedding a search query. Providers with asymmetric
	/// retrieval modes use it to optimise query vectors against stored document vectors.
	#[serde(default)]
	pub query_input_type: Option<String>,
	/// Sent as `input_type` when embedding a stored document.
	#[serde(default)]
	pub document_input_type: Option<String>,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
	#[serde(default = "default_retry_backoff_ms")]
	pub retry_backoff_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	/// RRF smoothing constant.
	pub rrf_k: u32,
	/// Default candidate pool size per search system.
	pub retrieval_n: u32,
	/// Default number of results returned to the caller.
	pub top_k: u32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self { rrf_k: 60, retrieval_n: 20, top_k: 5 }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Reference {
	/// Optional. CSV with `anzsic_code` and `anzsic_desc` columns, used as re-ranking
	/// fallback context.
	pub master_csv_path: Option<PathBuf>,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_batch_size() -> usize {
	50
}

fn default_max_retries() -> u32 {
	3
}

fn default_retry_backoff_ms() -> u64 {
	2_000
}
