mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, LlmProviderConfig, Postgres, Providers, Reference, Retrieval,
	Service, Storage,
};

use std::{fs, path::Path};

pub const MAX_TOP_K: u32 = 20;
pub const MAX_RETRIEVAL_N: u32 = 50;

const SUPPORTED_PROVIDERS: [&str; 2] = ["openai", "vertex"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for (section, provider_id) in [
		("providers.embedding", &cfg.providers.embedding.provider_id),
		("providers.llm", &cfg.providers.llm.provider_id),
	] {
		if !SUPPORTED_PROVIDERS.contains(&provider_id.trim().to_ascii_lowercase().as_str()) {
			return Err(Error::UnsupportedProvider { section, provider_id: provider_id.clone() });
		}
	}

	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.postgres.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.postgres.vector_dim."
				.to_string(),
		});
	}

	if cfg.providers.embedding.batch_size == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.batch_size must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm", &cfg.providers.llm.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for (label, retries) in [
		("embedding", cfg.providers.embedding.max_retries),
		("llm", cfg.providers.llm.max_retries),
	] {
		if retries == 0 {
			return Err(Error::Validation {
				message: format!("providers.{label}.max_retries must be greater than zero."),
			});
		}
	}

	if !cfg.providers.llm.temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be a finite number.".to_string(),
		});
	}
	if !(0.0..=2.0).contains(&cfg.providers.llm.temperature) {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}
	if cfg.retrieval.rrf_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.rrf_k must be greater than zero.".to_string(),
		});
	}
	if !(1..=MAX_TOP_K).contains(&cfg.retrieval.top_k) {
		return Err(Error::Validation {
			message: format!("retrieval.top_k must be in the range 1-{MAX_TOP_K}."),
		});
	}
	if !(1..=MAX_RETRIEVAL_N).contains(&cfg.retrieval.retrieval_n) {
		return Err(Error::Validation {
			message: format!("retrieval.retrieval_n must be in the range 1-{MAX_RETRIEVAL_N}."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.reference
		.master_csv_path
		.as_deref()
		.map(|path| path.as_os_str().to_string_lossy().trim().is_empty())
		.unwrap_or(false)
	{
		cfg.reference.master_csv_path = None;
	}
	if cfg
		.providers
		.embedding
		.query_input_type
		.as_deref()
		.map(|value| value.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.embedding.query_input_type = None;
	}
	if cfg
		.providers
		.embedding
		.document_input_type
		.as_deref()
		.map(|value| value.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.embedding.document_input_type = None;
	}
}
