use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{
	Error, Result, Wire,
	retry::{self, PostOutcome, RetryPolicy},
	vertex,
};
use anzsic_config::EmbeddingProviderConfig;

/// Which side of an asymmetric retrieval model a text is embedded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedTask {
	Query,
	Document,
}

/// Embeds every text in one request. Fails unless the provider returns a vector for each.
pub async fn embed(
	cfg: &EmbeddingProviderConfig,
	texts: &[String],
	titles: Option<&[String]>,
	task: EmbedTask,
) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let indexed = request_embeddings(&client, cfg, texts, titles, task).await?;
	let mut out = Vec::with_capacity(indexed.len());

	for (index, vector) in indexed.into_iter().enumerate() {
		let Some(vector) = vector else {
			return Err(Error::InvalidResponse {
				message: format!("Embedding response is missing item {index}."),
			});
		};

		out.push(vector);
	}

	Ok(out)
}

/// Embeds texts in chunks of `batch_size`.
///
/// A chunk whose request fails yields `None` for each of its items. Authentication
/// failures still propagate.
pub async fn embed_batch(
	cfg: &EmbeddingProviderConfig,
	texts: &[String],
	titles: Option<&[String]>,
	task: EmbedTask,
) -> Result<Vec<Option<Vec<f32>>>> {
	if texts.is_empty() {
		return Ok(Vec::new());
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let batch_size = cfg.batch_size.max(1);
	let mut out = Vec::with_capacity(texts.len());

	for (chunk_index, chunk) in texts.chunks(batch_size).enumerate() {
		let start = chunk_index * batch_size;
		let chunk_titles = titles
			.map(|titles| titles.get(start..(start + chunk.len()).min(titles.len())).unwrap_or(&[]));

		match request_embeddings(&client, cfg, chunk, chunk_titles, task).await {
			Ok(vectors) => out.extend(vectors),
			Err(Error::Authentication) => return Err(Error::Authentication),
			Err(err) => {
				tracing::warn!(
					start,
					end = start + chunk.len() - 1,
					error = %err,
					"Embedding chunk failed. Marking its items as missing."
				);

				out.extend(std::iter::repeat_n(None, chunk.len()));
			},
		}
	}

	Ok(out)
}

async fn request_embeddings(
	client: &Client,
	cfg: &EmbeddingProviderConfig,
	texts: &[String],
	titles: Option<&[String]>,
	task: EmbedTask,
) -> Result<Vec<Option<Vec<f32>>>> {
	let wire = Wire::from_provider_id(&cfg.provider_id)?;
	let url = crate::endpoint(&cfg.api_base, &cfg.path, &cfg.model);
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;
	let input_type = input_type(cfg, wire, task);
	let body = match wire {
		Wire::OpenAi => build_body(cfg, texts, input_type),
		Wire::Vertex => vertex::embedding_body(
			texts,
			titles,
			input_type.unwrap_or(vertex::TASK_DOCUMENT),
			cfg.dimensions,
		),
	};
	let policy = RetryPolicy {
		max_retries: cfg.max_retries,
		backoff: Duration::from_millis(cfg.retry_backoff_ms),
	};

	match retry::post_json(client, &url, &headers, &body, &policy, "embedding").await? {
		PostOutcome::Body(raw) => {
			let json: Value = serde_json::from_str(&raw)?;

			match wire {
				Wire::OpenAi => parse_embedding_response(json, texts.len()),
				Wire::Vertex => vertex::parse_predictions(&json, texts.len()).ok_or_else(|| {
					Error::InvalidResponse {
						message: "Embedding response is missing predictions array.".to_string(),
					}
				}),
			}
		},
		PostOutcome::Rejected { status, body } => Err(Error::Http { status, body }),
		PostOutcome::Exhausted { attempts } => Err(Error::RetriesExhausted { attempts }),
	}
}

/// The configured input type for `task`. Vertex falls back to its retrieval task types.
fn input_type(cfg: &EmbeddingProviderConfig, wire: Wire, task: EmbedTask) -> Option<&str> {
	let configured = match task {
		EmbedTask::Query => cfg.query_input_type.as_deref(),
		EmbedTask::Document => cfg.document_input_type.as_deref(),
	};

	match (wire, task) {
		(Wire::OpenAi, _) => configured,
		(Wire::Vertex, EmbedTask::Query) => Some(configured.unwrap_or(vertex::TASK_QUERY)),
		(Wire::Vertex, EmbedTask::Document) => Some(configured.unwrap_or(vertex::TASK_DOCUMENT)),
	}
}

fn build_body(cfg: &EmbeddingProviderConfig, texts: &[String], input_type: Option<&str>) -> Value {
	let mut body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});

	if let Some(input_type) = input_type
		&& let Some(map) = body.as_object_mut()
	{
		map.insert("input_type".to_string(), Value::String(input_type.to_string()));
	}

	body
}

/// Places each returned vector at its `index`. Out-of-range indexes are ignored and
/// indexes the provider skipped stay `None`.
fn parse_embedding_response(json: Value, expected: usize) -> Result<Vec<Option<Vec<f32>>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;
	let mut out = vec![None; expected];

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
			Error::InvalidResponse {
				message: "Embedding item missing embedding array.".to_string(),
			}
		})?;
		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".to_string(),
			})?;

			vec.push(number as f32);
		}

		if let Some(slot) = out.get_mut(index) {
			*slot = Some(vec);
		}
	}

	Ok(out)
}
