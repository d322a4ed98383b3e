use std::{collections::HashMap, sync::Arc};

use serde_json::Value;

use anzsic_domain::{Candidate, ClassifyResult};

use crate::{LlmProvider, Result, prompt, reference::ReferenceTable};

/// Re-ranking calls per request: the plain prompt, then the prompt with the reference table.
pub const RERANK_ATTEMPTS: usize = 2;

const MAX_LOGGED_RAW_CHARS: usize = 200;

/// Top-level layout of a model answer.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
	/// A bare JSON array of result items.
	Array(Vec<Value>),
	/// An object with exactly one array-valued field. Other fields are ignored.
	Wrapped(Vec<Value>),
	/// Anything else, including text that is not JSON.
	Unrecognized,
}
impl ResponseShape {
	pub fn parse(raw: &str) -> Self {
		match serde_json::from_str::<Value>(raw) {
			Ok(Value::Array(items)) => Self::Array(items),
			Ok(Value::Object(map)) => {
				let mut arrays = map.into_iter().filter_map(|(_, value)| match value {
					Value::Array(items) => Some(items),
					_ => None,
				});

				match (arrays.next(), arrays.next()) {
					(Some(items), None) => Self::Wrapped(items),
					_ => Self::Unrecognized,
				}
			},
			_ => Self::Unrecognized,
		}
	}

	pub fn into_items(self) -> Vec<Value> {
		match self {
			Self::Array(items) | Self::Wrapped(items) => items,
			Self::Unrecognized => Vec::new(),
		}
	}
}

/// Stage two: asks the language model to pick and explain the best candidates.
pub struct LlmReranker {
	llm: Arc<dyn LlmProvider>,
	reference: Option<ReferenceTable>,
}
impl LlmReranker {
	pub fn new(llm: Arc<dyn LlmProvider>, reference: Option<ReferenceTable>) -> Self {
		tracing::debug!(
			model = llm.model_name(),
			reference_loaded = reference.is_some(),
			"Re-ranker ready."
		);

		Self { llm, reference }
	}

	pub fn model_name(&self) -> &str {
		self.llm.model_name()
	}

	/// Returns at most `limit` results in the order the model ranked them.
	///
	/// An empty first answer triggers one more call with the reference table in the system
	/// prompt. Two empty answers yield an empty list. Provider errors propagate.
	pub async fn rerank(
		&self,
		query: &str,
		candidates: &[Candidate],
		limit: u32,
	) -> Result<Vec<ClassifyResult>> {
		if candidates.is_empty() {
			tracing::warn!("Re-ranking skipped. No candidates were retrieved.");

			return Ok(Vec::new());
		}

		let user_message = prompt::build_user_message(query, candidates, limit);

		for attempt in 1..=RERANK_ATTEMPTS {
			let with_reference = attempt > 1;
			let system_prompt = prompt::build_system_prompt(
				limit,
				if with_reference { self.reference.as_ref() } else { None },
			);
			let raw = self.llm.generate_json(&system_prompt, &user_message).await?;
			let mut results = match raw {
				Some(raw) => parse_results(&raw, limit as usize),
				None => Vec::new(),
			};

			if !results.is_empty() {
				if with_reference {
					tracing::info!(attempt, "Re-ranking fallback succeeded.");
				}

				enrich_results(&mut results, candidates);

				return Ok(results);
			}
			if attempt < RERANK_ATTEMPTS {
				tracing::warn!(
					attempt,
					reference_available = self.reference.is_some(),
					"Re-ranking returned no results. Retrying with the reference table."
				);
			}
		}

		tracing::error!(attempts = RERANK_ATTEMPTS, "Re-ranking returned no results on every attempt.");

		Ok(Vec::new())
	}
}

/// Converts a raw model answer into results, keeping provider order.
///
/// Malformed items are skipped. Truncation to `limit` happens after conversion.
pub fn parse_results(raw: &str, limit: usize) -> Vec<ClassifyResult> {
	let shape = ResponseShape::parse(raw);

	if shape == ResponseShape::Unrecognized {
		let preview: String = raw.chars().take(MAX_LOGGED_RAW_CHARS).collect();

		tracing::error!(raw = %preview, "Unrecognized re-ranking response shape.");
	}

	let mut results: Vec<ClassifyResult> = shape
		.into_items()
		.iter()
		.filter_map(|item| {
			let converted = convert_item(item);

			if converted.is_none() {
				tracing::warn!(item = %item, "Skipping malformed re-ranking item.");
			}

			converted
		})
		.collect();

	results.truncate(limit);

	results
}

fn convert_item(item: &Value) -> Option<ClassifyResult> {
	let rank = match item.get("rank")? {
		Value::Number(n) => n.as_u64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
	.and_then(|rank| u32::try_from(rank).ok())
	.filter(|rank| *rank >= 1)?;
	let anzsic_code = required_str(item, "anzsic_code")?;
	let anzsic_desc = required_str(item, "anzsic_desc")?;

	Some(ClassifyResult {
		rank,
		anzsic_code,
		anzsic_desc,
		class_desc: optional_str(item, "class_desc"),
		division_desc: optional_str(item, "division_desc"),
		reason: optional_str(item, "reason"),
		group_desc: optional_str(item, "group_desc"),
		subdivision_desc: optional_str(item, "subdivision_desc"),
		class_exclusions: optional_str(item, "class_exclusions"),
		rrf_score: None,
		in_vector: None,
		in_fts: None,
		vector_rank: None,
		fts_rank: None,
	})
}

fn required_str(item: &Value, key: &str) -> Option<String> {
	item.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn optional_str(item: &Value, key: &str) -> Option<String> {
	item.get(key).and_then(Value::as_str).map(str::to_string)
}

fn enrich_results(results: &mut [ClassifyResult], candidates: &[Candidate]) {
	let by_code: HashMap<&str, &Candidate> =
		candidates.iter().map(|c| (c.anzsic_code.as_str(), c)).collect();

	for result in results {
		if let Some(candidate) = by_code.get(result.anzsic_code.as_str()) {
			result.enrich_from(candidate);
		}
	}
}
