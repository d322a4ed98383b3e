use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{
	Error, Result, Wire,
	retry::{self, PostOutcome, RetryPolicy},
	vertex,
};
use anzsic_config::LlmProviderConfig;

/// Requests a JSON-mode completion and returns the trimmed model text.
///
/// `Ok(None)` covers every recoverable failure: rejected requests, exhausted retries,
/// unreadable or malformed bodies and empty content. Only authentication and client
/// setup errors surface as `Err`.
pub async fn generate_json(
	cfg: &LlmProviderConfig,
	system_prompt: &str,
	user_message: &str,
) -> Result<Option<String>> {
	let wire = Wire::from_provider_id(&cfg.provider_id)?;
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = crate::endpoint(&cfg.api_base, &cfg.path, &cfg.model);
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;
	let body = match wire {
		Wire::OpenAi => build_body(cfg, system_prompt, user_message),
		Wire::Vertex => vertex::generate_content_body(system_prompt, user_message, cfg.temperature),
	};
	let policy = RetryPolicy {
		max_retries: cfg.max_retries,
		backoff: Duration::from_millis(cfg.retry_backoff_ms),
	};
	let outcome = match retry::post_json(&client, &url, &headers, &body, &policy, "llm").await {
		Ok(outcome) => outcome,
		Err(Error::Authentication) => return Err(Error::Authentication),
		Err(err) => {
			tracing::error!(error = %err, "LLM request failed.");

			return Ok(None);
		},
	};

	match outcome {
		PostOutcome::Body(raw) => match serde_json::from_str::<Value>(&raw) {
			Ok(json) => Ok(match wire {
				Wire::OpenAi => parse_completion_content(&json),
				Wire::Vertex => vertex::parse_generate_content(&json),
			}),
			Err(err) => {
				tracing::error!(error = %err, "LLM response body is not valid JSON.");

				Ok(None)
			},
		},
		PostOutcome::Rejected { status, body } => {
			tracing::error!(status, body = %body, "LLM request rejected.");

			Ok(None)
		},
		PostOutcome::Exhausted { attempts } => {
			tracing::error!(attempts, "LLM request failed after all attempts.");

			Ok(None)
		},
	}
}

fn build_body(cfg: &LlmProviderConfig, system_prompt: &str, user_message: &str) -> Value {
	serde_json::json!({
		"model": cfg.model,
		"messages": [
			{ "role": "system", "content": system_prompt },
			{ "role": "user", "content": user_message },
		],
		"temperature": cfg.temperature,
		"response_format": { "type": "json_object" },
	})
}

fn parse_completion_content(json: &Value) -> Option<String> {
	let Some(choice) = json.get("choices").and_then(|v| v.as_array()).and_then(|arr| arr.first())
	else {
		tracing::warn!("LLM response contained no choices.");

		return None;
	};
	let content = choice
		.get("message")
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(str::trim)
		.unwrap_or_default();

	if content.is_empty() { None } else { Some(content.to_string()) }
}
