pub mod embedding;
pub mod llm;

mod error;
mod retry;
mod vertex;

pub use error::{Error, Result};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

/// Request and response format spoken by a provider endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
	/// OpenAI-compatible `/v1/embeddings` and `/v1/chat/completions`.
	OpenAi,
	/// Vertex AI `:predict` embeddings and Gemini `:generateContent`.
	Vertex,
}
impl Wire {
	pub fn from_provider_id(provider_id: &str) -> Result<Self> {
		match provider_id.trim().to_ascii_lowercase().as_str() {
			"openai" => Ok(Self::OpenAi),
			"vertex" => Ok(Self::Vertex),
			other => Err(Error::InvalidConfig {
				message: format!("Unsupported provider_id {other:?}. Expected openai or vertex."),
			}),
		}
	}
}

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Joins `api_base` and `path`, substituting `{model}` in the path.
pub fn endpoint(api_base: &str, path: &str, model: &str) -> String {
	format!("{}{}", api_base.trim_end_matches('/'), path.replace("{model}", model))
}
