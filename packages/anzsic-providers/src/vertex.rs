use serde_json::{Map, Value};

pub(crate) const TASK_QUERY: &str = "RETRIEVAL_QUERY";
pub(crate) const TASK_DOCUMENT: &str = "RETRIEVAL_DOCUMENT";

/// `:predict` body with one instance per text. Titles are attached only when non-empty.
pub(crate) fn embedding_body(
	texts: &[String],
	titles: Option<&[String]>,
	task_type: &str,
	dimensions: u32,
) -> Value {
	let instances: Vec<Value> = texts
		.iter()
		.enumerate()
		.map(|(index, text)| {
			let mut instance = Map::new();

			instance.insert("content".to_string(), Value::String(text.clone()));
			instance.insert("task_type".to_string(), Value::String(task_type.to_string()));

			if let Some(title) = titles.and_then(|titles| titles.get(index))
				&& !title.trim().is_empty()
			{
				instance.insert("title".to_string(), Value::String(title.clone()));
			}

			Value::Object(instance)
		})
		.collect();

	serde_json::json!({
		"instances": instances,
		"parameters": { "outputDimensionality": dimensions },
	})
}

/// Reads `predictions[i].embeddings.values` by position. Items that are absent or malformed
/// come back as `None`. Returns `None` when the body has no `predictions` array.
pub(crate) fn parse_predictions(json: &Value, expected: usize) -> Option<Vec<Option<Vec<f32>>>> {
	let predictions = json.get("predictions")?.as_array()?;
	let mut out: Vec<Option<Vec<f32>>> = predictions
		.iter()
		.take(expected)
		.map(|prediction| {
			prediction
				.get("embeddings")
				.and_then(|e| e.get("values"))
				.and_then(Value::as_array)
				.and_then(|values| {
					values.iter().map(|v| v.as_f64().map(|n| n as f32)).collect::<Option<Vec<_>>>()
				})
		})
		.collect();

	out.resize(expected, None);

	Some(out)
}

/// Gemini `generateContent` body requesting a JSON response.
pub(crate) fn generate_content_body(
	system_prompt: &str,
	user_message: &str,
	temperature: f32,
) -> Value {
	serde_json::json!({
		"systemInstruction": { "parts": [{ "text": system_prompt }] },
		"contents": [
			{ "role": "user", "parts": [{ "text": user_message }] },
		],
		"generationConfig": {
			"temperature": temperature,
			"responseMimeType": "application/json",
		},
	})
}

/// Trimmed text of the first part of the first candidate, if any.
pub(crate) fn parse_generate_content(json: &Value) -> Option<String> {
	let Some(candidate) =
		json.get("candidates").and_then(Value::as_array).and_then(|arr| arr.first())
	else {
		tracing::warn!("Gemini response contained no candidates.");

		return None;
	};
	let text = candidate
		.get("content")
		.and_then(|content| content.get("parts"))
		.and_then(Value::as_array)
		.and_then(|parts| parts.first())
		.and_then(|part| part.get("text"))
		.and_then(Value::as_str)
		.map(str::trim)
		.unwrap_or_default();

	if text.is_empty() { None } else { Some(text.to_string()) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn embedding_body_sets_task_type_and_non_empty_titles() {
		let texts = vec!["Plumbing Services".to_string(), "Electrical Services".to_string()];
		let titles = vec!["E323100".to_string(), "  ".to_string()];
		let body = embedding_body(&texts, Some(&titles), TASK_DOCUMENT, 768);

		assert_eq!(body["instances"][0]["content"], "Plumbing Services");
		assert_eq!(body["instances"][0]["task_type"], "RETRIEVAL_DOCUMENT");
		assert_eq!(body["instances"][0]["title"], "E323100");
		assert!(body["instances"][1].get("title").is_none());
		assert_eq!(body["parameters"]["outputDimensionality"], 768);
	}

	#[test]
	fn query_body_has_no_titles() {
		let body = embedding_body(&["plumber".to_string()], None, TASK_QUERY, 3);

		assert_eq!(body["instances"][0]["task_type"], "RETRIEVAL_QUERY");
		assert!(body["instances"][0].get("title").is_none());
	}

	#[test]
	fn predictions_are_read_by_position_and_padded() {
		let json = serde_json::json!({
			"predictions": [
				{ "embeddings": { "values": [0.5, 1.0] } },
				{ "embeddings": {} }
			]
		});
		let parsed = parse_predictions(&json, 3).expect("Predictions must parse.");

		assert_eq!(parsed, vec![Some(vec![0.5, 1.0]), None, None]);
		assert!(parse_predictions(&serde_json::json!({ "error": {} }), 1).is_none());
	}

	#[test]
	fn gemini_body_requests_json_mime_type() {
		let body = generate_content_body("system", "user", 0.1);

		assert_eq!(body["systemInstruction"]["parts"][0]["text"], "system");
		assert_eq!(body["contents"][0]["role"], "user");
		assert_eq!(body["contents"][0]["parts"][0]["text"], "user");
		assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
	}

	#[test]
	fn extracts_first_candidate_text() {
		let json = serde_json::json!({
			"candidates": [
				{ "content": { "parts": [{ "text": " [{\"rank\":1}] \n" }] } }
			]
		});

		assert_eq!(parse_generate_content(&json).as_deref(), Some("[{\"rank\":1}]"));
		assert!(parse_generate_content(&serde_json::json!({ "candidates": [] })).is_none());
		assert!(
			parse_generate_content(&serde_json::json!({
				"candidates": [{ "content": { "parts": [] } }]
			}))
			.is_none()
		);
	}
}
