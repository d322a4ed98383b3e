use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::Value;
use tower::util::ServiceExt;

use anzsic_api::{
	routes,
	state::{AppState, RequestDefaults},
};
use anzsic_domain::{CodeRecord, RankedHit};
use anzsic_service::{
	BoxFuture, ClassifierPipeline, EmbeddingProvider, Error, LlmProvider, Providers, Result,
	SearchStore,
};

struct DummyEmbedding {
	fail: bool,
}
impl EmbeddingProvider for DummyEmbedding {
	fn model_name(&self) -> &str {
		"embed-test"
	}

	fn dimensions(&self) -> u32 {
		3
	}

	fn embed_query<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
		let fail = self.fail;

		Box::pin(async move {
			if fail {
				Err(Error::Embedding { message: "Provider returned HTTP 400.".to_string() })
			} else {
				Ok(vec![0.1, 0.2, 0.3])
			}
		})
	}

	fn embed_document<'a>(
		&'a self,
		text: &'a str,
		_title: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		self.embed_query(text)
	}

	fn embed_batch<'a>(
		&'a self,
		texts: &'a [String],
		_titles: Option<&'a [String]>,
	) -> BoxFuture<'a, Result<Vec<Option<Vec<f32>>>>> {
		let out: Vec<Option<Vec<f32>>> = vec![Some(vec![0.1, 0.2, 0.3]); texts.len()];

		Box::pin(async move { Ok(out) })
	}
}

struct DummyStore {
	storage_down: bool,
}
impl SearchStore for DummyStore {
	fn vector_search<'a>(
		&'a self,
		_vector: &'a [f32],
		_limit: u32,
	) -> BoxFuture<'a, Result<Vec<RankedHit>>> {
		let storage_down = self.storage_down;

		Box::pin(async move {
			if storage_down {
				return Err(Error::Storage { message: "pool timed out".to_string() });
			}

			Ok(vec![RankedHit::new("E323100", 1), RankedHit::new("E323200", 2)])
		})
	}

	fn fts_search<'a>(&'a self, _text: &'a str, _limit: u32) -> BoxFuture<'a, Result<Vec<RankedHit>>> {
		Box::pin(async move { Ok(vec![RankedHit::new("E323100", 1)]) })
	}

	fn fetch_by_codes<'a>(
		&'a self,
		codes: &'a [String],
	) -> BoxFuture<'a, Result<HashMap<String, CodeRecord>>> {
		let out: HashMap<String, CodeRecord> = codes
			.iter()
			.map(|code| {
				let record = CodeRecord {
					anzsic_code: code.clone(),
					anzsic_desc: format!("Description of {code}"),
					division_desc: Some("Construction".to_string()),
					..CodeRecord::default()
				};

				(code.clone(), record)
			})
			.collect();

		Box::pin(async move { Ok(out) })
	}
}

struct SpyLlm {
	calls: Arc<AtomicUsize>,
	unauthorized: bool,
}
impl LlmProvider for SpyLlm {
	fn model_name(&self) -> &str {
		"llm-test"
	}

	fn generate_json<'a>(
		&'a self,
		_system_prompt: &'a str,
		_user_message: &'a str,
	) -> BoxFuture<'a, Result<Option<String>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let unauthorized = self.unauthorized;

		Box::pin(async move {
			if unauthorized {
				return Err(Error::Authentication { message: "HTTP 401".to_string() });
			}

			Ok(Some(
				r#"{"results":[{"rank":1,"anzsic_code":"E323200","anzsic_desc":"Electrical","reason":"Wiring."}]}"#
					.to_string(),
			))
		})
	}
}

struct Harness {
	app: Router,
	llm_calls: Arc<AtomicUsize>,
}

fn harness(embedding_fails: bool, storage_down: bool, unauthorized: bool) -> Harness {
	let llm_calls = Arc::new(AtomicUsize::new(0));
	let providers = Providers::new(
		Arc::new(DummyEmbedding { fail: embedding_fails }),
		Arc::new(DummyStore { storage_down }),
		Arc::new(SpyLlm { calls: llm_calls.clone(), unauthorized }),
	);
	let pipeline = ClassifierPipeline::with_providers(providers, 60, None);
	let state = AppState::with_pipeline(pipeline, RequestDefaults { top_k: 5, retrieval_n: 20 });

	Harness { app: routes::router(state), llm_calls }
}

async fn post_classify(app: Router, payload: Value) -> (StatusCode, Value) {
	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/v1/classify")
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string()))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /v1/classify.");
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json: Value = serde_json::from_slice(&body).expect("Failed to parse response.");

	(status, json)
}

#[tokio::test]
async fn health_ok() {
	let Harness { app, .. } = harness(false, false, false);
	let response = app
		.oneshot(Request::builder().uri("/health").body(Body::empty()).expect("Failed to build request."))
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn fast_classification_returns_fused_results() {
	let Harness { app, llm_calls } = harness(false, false, false);
	let (status, json) =
		post_classify(app, serde_json::json!({ "query": "plumber", "mode": "fast", "top_k": 1 }))
			.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(llm_calls.load(Ordering::SeqCst), 0);
	assert_eq!(json["mode"], "fast");
	assert_eq!(json["llm_model"], "");
	assert_eq!(json["candidates_retrieved"], 2);
	assert_eq!(json["results"].as_array().map(Vec::len), Some(1));
	assert_eq!(json["results"][0]["anzsic_code"], "E323100");
	assert_eq!(json["results"][0]["rank"], 1);
	assert!(json["generated_at"].as_str().is_some_and(|ts| ts.ends_with('Z')));
}

#[tokio::test]
async fn default_mode_reranks_with_llm() {
	let Harness { app, llm_calls } = harness(false, false, false);
	let (status, json) = post_classify(app, serde_json::json!({ "query": "sparky" })).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(llm_calls.load(Ordering::SeqCst), 1);
	assert_eq!(json["mode"], "high_fidelity");
	assert_eq!(json["llm_model"], "llm-test");
	assert_eq!(json["results"][0]["anzsic_code"], "E323200");
	assert_eq!(json["results"][0]["division_desc"], "Construction");
}

#[tokio::test]
async fn empty_query_is_unprocessable() {
	let Harness { app, llm_calls } = harness(false, false, false);
	let (status, json) = post_classify(app, serde_json::json!({ "query": "   " })).await;

	assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(llm_calls.load(Ordering::SeqCst), 0);
	assert_eq!(json["error_code"], "INVALID_REQUEST");
	assert_eq!(json["fields"][0], "$.query");
}

#[tokio::test]
async fn unknown_mode_is_unprocessable() {
	let Harness { app, .. } = harness(false, false, false);
	let (status, json) =
		post_classify(app, serde_json::json!({ "query": "plumber", "mode": "turbo" })).await;

	assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(json["fields"][0], "$.mode");
}

#[tokio::test]
async fn out_of_range_top_k_is_unprocessable() {
	let Harness { app, .. } = harness(false, false, false);
	let (status, json) =
		post_classify(app, serde_json::json!({ "query": "plumber", "top_k": 21 })).await;

	assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(json["fields"][0], "$.top_k");
}

#[tokio::test]
async fn provider_failures_map_to_gateway_statuses() {
	let Harness { app, .. } = harness(true, false, false);
	let (status, json) = post_classify(app, serde_json::json!({ "query": "plumber" })).await;

	assert_eq!(status, StatusCode::BAD_GATEWAY);
	assert_eq!(json["error_code"], "EMBEDDING_FAILED");

	let Harness { app, .. } = harness(false, true, false);
	let (status, json) = post_classify(app, serde_json::json!({ "query": "plumber" })).await;

	assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(json["error_code"], "STORAGE_UNAVAILABLE");

	let Harness { app, .. } = harness(false, false, true);
	let (status, json) = post_classify(app, serde_json::json!({ "query": "plumber" })).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(json["error_code"], "AUTHENTICATION_FAILED");
}

#[tokio::test]
async fn body_rejections_use_the_error_envelope() {
	let Harness { app, llm_calls } = harness(false, false, false);
	let (status, json) = post_classify(app, serde_json::json!({ "mode": "fast" })).await;

	assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(json["error_code"], "INVALID_REQUEST");
	assert!(json["message"].as_str().is_some_and(|message| message.contains("query")));
	assert_eq!(llm_calls.load(Ordering::SeqCst), 0);

	let Harness { app, .. } = harness(false, false, false);
	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/v1/classify")
				.header("content-type", "application/json")
				.body(Body::from("{\"query\":"))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /v1/classify.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json: Value = serde_json::from_slice(&body).expect("Rejections must be JSON.");

	assert_eq!(json["error_code"], "INVALID_REQUEST");
}
