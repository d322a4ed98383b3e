use std::time::Duration;

use reqwest::{Client, StatusCode, header::HeaderMap};
use serde_json::Value;

use crate::{Error, Result};

const MAX_ERROR_BODY_CHARS: usize = 300;

pub(crate) struct RetryPolicy {
	pub max_retries: u32,
	pub backoff: Duration,
}

pub(crate) enum PostOutcome {
	/// Raw body of a successful response.
	Body(String),
	/// Non-retryable, non-success status.
	Rejected { status: u16, body: String },
	Exhausted { attempts: u32 },
}

/// Posts `body` as JSON, retrying throttling, transient server errors and transport
/// failures with exponential back-off. A success whose body cannot be read counts as a
/// transport failure. HTTP 401 fails immediately.
pub(crate) async fn post_json(
	client: &Client,
	url: &str,
	headers: &HeaderMap,
	body: &Value,
	policy: &RetryPolicy,
	provider: &'static str,
) -> Result<PostOutcome> {
	let mut delay = policy.backoff;

	for attempt in 1..=policy.max_retries {
		let last = attempt == policy.max_retries;

		match client.post(url).headers(headers.clone()).json(body).send().await {
			Ok(res) => {
				let status = res.status();

				if status == StatusCode::UNAUTHORIZED {
					return Err(Error::Authentication);
				}
				if is_retryable(status) {
					tracing::warn!(
						provider,
						status = status.as_u16(),
						attempt,
						max_retries = policy.max_retries,
						backoff_ms = delay.as_millis() as u64,
						"Provider request throttled or failed transiently."
					);
				} else if !status.is_success() {
					let text = res.text().await.unwrap_or_default();

					return Ok(PostOutcome::Rejected {
						status: status.as_u16(),
						body: truncate_body(&text),
					});
				} else {
					match res.text().await {
						Ok(text) => return Ok(PostOutcome::Body(text)),
						Err(err) => {
							tracing::warn!(
								provider,
								attempt,
								max_retries = policy.max_retries,
								error = %err,
								"Provider response body could not be read."
							);
						},
					}
				}
			},
			Err(err) => {
				tracing::warn!(
					provider,
					attempt,
					max_retries = policy.max_retries,
					error = %err,
					"Provider request error."
				);
			},
		}

		if !last {
			tokio::time::sleep(delay).await;

			delay = delay.saturating_mul(2);
		}
	}

	Ok(PostOutcome::Exhausted { attempts: policy.max_retries })
}

fn is_retryable(status: StatusCode) -> bool {
	matches!(
		status,
		StatusCode::TOO_MANY_REQUESTS
			| StatusCode::INTERNAL_SERVER_ERROR
			| StatusCode::SERVICE_UNAVAILABLE
	)
}

fn truncate_body(text: &str) -> String {
	text.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
