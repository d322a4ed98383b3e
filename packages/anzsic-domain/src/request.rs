use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use anzsic_config::{MAX_RETRIEVAL_N, MAX_TOP_K};

pub const MAX_QUERY_CHARS: usize = 2_000;

/// Controls which pipeline stages run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
	/// Hybrid retrieval only.
	Fast,
	/// Hybrid retrieval followed by language-model re-ranking.
	#[default]
	HighFidelity,
}
impl SearchMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Fast => "fast",
			Self::HighFidelity => "high_fidelity",
		}
	}
}
impl Display for SearchMode {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
impl std::str::FromStr for SearchMode {
	type Err = ValidationError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim() {
			"fast" => Ok(Self::Fast),
			"high_fidelity" => Ok(Self::HighFidelity),
			other => Err(ValidationError::UnknownMode { mode: other.to_string() }),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
	#[error("query must be non-empty after trimming.")]
	EmptyQuery,
	#[error("query must be at most {max} characters, got {len}.")]
	QueryTooLong { len: usize, max: usize },
	#[error("top_k must be in the range 1-{max}, got {value}.")]
	TopKOutOfRange { value: u32, max: u32 },
	#[error("retrieval_n must be in the range 1-{max}, got {value}.")]
	RetrievalNOutOfRange { value: u32, max: u32 },
	#[error("mode must be one of fast or high_fidelity, got {mode:?}.")]
	UnknownMode { mode: String },
}
impl ValidationError {
	pub fn field(&self) -> &'static str {
		match self {
			Self::EmptyQuery | Self::QueryTooLong { .. } => "query",
			Self::TopKOutOfRange { .. } => "top_k",
			Self::RetrievalNOutOfRange { .. } => "retrieval_n",
			Self::UnknownMode { .. } => "mode",
		}
	}
}

/// Input to the classifier pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
	pub query: String,
	#[serde(default)]
	pub mode: SearchMode,
	#[serde(default = "default_top_k")]
	pub top_k: u32,
	#[serde(default = "default_retrieval_n")]
	pub retrieval_n: u32,
}
impl ClassifyRequest {
	pub fn new(query: impl Into<String>, mode: SearchMode) -> Self {
		Self { query: query.into(), mode, top_k: default_top_k(), retrieval_n: default_retrieval_n() }
	}

	pub fn with_top_k(mut self, top_k: u32) -> Self {
		self.top_k = top_k;

		self
	}

	pub fn with_retrieval_n(mut self, retrieval_n: u32) -> Self {
		self.retrieval_n = retrieval_n;

		self
	}

	/// Trims the query in place and checks every bound.
	pub fn validate(&mut self) -> Result<(), ValidationError> {
		let trimmed = self.query.trim();

		if trimmed.len() != self.query.len() {
			self.query = trimmed.to_string();
		}
		if self.query.is_empty() {
			return Err(ValidationError::EmptyQuery);
		}

		let len = self.query.chars().count();

		if len > MAX_QUERY_CHARS {
			return Err(ValidationError::QueryTooLong { len, max: MAX_QUERY_CHARS });
		}
		if !(1..=MAX_TOP_K).contains(&self.top_k) {
			return Err(ValidationError::TopKOutOfRange { value: self.top_k, max: MAX_TOP_K });
		}
		if !(1..=MAX_RETRIEVAL_N).contains(&self.retrieval_n) {
			return Err(ValidationError::RetrievalNOutOfRange {
				value: self.retrieval_n,
				max: MAX_RETRIEVAL_N,
			});
		}

		Ok(())
	}
}

fn default_top_k() -> u32 {
	5
}

fn default_retrieval_n() -> u32 {
	20
}
