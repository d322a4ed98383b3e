use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::request::SearchMode;

/// One `(code, rank)` pair from a single search system. Ranks are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedHit {
	pub code: String,
	pub rank: u32,
}
impl RankedHit {
	pub fn new(code: impl Into<String>, rank: u32) -> Self {
		Self { code: code.into(), rank }
	}
}

/// A code scored by Reciprocal Rank Fusion, with provenance from each search system.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedCandidate {
	pub code: String,
	pub score: f64,
	pub in_vector: bool,
	pub in_fts: bool,
	pub vector_rank: Option<u32>,
	pub fts_rank: Option<u32>,
}

/// The stored descriptive record of a code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRecord {
	pub anzsic_code: String,
	pub anzsic_desc: String,
	pub class_code: Option<String>,
	pub class_desc: Option<String>,
	pub group_code: Option<String>,
	pub group_desc: Option<String>,
	pub subdivision_desc: Option<String>,
	pub division_desc: Option<String>,
	pub class_exclusions: Option<String>,
	pub enriched_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLabel {
	Both,
	Vector,
	Fts,
	Unknown,
}
impl SourceLabel {
	pub fn from_flags(in_vector: bool, in_fts: bool) -> Self {
		match (in_vector, in_fts) {
			(true, true) => Self::Both,
			(true, false) => Self::Vector,
			(false, true) => Self::Fts,
			(false, false) => Self::Unknown,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Both => "BOTH",
			Self::Vector => "VEC",
			Self::Fts => "FTS",
			Self::Unknown => "-",
		}
	}
}

/// A retrieved code: the stored record plus its fusion score and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	pub anzsic_code: String,
	pub anzsic_desc: String,
	pub class_code: Option<String>,
	pub class_desc: Option<String>,
	pub group_code: Option<String>,
	pub group_desc: Option<String>,
	pub subdivision_desc: Option<String>,
	pub division_desc: Option<String>,
	pub class_exclusions: Option<String>,
	pub enriched_text: Option<String>,
	pub rrf_score: f64,
	pub in_vector: bool,
	pub in_fts: bool,
	pub vector_rank: Option<u32>,
	pub fts_rank: Option<u32>,
}
impl Candidate {
	pub fn new(record: CodeRecord, fused: &FusedCandidate, rrf_score: f64) -> Self {
		let CodeRecord {
			anzsic_code,
			anzsic_desc,
			class_code,
			class_desc,
			group_code,
			group_desc,
			subdivision_desc,
			division_desc,
			class_exclusions,
			enriched_text,
		} = record;

		Self {
			anzsic_code,
			anzsic_desc,
			class_code,
			class_desc,
			group_code,
			group_desc,
			subdivision_desc,
			division_desc,
			class_exclusions,
			enriched_text,
			rrf_score,
			in_vector: fused.in_vector,
			in_fts: fused.in_fts,
			vector_rank: fused.vector_rank,
			fts_rank: fused.fts_rank,
		}
	}

	pub fn source_label(&self) -> SourceLabel {
		SourceLabel::from_flags(self.in_vector, self.in_fts)
	}
}

/// One output row.
///
/// `rank`, `anzsic_code` and `anzsic_desc` are required when decoding a language-model
/// answer. Everything else is optional and may be filled from the matching candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResult {
	pub rank: u32,
	pub anzsic_code: String,
	pub anzsic_desc: String,
	#[serde(default)]
	pub class_desc: Option<String>,
	#[serde(default)]
	pub division_desc: Option<String>,
	#[serde(default)]
	pub reason: Option<String>,
	#[serde(default)]
	pub group_desc: Option<String>,
	#[serde(default)]
	pub subdivision_desc: Option<String>,
	#[serde(default)]
	pub class_exclusions: Option<String>,
	#[serde(default)]
	pub rrf_score: Option<f64>,
	#[serde(default)]
	pub in_vector: Option<bool>,
	#[serde(default)]
	pub in_fts: Option<bool>,
	#[serde(default)]
	pub vector_rank: Option<u32>,
	#[serde(default)]
	pub fts_rank: Option<u32>,
}
impl ClassifyResult {
	/// Builds a retrieval-only result whose reason reports the fusion score and provenance.
	pub fn from_candidate(candidate: &Candidate, rank: u32) -> Self {
		let reason = format!(
			"RRF score: {:.6} (vector={}, fts={})",
			candidate.rrf_score,
			check_mark(candidate.in_vector),
			check_mark(candidate.in_fts),
		);

		Self {
			rank,
			anzsic_code: candidate.anzsic_code.clone(),
			anzsic_desc: candidate.anzsic_desc.clone(),
			class_desc: candidate.class_desc.clone(),
			division_desc: candidate.division_desc.clone(),
			reason: Some(reason),
			group_desc: candidate.group_desc.clone(),
			subdivision_desc: candidate.subdivision_desc.clone(),
			class_exclusions: candidate.class_exclusions.clone(),
			rrf_score: Some(candidate.rrf_score),
			in_vector: Some(candidate.in_vector),
			in_fts: Some(candidate.in_fts),
			vector_rank: candidate.vector_rank,
			fts_rank: candidate.fts_rank,
		}
	}

	/// Fills hierarchy and provenance fields the result does not carry yet.
	pub fn enrich_from(&mut self, candidate: &Candidate) {
		fill(&mut self.class_desc, &candidate.class_desc);
		fill(&mut self.division_desc, &candidate.division_desc);
		fill(&mut self.group_desc, &candidate.group_desc);
		fill(&mut self.subdivision_desc, &candidate.subdivision_desc);
		fill(&mut self.class_exclusions, &candidate.class_exclusions);

		self.rrf_score.get_or_insert(candidate.rrf_score);
		self.in_vector.get_or_insert(candidate.in_vector);
		self.in_fts.get_or_insert(candidate.in_fts);

		if self.vector_rank.is_none() {
			self.vector_rank = candidate.vector_rank;
		}
		if self.fts_rank.is_none() {
			self.fts_rank = candidate.fts_rank;
		}
	}

	pub fn source_label(&self) -> SourceLabel {
		SourceLabel::from_flags(self.in_vector.unwrap_or(false), self.in_fts.unwrap_or(false))
	}
}

/// The response envelope returned by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResponse {
	pub query: String,
	pub mode: SearchMode,
	pub results: Vec<ClassifyResult>,
	pub candidates_retrieved: u32,
	#[serde(with = "crate::time_serde")]
	pub generated_at: OffsetDateTime,
	pub embed_model: String,
	/// Empty when the re-ranking stage did not run.
	pub llm_model: String,
}

fn check_mark(flag: bool) -> char {
	if flag { '✓' } else { '✗' }
}

fn fill(slot: &mut Option<String>, source: &Option<String>) {
	if slot.as_deref().map(|value| value.trim().is_empty()).unwrap_or(true) && source.is_some() {
		slot.clone_from(source);
	}
}
