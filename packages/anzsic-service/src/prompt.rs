//! Prompt text for the re-ranking stage.

use std::fmt::Write;

use anzsic_domain::Candidate;

use crate::reference::ReferenceTable;

const DIVIDER_WIDTH: usize = 77;

/// Builds the system prompt. The reference listing is appended only when provided.
pub fn build_system_prompt(top_k: u32, reference: Option<&ReferenceTable>) -> String {
	let mut prompt = format!(
		"\
You are an expert ANZSIC (Australian and New Zealand Standard Industrial Classification) coder.
Your job is to match a poorly-worded occupation description provided by a non-expert to the \
correct ANZSIC occupation codes.

You will be given:
1. The user's raw input description
2. A list of candidate ANZSIC codes retrieved by a search system (each with its description, \
class, group, subdivision, division, and a \"NOT included\" exclusion note)

Your task:
- Carefully read each candidate.
- Use the \"Not included\" exclusion text to ELIMINATE candidates that are explicitly ruled out.
- Select the TOP {top_k} best-matching codes, ranked from most to least likely.
- For each selected code provide a short plain-English reason (1-2 sentences) explaining WHY it \
matches (or why you ranked it above other options).
- If fewer than {top_k} candidates genuinely match, return fewer. Do not pad with poor matches.

Respond ONLY with JSON in this exact schema (no markdown fences):
[
  {{
    \"rank\": 1,
    \"anzsic_code\": \"X1234_56\",
    \"anzsic_desc\": \"...\",
    \"class_desc\": \"...\",
    \"division_desc\": \"...\",
    \"reason\": \"...\"
  }},
  ...
]
"
	);

	if let Some(reference) = reference {
		let divider = "─".repeat(DIVIDER_WIDTH);

		let _ = write!(
			prompt,
			"\n{divider}\n\
			FULL ANZSIC REFERENCE: the candidate list above may be insufficient.\n\
			All {} codes are listed below as:  CODE: description\n\
			Use this reference to find a better match if none of the candidates fit.\n\
			{divider}\n",
			reference.entries(),
		);

		prompt.push_str(reference.as_str());
	}

	prompt
}

pub fn build_user_message(query: &str, candidates: &[Candidate], top_k: u32) -> String {
	format!(
		"User input: \"{query}\"\n\nCandidates ({} total):\n{}\n\nReturn the top {top_k} matches as a JSON array.",
		candidates.len(),
		build_candidate_block(candidates),
	)
}

/// Numbers candidates from 1 and lists their hierarchy, with exclusions when present.
pub fn build_candidate_block(candidates: &[Candidate]) -> String {
	candidates
		.iter()
		.enumerate()
		.map(|(i, c)| {
			let mut block = format!(
				"[{}] Code: {}\n    Occupation: {}\n    Class: {}\n    Group: {}\n    Subdivision: {}\n    Division: {}\n",
				i + 1,
				c.anzsic_code,
				c.anzsic_desc,
				c.class_desc.as_deref().unwrap_or_default(),
				c.group_desc.as_deref().unwrap_or_default(),
				c.subdivision_desc.as_deref().unwrap_or_default(),
				c.division_desc.as_deref().unwrap_or_default(),
			);

			if let Some(exclusions) = c.class_exclusions.as_deref().filter(|s| !s.trim().is_empty()) {
				let _ = writeln!(block, "    Not included: {exclusions}");
			}

			block
		})
		.collect::<Vec<_>>()
		.join("\n")
}
