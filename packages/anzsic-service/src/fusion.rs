//! Reciprocal Rank Fusion of the vector and keyword result lists.

use std::collections::HashMap;

use anzsic_domain::{FusedCandidate, RankedHit};

pub const DEFAULT_RRF_K: u32 = 60;

/// Fuses two ranked lists into one scored candidate per distinct code.
///
/// Each code scores `1/(k + rank)` for every list it appears in. When a code repeats
/// within one list, its last occurrence sets the rank. Output follows first appearance,
/// vector list first, so callers sort it themselves.
pub fn fuse(vector_hits: &[RankedHit], fts_hits: &[RankedHit], k: u32) -> Vec<FusedCandidate> {
	let mut order: Vec<&str> = Vec::with_capacity(vector_hits.len() + fts_hits.len());
	let mut vector_ranks: HashMap<&str, u32> = HashMap::with_capacity(vector_hits.len());
	let mut fts_ranks: HashMap<&str, u32> = HashMap::with_capacity(fts_hits.len());

	for hit in vector_hits {
		if vector_ranks.insert(hit.code.as_str(), hit.rank).is_none() {
			order.push(hit.code.as_str());
		}
	}
	for hit in fts_hits {
		if fts_ranks.insert(hit.code.as_str(), hit.rank).is_none()
			&& !vector_ranks.contains_key(hit.code.as_str())
		{
			order.push(hit.code.as_str());
		}
	}

	order
		.into_iter()
		.map(|code| {
			let vector_rank = vector_ranks.get(code).copied();
			let fts_rank = fts_ranks.get(code).copied();
			let score = vector_rank.map(|rank| rrf_term(k, rank)).unwrap_or(0.0)
				+ fts_rank.map(|rank| rrf_term(k, rank)).unwrap_or(0.0);

			FusedCandidate {
				code: code.to_string(),
				score,
				in_vector: vector_rank.is_some(),
				in_fts: fts_rank.is_some(),
				vector_rank,
				fts_rank,
			}
		})
		.collect()
}

fn rrf_term(k: u32, rank: u32) -> f64 {
	1.0 / (f64::from(k) + f64::from(rank))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hits(items: &[(&str, u32)]) -> Vec<RankedHit> {
		items.iter().map(|(code, rank)| RankedHit::new(*code, *rank)).collect()
	}

	fn score_of(fused: &[FusedCandidate], code: &str) -> f64 {
		fused.iter().find(|c| c.code == code).map(|c| c.score).expect("Code must be fused.")
	}

	#[test]
	fn scores_are_strictly_positive() {
		let fused = fuse(
			&hits(&[("A", 1), ("B", 2), ("C", 50)]),
			&hits(&[("C", 1), ("D", 200)]),
			DEFAULT_RRF_K,
		);

		assert_eq!(fused.len(), 4);
		assert!(fused.iter().all(|c| c.score > 0.0));
	}

	#[test]
	fn matches_exact_formula() {
		let fused = fuse(&hits(&[("A", 1)]), &hits(&[("A", 2)]), 60);

		assert_eq!(fused.len(), 1);
		assert!((fused[0].score - (1.0 / 61.0 + 1.0 / 62.0)).abs() < 1e-10);
		assert_eq!(fused[0].vector_rank, Some(1));
		assert_eq!(fused[0].fts_rank, Some(2));
	}

	#[test]
	fn both_lists_outscore_single_list_at_same_rank() {
		let fused = fuse(&hits(&[("A", 1), ("B", 1)]), &hits(&[("A", 2)]), 60);

		assert!((score_of(&fused, "B") - 1.0 / 61.0).abs() < 1e-10);
		assert!(score_of(&fused, "A") > score_of(&fused, "B"));
	}

	#[test]
	fn empty_inputs_produce_nothing() {
		assert!(fuse(&[], &[], DEFAULT_RRF_K).is_empty());
	}

	#[test]
	fn one_sided_input_keeps_only_that_side() {
		let vector_only = fuse(&hits(&[("A", 1), ("B", 2)]), &[], DEFAULT_RRF_K);

		assert_eq!(vector_only.len(), 2);
		assert!(vector_only.iter().all(|c| c.in_vector && !c.in_fts && c.fts_rank.is_none()));

		let fts_only = fuse(&[], &hits(&[("C", 1)]), DEFAULT_RRF_K);

		assert_eq!(fts_only.len(), 1);
		assert!(!fts_only[0].in_vector && fts_only[0].in_fts);
		assert_eq!(fts_only[0].vector_rank, None);
	}

	#[test]
	fn larger_k_lowers_scores() {
		let vector = hits(&[("A", 3)]);
		let low = fuse(&vector, &[], 10)[0].score;
		let mid = fuse(&vector, &[], 60)[0].score;
		let high = fuse(&vector, &[], 200)[0].score;

		assert!(low > mid);
		assert!(mid > high);
	}

	#[test]
	fn duplicate_code_in_one_list_keeps_last_rank() {
		let fused = fuse(&hits(&[("A", 1), ("B", 2), ("A", 5)]), &[], 60);

		assert_eq!(fused.len(), 2);
		assert_eq!(fused[0].code, "A");
		assert_eq!(fused[0].vector_rank, Some(5));
		assert!((fused[0].score - 1.0 / 65.0).abs() < 1e-10);
	}

	#[test]
	fn output_follows_first_appearance() {
		let fused = fuse(&hits(&[("B", 1), ("A", 2)]), &hits(&[("C", 1), ("A", 2)]), 60);
		let codes: Vec<&str> = fused.iter().map(|c| c.code.as_str()).collect();

		assert_eq!(codes, ["B", "A", "C"]);
	}
}
