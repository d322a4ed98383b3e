use std::collections::HashMap;

use crate::{
	Error, Result,
	db::Db,
	models::{CodeRow, RankedRow},
};
use anzsic_domain::{CodeRecord, RankedHit};

/// Nearest codes by cosine distance, ranked from 1.
pub async fn vector_search(db: &Db, vec: &[f32], limit: u32) -> Result<Vec<RankedHit>> {
	if vec.is_empty() {
		return Err(Error::InvalidArgument("Query vector must be non-empty.".to_string()));
	}
	if limit == 0 {
		return Ok(Vec::new());
	}

	let vec_text = vector_to_pg(vec);
	let rows: Vec<RankedRow> = sqlx::query_as(
		"\
SELECT
	anzsic_code,
	ROW_NUMBER() OVER (ORDER BY embedding <=> $1::text::vector) AS rank
FROM anzsic_codes
WHERE embedding IS NOT NULL
ORDER BY embedding <=> $1::text::vector
LIMIT $2",
	)
	.bind(vec_text.as_str())
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().map(into_hit).collect())
}

/// Keyword matches by `ts_rank_cd`, ranked from 1. Blank text matches nothing.
pub async fn fts_search(db: &Db, text: &str, limit: u32) -> Result<Vec<RankedHit>> {
	let text = text.trim();

	if text.is_empty() || limit == 0 {
		return Ok(Vec::new());
	}

	let rows: Vec<RankedRow> = sqlx::query_as(
		"\
SELECT
	anzsic_code,
	ROW_NUMBER() OVER (ORDER BY ts_rank_cd(fts_vector, query) DESC) AS rank
FROM anzsic_codes, plainto_tsquery('english', $1) AS query
WHERE fts_vector @@ query
ORDER BY ts_rank_cd(fts_vector, query) DESC
LIMIT $2",
	)
	.bind(text)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().map(into_hit).collect())
}

/// Records keyed by code. Codes without a row are absent from the map.
pub async fn fetch_by_codes(db: &Db, codes: &[String]) -> Result<HashMap<String, CodeRecord>> {
	if codes.is_empty() {
		return Ok(HashMap::new());
	}

	let rows: Vec<CodeRow> = sqlx::query_as(
		"\
SELECT
	anzsic_code,
	anzsic_desc,
	class_code,
	class_desc,
	group_code,
	group_desc,
	subdivision_desc,
	division_desc,
	class_exclusions,
	enriched_text
FROM anzsic_codes
WHERE anzsic_code = ANY($1)",
	)
	.bind(codes)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().map(|row| (row.anzsic_code.clone(), CodeRecord::from(row))).collect())
}

pub async fn upsert_code(db: &Db, record: &CodeRecord, embedding: Option<&[f32]>) -> Result<()> {
	let vec_text = embedding.map(vector_to_pg);

	sqlx::query(
		"\
INSERT INTO anzsic_codes (
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
	embedding
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11::text::vector)
ON CONFLICT (anzsic_code) DO UPDATE
SET
	anzsic_desc = EXCLUDED.anzsic_desc,
	class_code = EXCLUDED.class_code,
	class_desc = EXCLUDED.class_desc,
	group_code = EXCLUDED.group_code,
	group_desc = EXCLUDED.group_desc,
	subdivision_desc = EXCLUDED.subdivision_desc,
	division_desc = EXCLUDED.division_desc,
	class_exclusions = EXCLUDED.class_exclusions,
	enriched_text = EXCLUDED.enriched_text,
	embedding = EXCLUDED.embedding",
	)
	.bind(record.anzsic_code.as_str())
	.bind(record.anzsic_desc.as_str())
	.bind(record.class_code.as_deref())
	.bind(record.class_desc.as_deref())
	.bind(record.group_code.as_deref())
	.bind(record.group_desc.as_deref())
	.bind(record.subdivision_desc.as_deref())
	.bind(record.division_desc.as_deref())
	.bind(record.class_exclusions.as_deref())
	.bind(record.enriched_text.as_deref())
	.bind(vec_text.as_deref())
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Renders a vector as a pgvector text literal.
pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

fn into_hit(row: RankedRow) -> RankedHit {
	RankedHit::new(row.anzsic_code, u32::try_from(row.rank).unwrap_or(u32::MAX))
}
