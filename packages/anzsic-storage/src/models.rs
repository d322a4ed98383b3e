use anzsic_domain::CodeRecord;

#[derive(Debug, sqlx::FromRow)]
pub struct CodeRow {
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
impl From<CodeRow> for CodeRecord {
	fn from(row: CodeRow) -> Self {
		Self {
			anzsic_code: row.anzsic_code,
			anzsic_desc: row.anzsic_desc,
			class_code: row.class_code,
			class_desc: row.class_desc,
			group_code: row.group_code,
			group_desc: row.group_desc,
			subdivision_desc: row.subdivision_desc,
			division_desc: row.division_desc,
			class_exclusions: row.class_exclusions,
			enriched_text: row.enriched_text,
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct RankedRow {
	pub anzsic_code: String,
	pub rank: i64,
}
