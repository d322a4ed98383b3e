use std::{fs, path::Path};

use csv::ReaderBuilder;

const CODE_COLUMN: &str = "anzsic_code";
const DESC_COLUMN: &str = "anzsic_desc";

/// Full `CODE: description` listing appended to the re-ranking prompt on fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTable {
	rendered: String,
	entries: usize,
}
impl ReferenceTable {
	/// Loads the table from a CSV file, returning `None` when the file is missing, unreadable,
	/// lacks the code and description columns or has no usable rows.
	pub fn load(path: &Path) -> Option<Self> {
		if !path.exists() {
			tracing::warn!(path = %path.display(), "Reference CSV not found. Fallback runs without it.");

			return None;
		}

		let raw = match fs::read_to_string(path) {
			Ok(raw) => raw,
			Err(err) => {
				tracing::error!(path = %path.display(), error = %err, "Failed to read reference CSV.");

				return None;
			},
		};
		let table = Self::from_csv(&raw);

		match &table {
			Some(table) => tracing::info!(
				entries = table.entries,
				chars = table.rendered.len(),
				"Reference CSV loaded."
			),
			None => tracing::warn!(path = %path.display(), "Reference CSV has no usable rows."),
		}

		table
	}

	/// Builds the table from CSV text with `anzsic_code` and `anzsic_desc` header columns.
	/// Quoted fields may span lines. Rows missing either value are skipped.
	pub fn from_csv(raw: &str) -> Option<Self> {
		let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
		let mut reader =
			ReaderBuilder::new().has_headers(true).flexible(true).from_reader(raw.as_bytes());
		let headers = reader.headers().ok()?.clone();
		let code_idx = headers.iter().position(|name| name.trim() == CODE_COLUMN)?;
		let desc_idx = headers.iter().position(|name| name.trim() == DESC_COLUMN)?;
		let mut rendered = String::new();
		let mut entries = 0;

		for record in reader.records() {
			let record = match record {
				Ok(record) => record,
				Err(err) => {
					tracing::warn!(error = %err, "Skipping unreadable reference CSV row.");

					continue;
				},
			};
			let code = record.get(code_idx).map(str::trim).unwrap_or_default();
			let desc = record.get(desc_idx).map(str::trim).unwrap_or_default();

			if code.is_empty() || desc.is_empty() {
				continue;
			}
			if entries > 0 {
				rendered.push('\n');
			}

			rendered.push_str(code);
			rendered.push_str(": ");
			rendered.push_str(desc);

			entries += 1;
		}

		if entries == 0 { None } else { Some(Self { rendered, entries }) }
	}

	pub fn entries(&self) -> usize {
		self.entries
	}

	pub fn as_str(&self) -> &str {
		&self.rendered
	}
}
