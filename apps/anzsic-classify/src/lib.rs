use std::{
	fmt::Write as _,
	fs,
	path::{Path, PathBuf},
	process::ExitCode,
};

use clap::{ArgGroup, Parser};
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use anzsic_domain::{ClassifyRequest, ClassifyResponse, SearchMode};
use anzsic_service::ClassifierPipeline;
use anzsic_storage::db::Db;

const EXIT_USAGE: u8 = 2;
const DIVIDER_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy)]
struct Defaults {
	top_k: u32,
	retrieval_n: u32,
}

#[derive(Debug, Parser)]
#[command(
	version = anzsic_cli::VERSION,
	about = anzsic_cli::ABOUT,
	rename_all = "kebab",
	styles = anzsic_cli::styles(),
	group(ArgGroup::new("input").required(true).args(["query", "file"])),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Single query to classify.
	#[arg(long, short = 'q', value_name = "TEXT")]
	pub query: Option<String>,
	/// Text file with one query per line. Blank lines and lines starting with `#` are skipped.
	#[arg(long, short = 'f', value_name = "FILE")]
	pub file: Option<PathBuf>,
	/// `fast` skips language-model re-ranking.
	#[arg(long, short = 'm', value_name = "MODE", default_value = "high_fidelity")]
	pub mode: SearchMode,
	/// Results per query. Defaults to `retrieval.top_k`.
	#[arg(long, short = 'k', value_name = "N")]
	pub top_k: Option<u32>,
	/// Candidate pool per search system. Defaults to `retrieval.retrieval_n`.
	#[arg(long = "candidates", short = 'n', value_name = "N")]
	pub retrieval_n: Option<u32>,
	/// Print each response as pretty JSON.
	#[arg(long)]
	pub json: bool,
	/// Log at debug level instead of warn.
	#[arg(long, short = 'v')]
	pub verbose: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<ExitCode> {
	init_tracing(args.verbose);

	let queries = match load_queries(&args) {
		Ok(queries) => queries,
		Err(err) => {
			eprintln!("Error: {err}");

			return Ok(ExitCode::from(EXIT_USAGE));
		},
	};
	let (pipeline, defaults) = match build_pipeline(&args.config).await {
		Ok(built) => built,
		Err(err) => {
			tracing::error!(error = %err, "Pipeline initialisation failed.");
			eprintln!("Error: Pipeline initialisation failed: {err}");

			return Ok(ExitCode::FAILURE);
		},
	};
	let mut failed = false;

	for query in queries {
		let request = ClassifyRequest::new(query.clone(), args.mode)
			.with_top_k(args.top_k.unwrap_or(defaults.top_k))
			.with_retrieval_n(args.retrieval_n.unwrap_or(defaults.retrieval_n));

		match pipeline.classify(request).await {
			Ok(response) =>
				if args.json {
					println!("{}", render_json(&response)?);
				} else {
					print!("{}", render_text(&response));
				},
			Err(err) => {
				tracing::error!(query = %query, error = %err, "Classification failed.");
				eprintln!("Error [{query:?}]: {err}");

				failed = true;
			},
		}
	}

	Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Splits a query file into trimmed queries, dropping blank and `#` comment lines.
pub fn parse_query_lines(raw: &str) -> Vec<String> {
	raw.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.map(str::to_string)
		.collect()
}

pub fn render_text(response: &ClassifyResponse) -> String {
	let divider = "─".repeat(DIVIDER_WIDTH);
	let mut out = String::new();

	let _ = writeln!(out, "\n{divider}");
	let _ = writeln!(out, "Query : {}", response.query);
	let _ = writeln!(
		out,
		"Mode  : {}  |  Candidates: {}",
		response.mode, response.candidates_retrieved
	);
	let _ = writeln!(out, "{divider}");

	if response.results.is_empty() {
		let _ = writeln!(out, "  No matching codes.");
	}

	for result in &response.results {
		let _ = writeln!(
			out,
			"  #{}  [{}] {}  ({})",
			result.rank,
			result.anzsic_code,
			result.anzsic_desc,
			result.source_label().as_str()
		);

		if let Some(class_desc) = result.class_desc.as_deref().filter(|s| !s.is_empty()) {
			let _ = writeln!(out, "       Class: {class_desc}");
		}
		if let Some(division_desc) = result.division_desc.as_deref().filter(|s| !s.is_empty()) {
			let _ = writeln!(out, "       Division: {division_desc}");
		}
		if let Some(reason) = result.reason.as_deref().filter(|s| !s.is_empty()) {
			let _ = writeln!(out, "       Reason: {reason}");
		}
	}

	out.push('\n');

	out
}

pub fn render_json(response: &ClassifyResponse) -> serde_json::Result<String> {
	serde_json::to_string_pretty(response)
}

fn load_queries(args: &Args) -> eyre::Result<Vec<String>> {
	let queries = match (&args.query, &args.file) {
		(Some(query), _) => vec![query.clone()],
		(None, Some(path)) => read_query_file(path)?,
		(None, None) => return Err(eyre::eyre!("Provide --query or --file.")),
	};

	if queries.is_empty() {
		return Err(eyre::eyre!("No queries to classify."));
	}

	Ok(queries)
}

fn read_query_file(path: &Path) -> eyre::Result<Vec<String>> {
	let raw = fs::read_to_string(path)
		.map_err(|err| eyre::eyre!("Failed to read {}: {err}", path.display()))?;

	Ok(parse_query_lines(&raw))
}

async fn build_pipeline(config_path: &Path) -> eyre::Result<(ClassifierPipeline, Defaults)> {
	let config = anzsic_config::load(config_path)?;
	let db = Db::connect(&config.storage.postgres).await?;
	let defaults =
		Defaults { top_k: config.retrieval.top_k, retrieval_n: config.retrieval.retrieval_n };

	Ok((ClassifierPipeline::new(&config, db), defaults))
}

fn init_tracing(verbose: bool) {
	let filter = EnvFilter::new(if verbose { "debug" } else { "warn" });

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
