use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use anzsic_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &[&str], key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let mut table = root.as_table_mut().expect("Template config must be a table.");

	for name in section {
		table = table
			.get_mut(*name)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{name}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("anzsic_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> anzsic_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = anzsic_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.")
}

#[test]
fn sample_config_loads_and_normalizes() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string())
		.expect("Sample config must be valid.");

	assert_eq!(cfg.retrieval.rrf_k, 60);
	assert_eq!(cfg.providers.embedding.dimensions, 768);
	assert!(cfg.providers.embedding.query_input_type.is_none());
	assert_eq!(
		cfg.reference.master_csv_path.as_deref(),
		Some(std::path::Path::new("anzsic_master.csv"))
	);
}

#[test]
fn blank_reference_path_is_normalized_away() {
	let payload =
		sample_toml_with(&["reference"], "master_csv_path", Value::String("  ".to_string()));
	let cfg = load_payload(payload).expect("Blank reference path must be accepted.");

	assert!(cfg.reference.master_csv_path.is_none());
}

#[test]
fn retrieval_section_defaults_when_missing() {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");

	root.as_table_mut().expect("Template config must be a table.").remove("retrieval");

	let payload = toml::to_string(&root).expect("Failed to render template config.");
	let cfg = load_payload(payload).expect("Config without [retrieval] must be valid.");

	assert_eq!(cfg.retrieval.rrf_k, 60);
	assert_eq!(cfg.retrieval.retrieval_n, 20);
	assert_eq!(cfg.retrieval.top_k, 5);
}

#[test]
fn unknown_provider_is_rejected() {
	let payload = sample_toml_with(
		&["providers", "llm"],
		"provider_id",
		Value::String("cohere".to_string()),
	);
	let err = load_payload(payload).expect_err("Expected provider selection error.");

	assert!(matches!(err, Error::UnsupportedProvider { section: "providers.llm", .. }));
}

#[test]
fn vertex_provider_is_accepted_for_both_roles() {
	let mut cfg = base_config();

	cfg.providers.embedding.provider_id = "vertex".to_string();
	cfg.providers.llm.provider_id = "Vertex".to_string();

	anzsic_config::validate(&cfg).expect("Vertex providers must be accepted.");
}

#[test]
fn embedding_dimensions_must_match_vector_dim() {
	let payload =
		sample_toml_with(&["providers", "embedding"], "dimensions", Value::Integer(1_536));
	let err = load_payload(payload).expect_err("Expected dimension mismatch error.");

	assert!(
		err.to_string()
			.contains("providers.embedding.dimensions must match storage.postgres.vector_dim."),
		"Unexpected error: {err}"
	);
}

#[test]
fn rrf_k_must_be_positive() {
	let mut cfg = base_config();

	cfg.retrieval.rrf_k = 0;

	let err = anzsic_config::validate(&cfg).expect_err("Expected rrf_k validation error.");

	assert!(err.to_string().contains("retrieval.rrf_k must be greater than zero."));
}

#[test]
fn retrieval_bounds_are_enforced() {
	let mut cfg = base_config();

	cfg.retrieval.top_k = 21;

	assert!(anzsic_config::validate(&cfg).is_err());

	cfg.retrieval.top_k = 20;
	cfg.retrieval.retrieval_n = 51;

	assert!(anzsic_config::validate(&cfg).is_err());

	cfg.retrieval.retrieval_n = 50;

	assert!(anzsic_config::validate(&cfg).is_ok());
}

#[test]
fn api_keys_must_be_non_empty() {
	let mut cfg = base_config();

	cfg.providers.llm.api_key = "   ".to_string();

	let err = anzsic_config::validate(&cfg).expect_err("Expected api_key validation error.");

	assert!(err.to_string().contains("Provider llm api_key must be non-empty."));
}

#[test]
fn temperature_must_be_in_range() {
	let mut cfg = base_config();

	cfg.providers.llm.temperature = f32::NAN;

	assert!(anzsic_config::validate(&cfg).is_err());

	cfg.providers.llm.temperature = 2.5;

	assert!(anzsic_config::validate(&cfg).is_err());
}

#[test]
fn missing_file_reports_read_error() {
	let err = anzsic_config::load(std::path::Path::new("/nonexistent/anzsic.toml"))
		.expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}
