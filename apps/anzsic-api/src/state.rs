use std::sync::Arc;

use anzsic_config::Config;
use anzsic_service::ClassifierPipeline;
use anzsic_storage::db::Db;

/// Values used when a request leaves `top_k` or `retrieval_n` out.
#[derive(Debug, Clone, Copy)]
pub struct RequestDefaults {
	pub top_k: u32,
	pub retrieval_n: u32,
}

#[derive(Clone)]
pub struct AppState {
	pub pipeline: Arc<ClassifierPipeline>,
	pub defaults: RequestDefaults,
}
impl AppState {
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema(config.storage.postgres.vector_dim).await?;

		let defaults = RequestDefaults {
			top_k: config.retrieval.top_k,
			retrieval_n: config.retrieval.retrieval_n,
		};
		let pipeline = ClassifierPipeline::new(&config, db);

		Ok(Self::with_pipeline(pipeline, defaults))
	}

	pub fn with_pipeline(pipeline: ClassifierPipeline, defaults: RequestDefaults) -> Self {
		Self { pipeline: Arc::new(pipeline), defaults }
	}
}
