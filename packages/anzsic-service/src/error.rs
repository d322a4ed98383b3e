use anzsic_domain::ValidationError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { field: Option<String>, message: String },
	#[error("Authentication failed: {message}")]
	Authentication { message: String },
	#[error("Embedding error: {message}")]
	Embedding { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("LLM error: {message}")]
	Llm { message: String },
}
impl Error {
	pub fn from_embedding(err: anzsic_providers::Error) -> Self {
		match err {
			anzsic_providers::Error::Authentication =>
				Self::Authentication { message: err.to_string() },
			other => Self::Embedding { message: other.to_string() },
		}
	}

	pub fn from_llm(err: anzsic_providers::Error) -> Self {
		match err {
			anzsic_providers::Error::Authentication =>
				Self::Authentication { message: err.to_string() },
			other => Self::Llm { message: other.to_string() },
		}
	}
}

impl From<ValidationError> for Error {
	fn from(err: ValidationError) -> Self {
		Self::InvalidRequest { field: Some(err.field().to_string()), message: err.to_string() }
	}
}

impl From<anzsic_storage::Error> for Error {
	fn from(err: anzsic_storage::Error) -> Self {
		match err {
			anzsic_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			anzsic_storage::Error::InvalidArgument(message) => Self::Storage { message },
		}
	}
}
