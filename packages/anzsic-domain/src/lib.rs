pub mod models;
pub mod request;
pub mod time_serde;

pub use models::{
	Candidate, ClassifyResponse, ClassifyResult, CodeRecord, FusedCandidate, RankedHit, SourceLabel,
};
pub use request::{ClassifyRequest, MAX_QUERY_CHARS, SearchMode, ValidationError};
