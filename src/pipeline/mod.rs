pub mod allocation;
pub mod cohere;
pub mod generation;
pub mod ingestion;
pub mod orchestrator;
pub mod overpass;
pub mod places;
pub mod preprocess;
pub mod prompt;
pub mod rules;
pub mod search;
pub mod triage;

pub use allocation::*;
pub use generation::*;
pub use ingestion::*;
pub use orchestrator::*;
pub use rules::*;
pub use search::*;
pub use triage::*;

use thiserror::Error;

use crate::db::DatabaseError;

/// Why a pipeline run was aborted.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Text generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Malformed urgency reply from generator: {0:?}")]
    MalformedUrgency(String),

    #[error("Failed to build patient document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Client initialization failed: {0}")]
    ClientInit(String),
}

impl PipelineError {
    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        PipelineError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
