//! Dashboard HTTP API.
//!
//! Read endpoints over the document store plus a submission endpoint that
//! runs the triage flow. Routes are nested under `/api/`.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::serve;
pub use types::ApiContext;
