//! Patient endpoints.
//!
//! - `GET /api/patients` prioritized list, `?priority=high,medium` filter
//! - `GET /api/patients/:id` one stored document
//! - `POST /api/patients` run a submission through the triage flow
//! - `POST /api/rescore` re-apply the rule table to stored patients

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::blocking;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::dashboard::{self, PatientRow};
use crate::models::{PatientRecord, Priority};
use crate::pipeline::{RescoreReport, TriageOutcome};

#[derive(Deserialize)]
pub struct PatientListQuery {
    pub priority: Option<String>,
}

#[derive(Serialize)]
pub struct PatientListResponse {
    pub patients: Vec<PatientRow>,
    pub total: usize,
}

/// Comma-separated priority bands. Empty input means every band.
fn parse_bands(raw: Option<&str>) -> Result<Vec<Priority>, ApiError> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.to_ascii_lowercase()
                .parse::<Priority>()
                .map_err(|_| ApiError::BadRequest(format!("unknown priority '{s}'")))
        })
        .collect()
}

/// `GET /api/patients`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<PatientListResponse>, ApiError> {
    let bands = parse_bands(query.priority.as_deref())?;
    let patients = blocking(move || Ok(dashboard::prioritized_patients(ctx.store.as_ref(), &bands)?)).await?;
    Ok(Json(PatientListResponse {
        total: patients.len(),
        patients,
    }))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientRecord>, ApiError> {
    let lookup = patient_id.clone();
    let record = blocking(move || Ok(ctx.store.get_patient(&lookup)?)).await?;
    record
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("patient {patient_id}")))
}

/// `POST /api/patients`
pub async fn submit(
    State(ctx): State<ApiContext>,
    Json(candidate): Json<Value>,
) -> Result<(StatusCode, Json<TriageOutcome>), ApiError> {
    let outcome = blocking(move || Ok(ctx.flow.run(candidate)?)).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// `POST /api/rescore`
pub async fn rescore(State(ctx): State<ApiContext>) -> Result<Json<RescoreReport>, ApiError> {
    let report = blocking(move || Ok(ctx.flow.rescore_all()?)).await?;
    Ok(Json(report))
}
