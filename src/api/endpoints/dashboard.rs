//! Dashboard panels: metrics, hospitals, recent alerts, analytics.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::blocking;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::dashboard::{self, HospitalCount, PriorityCounts, SymptomCount, ANALYTICS_TOP_SYMPTOMS};
use crate::models::{AlertRecord, HospitalRecord};

/// `GET /api/metrics`
pub async fn metrics(State(ctx): State<ApiContext>) -> Result<Json<PriorityCounts>, ApiError> {
    let counts = blocking(move || Ok(dashboard::priority_counts(ctx.store.as_ref())?)).await?;
    Ok(Json(counts))
}

#[derive(Serialize)]
pub struct HospitalsResponse {
    pub hospitals: Vec<HospitalRecord>,
}

/// `GET /api/hospitals`
pub async fn hospitals(State(ctx): State<ApiContext>) -> Result<Json<HospitalsResponse>, ApiError> {
    let hospitals = blocking(move || Ok(dashboard::hospitals(ctx.store.as_ref())?)).await?;
    Ok(Json(HospitalsResponse { hospitals }))
}

#[derive(Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertRecord>,
}

/// `GET /api/alerts`
pub async fn alerts(State(ctx): State<ApiContext>) -> Result<Json<AlertsResponse>, ApiError> {
    let alerts = blocking(move || Ok(dashboard::recent_alerts(ctx.store.as_ref())?)).await?;
    Ok(Json(AlertsResponse { alerts }))
}

#[derive(Serialize)]
pub struct AnalyticsResponse {
    pub priority: PriorityCounts,
    pub top_symptoms: Vec<SymptomCount>,
    pub hospitals: Vec<HospitalCount>,
}

/// `GET /api/analytics`
pub async fn analytics(State(ctx): State<ApiContext>) -> Result<Json<AnalyticsResponse>, ApiError> {
    let response = blocking(move || {
        let store = ctx.store.as_ref();
        Ok(AnalyticsResponse {
            priority: dashboard::priority_counts(store)?,
            top_symptoms: dashboard::symptom_frequencies(store, ANALYTICS_TOP_SYMPTOMS)?,
            hospitals: dashboard::hospital_distribution(store)?,
        })
    })
    .await?;
    Ok(Json(response))
}
