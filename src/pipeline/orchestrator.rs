//! Triage flow orchestrator.
//!
//! Drives a submission through the fixed stage order:
//! ingest → triage → allocate → persist derived fields.
//!
//! External services enter through `TextGenerator` and `HospitalSearch`
//! so the whole flow runs against mocks in tests.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use super::allocation::ResourceAllocationNode;
use super::cohere::CohereClient;
use super::generation::TextGenerator;
use super::ingestion::DataIngestionNode;
use super::overpass::OverpassSearch;
use super::places::PlacesSearch;
use super::rules::{ScoringMode, TriageRules};
use super::search::HospitalSearch;
use super::triage::TriageNode;
use super::PipelineError;
use crate::config::{AppConfig, SearchBackend, DEFAULT_LOCATION};
use crate::db::DocumentStore;
use crate::models::{GeoPoint, HospitalCandidate, PatientRecord, Priority, ScoreSource};

const CLIENT_INIT_ATTEMPTS: u32 = 3;
const CLIENT_INIT_DELAY: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Settings and result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub rules: TriageRules,
    pub scoring_mode: ScoringMode,
    pub default_location: GeoPoint,
    pub search_radius_m: u32,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            rules: TriageRules::default(),
            scoring_mode: ScoringMode::Rules,
            default_location: DEFAULT_LOCATION,
            search_radius_m: 5000,
        }
    }
}

impl FlowSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            rules: config.rules.clone(),
            scoring_mode: config.scoring_mode,
            default_location: config.default_location,
            search_radius_m: config.search_radius_m,
        }
    }
}

/// Returned to the caller after a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct TriageOutcome {
    pub record: PatientRecord,
    pub priority: Priority,
    pub rules_version: String,
    pub hospital: Option<HospitalCandidate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RescoreReport {
    pub examined: usize,
    pub updated: usize,
    /// Scores taken from the generator; the rule table does not override them.
    pub skipped: usize,
}

// ---------------------------------------------------------------------------
// TriageFlow
// ---------------------------------------------------------------------------

pub struct TriageFlow {
    store: Arc<dyn DocumentStore>,
    ingestion: DataIngestionNode,
    triage: TriageNode,
    allocation: ResourceAllocationNode,
}

impl TriageFlow {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn TextGenerator>,
        search: Arc<dyn HospitalSearch>,
        settings: FlowSettings,
    ) -> Self {
        Self {
            ingestion: DataIngestionNode::new(store.clone()),
            triage: TriageNode::new(generator, settings.rules, settings.scoring_mode),
            allocation: ResourceAllocationNode::new(
                search,
                settings.default_location,
                settings.search_radius_m,
            ),
            store,
        }
    }

    pub fn rules(&self) -> &TriageRules {
        self.triage.rules()
    }

    /// Run one submission through every stage.
    ///
    /// The first failing stage aborts the run. Writes made by earlier
    /// stages stay in the store.
    pub fn run(&self, candidate: Value) -> Result<TriageOutcome, PipelineError> {
        let ingested = self.ingestion.process(candidate)?;
        let assessment = self.triage.process(&ingested)?;
        let allocation = self.allocation.process(&ingested);

        let mut fields = Map::new();
        fields.insert("triage_score".into(), Value::from(assessment.triage_score));
        fields.insert(
            "score_source".into(),
            Value::String(assessment.score_source.as_str().to_string()),
        );
        fields.insert(
            "rules_version".into(),
            Value::String(assessment.rules_version.clone()),
        );
        fields.insert(
            "symptom_summary".into(),
            Value::String(assessment.symptom_summary.clone()),
        );
        fields.insert(
            "symptom_categories".into(),
            serde_json::to_value(&assessment.symptom_categories)?,
        );
        fields.insert(
            "recommended_hospital".into(),
            Value::String(allocation.recommended_hospital.clone()),
        );

        let record = self.ingestion.merge_fields(&ingested.patient_id, fields)?;
        tracing::info!(
            patient_id = %record.patient_id,
            priority = assessment.priority.as_str(),
            hospital = %allocation.recommended_hospital,
            "Triage flow completed"
        );

        Ok(TriageOutcome {
            record,
            priority: assessment.priority,
            rules_version: assessment.rules_version,
            hospital: allocation.hospital,
        })
    }

    /// Re-apply the current rule table to every stored patient.
    ///
    /// Scores produced by the generator are left alone. Only documents whose
    /// rule score changes are written back.
    pub fn rescore_all(&self) -> Result<RescoreReport, PipelineError> {
        let mut report = RescoreReport::default();
        let rules = self.rules();

        for patient in self.store.list_patients()? {
            report.examined += 1;
            if patient.score_source == Some(ScoreSource::Model) {
                report.skipped += 1;
                continue;
            }

            let score = rules.score(&patient.symptoms);
            if patient.triage_score == Some(score) {
                continue;
            }

            let mut fields = Map::new();
            fields.insert("triage_score".into(), Value::from(score));
            fields.insert(
                "score_source".into(),
                Value::String(ScoreSource::Rules.as_str().to_string()),
            );
            fields.insert("rules_version".into(), Value::String(rules.version.clone()));
            self.store.upsert_patient(&patient.patient_id, fields)?;
            report.updated += 1;
            tracing::debug!(
                patient_id = %patient.patient_id,
                old = ?patient.triage_score,
                new = score,
                "Triage score corrected"
            );
        }

        tracing::info!(
            examined = report.examined,
            updated = report.updated,
            skipped = report.skipped,
            rules_version = %rules.version,
            "Rescore finished"
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Construction from configuration
// ---------------------------------------------------------------------------

fn with_retry<T, E, F>(what: &str, mut build: F) -> Result<T, PipelineError>
where
    E: std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    let mut attempt = 1;
    loop {
        match build() {
            Ok(client) => return Ok(client),
            Err(e) if attempt < CLIENT_INIT_ATTEMPTS => {
                tracing::warn!(client = what, attempt, error = %e, "Client initialization failed, retrying");
                thread::sleep(CLIENT_INIT_DELAY);
                attempt += 1;
            }
            Err(e) => {
                return Err(PipelineError::ClientInit(format!(
                    "{what} after {attempt} attempts: {e}"
                )))
            }
        }
    }
}

/// Build a `TriageFlow` with live Cohere and hospital-search clients.
///
/// Blocking HTTP clients are built here, so call this outside any async
/// runtime.
pub fn build_flow(config: &AppConfig, store: Arc<dyn DocumentStore>) -> Result<TriageFlow, PipelineError> {
    let generator = with_retry("cohere", || {
        CohereClient::new(&config.cohere_api_key, &config.cohere_model)
    })?;

    let search: Arc<dyn HospitalSearch> = match config.search_backend {
        SearchBackend::Places => Arc::new(with_retry("places", || PlacesSearch::new(&config.maps_api_key))?),
        SearchBackend::Overpass => Arc::new(with_retry("overpass", OverpassSearch::new)?),
    };

    tracing::info!(
        backend = ?config.search_backend,
        model = %config.cohere_model,
        scoring_mode = ?config.scoring_mode,
        "Triage flow ready"
    );

    Ok(TriageFlow::new(
        store,
        Arc::new(generator),
        search,
        FlowSettings::from_config(config),
    ))
}
