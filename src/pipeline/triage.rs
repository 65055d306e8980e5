//! Triage stage: rule-table score plus a generated symptom summary.

use std::sync::Arc;

use serde::Serialize;

use super::generation::{GenerationParams, TextGenerator};
use super::preprocess::categorize_symptoms;
use super::prompt::{build_summary_prompt, build_urgency_prompt};
use super::rules::{ScoringMode, TriageRules};
use super::PipelineError;
use crate::models::{PatientRecord, Priority, ScoreSource, SymptomCategories};

const SUMMARY_PARAMS: GenerationParams = GenerationParams {
    max_tokens: 50,
    temperature: 0.75,
};

const URGENCY_PARAMS: GenerationParams = GenerationParams {
    max_tokens: 100,
    temperature: 0.3,
};

/// Output fragment of the triage stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriageAssessment {
    pub triage_score: f64,
    pub score_source: ScoreSource,
    pub priority: Priority,
    pub symptom_summary: String,
    pub symptom_categories: SymptomCategories,
    pub rules_version: String,
}

pub struct TriageNode {
    generator: Arc<dyn TextGenerator>,
    rules: TriageRules,
    mode: ScoringMode,
}

/// Parse a bare urgency reply. No fallback: anything but a number in
/// [0, 1] is an error.
pub fn parse_urgency(reply: &str) -> Result<f64, PipelineError> {
    let trimmed = reply.trim();
    match trimmed.parse::<f64>() {
        Ok(score) if (0.0..=1.0).contains(&score) => Ok(score),
        _ => Err(PipelineError::MalformedUrgency(trimmed.to_string())),
    }
}

impl TriageNode {
    pub fn new(generator: Arc<dyn TextGenerator>, rules: TriageRules, mode: ScoringMode) -> Self {
        Self {
            generator,
            rules,
            mode,
        }
    }

    pub fn rules(&self) -> &TriageRules {
        &self.rules
    }

    pub fn process(&self, record: &PatientRecord) -> Result<TriageAssessment, PipelineError> {
        let symptoms = &record.symptoms;

        let matched = self.rules.any_match(symptoms);
        let mut triage_score = self.rules.score(symptoms);
        let mut score_source = ScoreSource::Rules;

        if self.mode == ScoringMode::ModelAssisted && !matched {
            let reply = self
                .generator
                .generate(&build_urgency_prompt(symptoms), &URGENCY_PARAMS)?;
            triage_score = parse_urgency(&reply)?;
            score_source = ScoreSource::Model;
            tracing::debug!(patient_id = %record.patient_id, triage_score, "Urgency taken from generator");
        }

        let symptom_summary = self
            .generator
            .generate(&build_summary_prompt(symptoms), &SUMMARY_PARAMS)?
            .trim()
            .to_string();

        let priority = Priority::from_score(triage_score);
        tracing::info!(
            patient_id = %record.patient_id,
            triage_score,
            priority = priority.as_str(),
            rules_version = %self.rules.version,
            "Triage assigned"
        );

        Ok(TriageAssessment {
            triage_score,
            score_source,
            priority,
            symptom_summary,
            symptom_categories: categorize_symptoms(symptoms),
            rules_version: self.rules.version.clone(),
        })
    }
}
