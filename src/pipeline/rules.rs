//! Versioned triage rule table.
//!
//! A symptom matches a high-severity phrase when its normalized form
//! (lower-cased, inner whitespace collapsed, trimmed) equals the phrase's
//! normalized form. Any match yields `match_score`, otherwise
//! `default_score`.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid rules JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid rule table: {0}")]
    Invalid(String),
}

/// How the triage score is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Rule table only.
    Rules,
    /// Rule table; when no phrase matches, the generator is asked for an
    /// urgency number and that number becomes the score.
    ModelAssisted,
}

impl std::str::FromStr for ScoringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rules" => Ok(Self::Rules),
            "model_assisted" | "model-assisted" => Ok(Self::ModelAssisted),
            other => Err(format!("unknown scoring mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageRules {
    pub version: String,
    pub high_risk_phrases: Vec<String>,
    pub match_score: f64,
    pub default_score: f64,
}

impl Default for TriageRules {
    fn default() -> Self {
        Self {
            version: "2025-03-default".to_string(),
            high_risk_phrases: vec![
                "chest pain".to_string(),
                "chest-pain".to_string(),
                "chestpain".to_string(),
            ],
            match_score: 0.9,
            default_score: 0.5,
        }
    }
}

/// Lower-case, collapse inner whitespace, trim.
pub fn normalize_symptom(symptom: &str) -> String {
    WHITESPACE
        .replace_all(symptom.trim(), " ")
        .to_lowercase()
}

impl TriageRules {
    /// Load and validate a rule table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let raw = std::fs::read_to_string(path)?;
        let rules: TriageRules = serde_json::from_str(&raw)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        if self.version.trim().is_empty() {
            return Err(RulesError::Invalid("version must not be empty".into()));
        }
        if self.high_risk_phrases.iter().all(|p| p.trim().is_empty()) {
            return Err(RulesError::Invalid("at least one high-risk phrase is required".into()));
        }
        for (name, score) in [("match_score", self.match_score), ("default_score", self.default_score)] {
            if !(0.0..=1.0).contains(&score) {
                return Err(RulesError::Invalid(format!("{name} {score} is outside [0, 1]")));
            }
        }
        Ok(())
    }

    /// Whether a single symptom is one of the high-risk phrases.
    pub fn matches(&self, symptom: &str) -> bool {
        let normalized = normalize_symptom(symptom);
        self.high_risk_phrases
            .iter()
            .any(|phrase| normalize_symptom(phrase) == normalized)
    }

    pub fn any_match(&self, symptoms: &[String]) -> bool {
        symptoms.iter().any(|s| self.matches(s))
    }

    pub fn score(&self, symptoms: &[String]) -> f64 {
        if self.any_match(symptoms) {
            self.match_score
        } else {
            self.default_score
        }
    }
}
