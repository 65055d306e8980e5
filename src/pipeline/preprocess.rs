//! Record clean-up applied before a patient is stored or scored.

use std::collections::BTreeMap;

use crate::models::{SymptomCategories, VitalValue};

const SEVERE_SYMPTOMS: &[&str] = &[
    "chest pain",
    "difficulty breathing",
    "shortness of breath",
    "severe bleeding",
    "unconscious",
    "unresponsive",
    "seizure",
];

const MODERATE_SYMPTOMS: &[&str] = &[
    "fever",
    "vomiting",
    "dizziness",
    "moderate pain",
    "headache",
    "abdominal pain",
    "dehydration",
];

/// Readings above this are assumed to be Fahrenheit.
const FAHRENHEIT_CUTOFF: f64 = 50.0;

/// Trim entries and drop blanks (a form splitting "a, ,b" yields one).
pub fn clean_symptoms(symptoms: Vec<String>) -> Vec<String> {
    symptoms
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn split_blood_pressure(raw: &str) -> Option<(f64, f64)> {
    let (systolic, diastolic) = raw.split_once('/')?;
    let systolic: u32 = systolic.trim().parse().ok()?;
    let diastolic: u32 = diastolic.trim().parse().ok()?;
    Some((systolic as f64, diastolic as f64))
}

/// Normalize vitals to standard units.
///
/// - `blood_pressure: "120/80"` becomes `systolic_bp` and `diastolic_bp`;
///   anything unparsable is kept verbatim.
/// - a numeric `temperature` above 50 is converted from Fahrenheit to
///   Celsius, rounded to one decimal.
pub fn normalize_vitals(vitals: BTreeMap<String, VitalValue>) -> BTreeMap<String, VitalValue> {
    let mut normalized = BTreeMap::new();

    for (key, value) in vitals {
        match (key.as_str(), &value) {
            ("blood_pressure", VitalValue::Text(raw)) => match split_blood_pressure(raw) {
                Some((systolic, diastolic)) => {
                    normalized.insert("systolic_bp".to_string(), VitalValue::Number(systolic));
                    normalized.insert("diastolic_bp".to_string(), VitalValue::Number(diastolic));
                }
                None => {
                    normalized.insert(key, value);
                }
            },
            ("temperature", VitalValue::Number(t)) if *t > FAHRENHEIT_CUTOFF => {
                let celsius = ((t - 32.0) * 5.0 / 9.0 * 10.0).round() / 10.0;
                normalized.insert(key, VitalValue::Number(celsius));
            }
            _ => {
                normalized.insert(key, value);
            }
        }
    }

    normalized
}

/// Group symptoms by severity keyword (substring match, case-insensitive).
///
/// A symptom may appear under both severe and moderate; mild holds the
/// symptoms matching neither list.
pub fn categorize_symptoms(symptoms: &[String]) -> SymptomCategories {
    let mut categories = SymptomCategories::default();

    for symptom in symptoms {
        let lowered = symptom.to_lowercase();
        let severe = SEVERE_SYMPTOMS.iter().any(|k| lowered.contains(k));
        let moderate = MODERATE_SYMPTOMS.iter().any(|k| lowered.contains(k));

        if severe {
            categories.severe.push(symptom.clone());
        }
        if moderate {
            categories.moderate.push(symptom.clone());
        }
        if !severe && !moderate {
            categories.mild.push(symptom.clone());
        }
    }

    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals(pairs: &[(&str, VitalValue)]) -> BTreeMap<String, VitalValue> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn blank_symptoms_dropped() {
        let cleaned = clean_symptoms(vec![" cough ".into(), "".into(), "  ".into(), "fever".into()]);
        assert_eq!(cleaned, vec!["cough".to_string(), "fever".to_string()]);
    }

    #[test]
    fn blood_pressure_split() {
        let out = normalize_vitals(vitals(&[("blood_pressure", VitalValue::Text("140/90".into()))]));
        assert_eq!(out["systolic_bp"], VitalValue::Number(140.0));
        assert_eq!(out["diastolic_bp"], VitalValue::Number(90.0));
        assert!(!out.contains_key("blood_pressure"));
    }

    #[test]
    fn unparsable_blood_pressure_kept() {
        let out = normalize_vitals(vitals(&[("blood_pressure", VitalValue::Text("high".into()))]));
        assert_eq!(out["blood_pressure"], VitalValue::Text("high".into()));
    }

    #[test]
    fn numeric_blood_pressure_kept() {
        let out = normalize_vitals(vitals(&[("blood_pressure", VitalValue::Number(120.0))]));
        assert_eq!(out["blood_pressure"], VitalValue::Number(120.0));
    }

    #[test]
    fn fahrenheit_converted() {
        let out = normalize_vitals(vitals(&[("temperature", VitalValue::Number(101.3))]));
        assert_eq!(out["temperature"], VitalValue::Number(38.5));
    }

    #[test]
    fn celsius_untouched() {
        let out = normalize_vitals(vitals(&[("temperature", VitalValue::Number(37.8))]));
        assert_eq!(out["temperature"], VitalValue::Number(37.8));
    }

    #[test]
    fn categorization() {
        let cats = categorize_symptoms(&[
            "Chest Pain".into(),
            "Severe headache".into(),
            "Nausea".into(),
        ]);
        assert_eq!(cats.severe, vec!["Chest Pain".to_string()]);
        assert_eq!(cats.moderate, vec!["Severe headache".to_string()]);
        assert_eq!(cats.mild, vec!["Nausea".to_string()]);
    }
}
