/// Summary prompt for a symptom list.
pub fn build_summary_prompt(symptoms: &[String]) -> String {
    format!(
        "Summarize and prioritize these symptoms: {}.",
        symptoms.join(", ")
    )
}

/// Prompt asking for a bare urgency number in [0, 1].
pub fn build_urgency_prompt(symptoms: &[String]) -> String {
    format!(
        "You are a medical symptom analyzer. Given the symptoms, return ONLY a single number \
between 0 and 1 representing the urgency (1 = critical, 0 = non-urgent).
Do not include any other text, explanation, or punctuation in your response.

Symptoms: {}",
        symptoms.join(", ")
    )
}
