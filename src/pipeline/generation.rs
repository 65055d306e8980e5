//! Text-generation capability used for symptom summaries and urgency replies.

use std::sync::Mutex;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation API unreachable at {0}")]
    Connection(String),

    #[error("Generation API returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Generation API returned no completions")]
    EmptyCompletion,
}

/// Sampling settings for a single-turn request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Hosted language model abstraction (allows mocking).
pub trait TextGenerator: Send + Sync {
    /// Send `prompt` and return the first completion.
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, GenerationError>;
}

/// Mock generator for testing. Replays scripted replies in order and keeps
/// repeating the last one; records every prompt it receives.
pub struct MockTextGenerator {
    replies: Vec<Result<String, String>>,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    pub fn new(response: &str) -> Self {
        Self::scripted(&[response])
    }

    pub fn scripted(responses: &[&str]) -> Self {
        Self {
            replies: responses.iter().map(|r| Ok(r.to_string())).collect(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with an HTTP client error.
    pub fn failing(message: &str) -> Self {
        Self {
            replies: vec![Err(message.to_string())],
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl TextGenerator for MockTextGenerator {
    fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<String, GenerationError> {
        let call_index = {
            let mut prompts = self
                .prompts
                .lock()
                .map_err(|_| GenerationError::HttpClient("mock lock poisoned".into()))?;
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };

        let reply = self
            .replies
            .get(call_index)
            .or_else(|| self.replies.last())
            .ok_or(GenerationError::EmptyCompletion)?;

        match reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(GenerationError::HttpClient(message.clone())),
        }
    }
}
