use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::generation::{GenerationError, GenerationParams, TextGenerator};

const COHERE_BASE_URL: &str = "https://api.cohere.ai";
const COHERE_TIMEOUT_SECS: u64 = 30;

/// Cohere `generate` client.
pub struct CohereClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl CohereClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self, GenerationError> {
        Self::with_base_url(COHERE_BASE_URL, api_key, model)
    }

    /// Point the client at a different host (proxies, test servers).
    pub fn with_base_url(base_url: &str, api_key: &str, model: &str) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(COHERE_TIMEOUT_SECS))
            .build()
            .map_err(|e| GenerationError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
        })
    }
}

/// Request body for /v1/generate
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

/// Response body from /v1/generate
#[derive(Deserialize)]
struct GenerateResponse {
    generations: Vec<Generation>,
}

#[derive(Deserialize)]
struct Generation {
    text: String,
}

fn first_completion(response: GenerateResponse) -> Result<String, GenerationError> {
    response
        .generations
        .into_iter()
        .next()
        .map(|g| g.text)
        .ok_or(GenerationError::EmptyCompletion)
}

impl TextGenerator for CohereClient {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, GenerationError> {
        let url = format!("{}/v1/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    GenerationError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    GenerationError::HttpClient(format!(
                        "Request timed out after {COHERE_TIMEOUT_SECS}s"
                    ))
                } else {
                    GenerationError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| GenerationError::ResponseParsing(e.to_string()))?;

        first_completion(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cohere_client_trims_trailing_slash() {
        let client = CohereClient::with_base_url("https://api.cohere.ai/", "k", "command").unwrap();
        assert_eq!(client.base_url, "https://api.cohere.ai");
        assert_eq!(client.model, "command");
    }

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest {
            model: "command",
            prompt: "hello",
            max_tokens: 50,
            temperature: 0.3,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "command");
        assert_eq!(json["max_tokens"], 50);
        assert!(json.get("stream").is_none());
    }

    #[test]
    fn first_completion_is_taken_verbatim() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"id":"x","generations":[{"id":"a","text":" First. "},{"id":"b","text":"Second"}]}"#,
        )
        .unwrap();
        assert_eq!(first_completion(parsed).unwrap(), " First. ");
    }

    #[test]
    fn no_generations_is_an_error() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"generations":[]}"#).unwrap();
        assert!(matches!(
            first_completion(parsed),
            Err(GenerationError::EmptyCompletion)
        ));
    }

    #[test]
    fn unreachable_host_is_connection_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = CohereClient::with_base_url("http://127.0.0.1:9", "k", "command").unwrap();
        let params = GenerationParams { max_tokens: 5, temperature: 0.0 };
        let err = client.generate("hi", &params).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Connection(_) | GenerationError::HttpClient(_)
        ));
    }
}
