/// HTTP backend for the text-generation model.
///
/// Speaks the Hugging Face inference protocol for text2text models:
/// `{"inputs": ..., "parameters": {...}}` in, `[{"generated_text": ...}]` out.
/// Exactly one request per call; failures are returned, never retried.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::generation::{GenerationError, TextGenerator};

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_length: u32,
    num_return_sequences: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Failure(InferenceFailure),
    Batch(Vec<Completion>),
    Single(Completion),
}

#[derive(Debug, Deserialize)]
struct Completion {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct InferenceFailure {
    error: String,
    #[serde(default)]
    estimated_time: Option<f64>,
}

impl InferenceFailure {
    fn into_error(self, status: u16) -> GenerationError {
        // The inference server answers 503 + estimated_time while weights load.
        if self.estimated_time.is_some() || status == 503 {
            GenerationError::ModelNotLoaded {
                message: self.error,
                estimated_time: self.estimated_time,
            }
        } else {
            GenerationError::Api {
                status,
                message: self.error,
            }
        }
    }
}

#[derive(Clone)]
pub struct HttpTextGenerator {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpTextGenerator {
    pub fn new(url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url,
            api_key,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(
        &self,
        prompt: &str,
        max_output_length: u32,
    ) -> Result<String, GenerationError> {
        let body = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_length: max_output_length,
                num_return_sequences: 1,
            },
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        debug!("Model responded with status {status} ({} bytes)", text.len());
        parse_completion(status, &text)
    }
}

/// Interprets an inference response body.
fn parse_completion(status: u16, body: &str) -> Result<String, GenerationError> {
    if !(200..300).contains(&status) {
        warn!("Model returned {status}: {body}");
        return Err(match serde_json::from_str::<InferenceFailure>(body) {
            Ok(failure) => failure.into_error(status),
            Err(_) => GenerationError::Api {
                status,
                message: body.to_string(),
            },
        });
    }

    match serde_json::from_str::<InferenceResponse>(body)? {
        InferenceResponse::Failure(failure) => Err(failure.into_error(status)),
        InferenceResponse::Batch(completions) => completions
            .into_iter()
            .next()
            .map(|c| c.generated_text)
            .ok_or(GenerationError::EmptyCompletion),
        InferenceResponse::Single(completion) => Ok(completion.generated_text),
    }
}
