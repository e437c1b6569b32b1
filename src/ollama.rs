//! Ollama generation client.
//!
//! Sends `POST /api/generate` with `{model, prompt, stream, options}` and
//! maps every transport outcome onto [`AnswerError`]:
//!
//! | Outcome | Error |
//! |---------|-------|
//! | request exceeded the timeout | `GenerationTimeout` |
//! | connection refused / DNS failure | `GenerationUnavailable` |
//! | non-200 status | `GenerationError { status }` |
//! | 200 without a usable `response` field | `InvalidResponse` |
//!
//! With streaming enabled the response is newline-delimited JSON; the
//! `response` fragments are concatenated until a line reports `done`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use manual_qa_core::error::AnswerError;
use manual_qa_core::generate::{GenerationOptions, Generator};
use manual_qa_core::settings::QaSettings;

const GENERATE_PATH: &str = "/api/generate";
const TAGS_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: WireOptions,
}

#[derive(Serialize)]
struct WireOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

pub struct OllamaClient {
    client: reqwest::Client,
    url: String,
    model: String,
    options: GenerationOptions,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(settings: &QaSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: settings.endpoint_url.clone(),
            model: settings.model.clone(),
            options: settings.generation_options(),
            timeout: settings.timeout,
        })
    }

    /// Server root derived from the generate URL.
    pub fn base_url(&self) -> &str {
        self.url
            .strip_suffix(GENERATE_PATH)
            .unwrap_or(&self.url)
            .trim_end_matches('/')
    }

    /// Names of the models the server has installed (`GET /api/tags`).
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url());
        let response = self
            .client
            .get(&url)
            .timeout(TAGS_TIMEOUT)
            .send()
            .await
            .context("Failed to connect to Ollama")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to list Ollama models: {}", response.status());
        }

        let tags: TagsResponse = response
            .json()
            .await
            .context("Failed to parse models list")?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn transport_error(&self, e: reqwest::Error) -> AnswerError {
        if e.is_timeout() {
            AnswerError::GenerationTimeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            AnswerError::GenerationUnavailable(e.to_string())
        }
    }

    async fn read_stream(&self, response: reqwest::Response) -> Result<String, AnswerError> {
        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut text = String::new();

        while let Some(item) = stream.next().await {
            let bytes = item.map_err(|e| self.transport_error(e))?;
            buffer.extend_from_slice(&bytes);

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                if apply_stream_line(&line, &mut text)? {
                    return Ok(text);
                }
            }
        }

        // Final line without trailing newline.
        apply_stream_line(&buffer, &mut text)?;
        Ok(text)
    }
}

/// Append one NDJSON line to `text`. Returns true once the line says `done`.
fn apply_stream_line(line: &[u8], text: &mut String) -> Result<bool, AnswerError> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return Ok(false);
    }
    let chunk: GenerateChunk = serde_json::from_str(line)
        .map_err(|e| AnswerError::InvalidResponse(format!("bad stream line: {}", e)))?;
    if let Some(piece) = chunk.response {
        text.push_str(&piece);
    }
    Ok(chunk.done)
}

#[async_trait]
impl Generator for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, AnswerError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: self.options.stream,
            options: WireOptions {
                temperature: self.options.temperature,
                num_predict: self.options.max_tokens,
            },
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::error!(status = status.as_u16(), "generation endpoint returned an error");
            return Err(AnswerError::GenerationError {
                status: status.as_u16(),
            });
        }

        if self.options.stream {
            return self.read_stream(response).await;
        }

        let body: GenerateChunk = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                AnswerError::InvalidResponse(e.to_string())
            }
        })?;
        body.response
            .ok_or_else(|| AnswerError::InvalidResponse("missing response field".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_strips_generate_path() {
        let client = OllamaClient::new(&QaSettings::default()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_base_url_without_generate_path() {
        let settings = QaSettings {
            endpoint_url: "http://gpu-box:11434/".to_string(),
            ..QaSettings::default()
        };
        let client = OllamaClient::new(&settings).unwrap();
        assert_eq!(client.base_url(), "http://gpu-box:11434");
    }

    #[test]
    fn test_stream_lines_concatenate() {
        let mut text = String::new();
        assert!(!apply_stream_line(br#"{"response":"Hold ","done":false}"#, &mut text).unwrap());
        assert!(!apply_stream_line(b"  \n", &mut text).unwrap());
        assert!(apply_stream_line(br#"{"response":"the key.","done":true}"#, &mut text).unwrap());
        assert_eq!(text, "Hold the key.");
    }

    #[test]
    fn test_bad_stream_line_is_invalid_response() {
        let mut text = String::new();
        let err = apply_stream_line(b"not json", &mut text).unwrap_err();
        assert!(matches!(err, AnswerError::InvalidResponse(_)));
    }
}
