use std::{path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Response};
use tokio::fs;
use tracing::debug;

use crate::{
    provider::{ProviderError, ResponseFormat, VlmProvider, api_key_from_env, video_mime_type},
    types::VideoResource,
};

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
const API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Client for the Gemini Generative Language REST API
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, request_timeout: Duration) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            api_key,
            base_url: API_BASE.to_string(),
        })
    }

    /// Build a client with the key from `GOOGLE_API_KEY`.
    pub fn from_env(request_timeout: Duration) -> Result<Self, ProviderError> {
        let api_key = api_key_from_env(API_KEY_ENV)?;
        Self::new(api_key, request_timeout)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn start_upload(
        &self,
        path: &Path,
        mime_type: &str,
        size: usize,
    ) -> Result<String, ProviderError> {
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());

        let response = self
            .http
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let response = check_status(response).await?;

        response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::InvalidResponse {
                reason: "upload session has no x-goog-upload-url header".to_string(),
            })
    }
}

#[async_trait]
impl VlmProvider for GeminiClient {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn upload(&self, path: &Path) -> Result<VideoResource, ProviderError> {
        let bytes = fs::read(path).await?;
        let mime_type = video_mime_type(path);
        let upload_url = self.start_upload(path, mime_type, bytes.len()).await?;
        debug!(path = %path.display(), size = bytes.len(), "uploading video bytes");

        let response = self
            .http
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;
        let response = check_status(response).await?.json::<serde_json::Value>().await?;

        parse_file(&response["file"])
    }

    async fn get_state(&self, resource: &VideoResource) -> Result<VideoResource, ProviderError> {
        let response = self
            .http
            .get(format!("{}/v1beta/{}", self.base_url, resource.name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        let response = check_status(response).await?.json::<serde_json::Value>().await?;

        parse_file(&response)
    }

    async fn generate(
        &self,
        model: &str,
        video: &VideoResource,
        prompt: &str,
        format: ResponseFormat,
    ) -> Result<String, ProviderError> {
        let mut body = serde_json::json!({
            "contents": [{
                "parts": [
                    { "file_data": { "mime_type": video.mime_type, "file_uri": video.uri } },
                    { "text": prompt },
                ],
            }],
        });
        if format == ResponseFormat::Json {
            body["generationConfig"] = serde_json::json!({ "responseMimeType": "application/json" });
        }

        debug!(model, ?format, "generateContent");
        let response = self
            .http
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?.json::<serde_json::Value>().await?;

        extract_candidate_text(&response)
    }
}

async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::ApiError {
        status: status.as_u16(),
        body,
    })
}

fn parse_file(file: &serde_json::Value) -> Result<VideoResource, ProviderError> {
    let resource = VideoResource {
        name: file["name"].as_str().unwrap_or_default().to_string(),
        uri: file["uri"].as_str().unwrap_or_default().to_string(),
        mime_type: file["mimeType"].as_str().unwrap_or("video/mp4").to_string(),
        state: serde_json::from_value(file["state"].clone()).map_err(|_| {
            ProviderError::InvalidResponse {
                reason: format!("file has no usable state: {}", file),
            }
        })?,
    };
    if resource.name.is_empty() {
        return Err(ProviderError::InvalidResponse {
            reason: format!("file has no name: {}", file),
        });
    }
    Ok(resource)
}

/// Concatenate the text parts of the first candidate.
fn extract_candidate_text(response: &serde_json::Value) -> Result<String, ProviderError> {
    let text = response["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ProviderError::InvalidResponse {
            reason: match response["promptFeedback"]["blockReason"].as_str() {
                Some(reason) => format!("prompt blocked: {}", reason),
                None => format!("no candidate text in {}", response),
            },
        })?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::FileState;

    #[test]
    fn parses_file_resource() {
        let file = json!({
            "name": "files/abc123",
            "uri": "https://example.test/files/abc123",
            "mimeType": "video/quicktime",
            "state": "PROCESSING",
        });
        let resource = parse_file(&file).unwrap();
        assert_eq!(resource.name, "files/abc123");
        assert_eq!(resource.mime_type, "video/quicktime");
        assert_eq!(resource.state, FileState::Processing);
    }

    #[test]
    fn unspecified_state_is_pending() {
        let file = json!({ "name": "files/x", "uri": "u", "state": "STATE_UNSPECIFIED" });
        assert_eq!(parse_file(&file).unwrap().state, FileState::Pending);
    }

    #[test]
    fn file_without_name_is_rejected() {
        let file = json!({ "uri": "u", "state": "ACTIVE" });
        assert!(matches!(
            parse_file(&file),
            Err(ProviderError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn joins_candidate_text_parts() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hello, " }, { "text": "world" }] }
            }]
        });
        assert_eq!(extract_candidate_text(&response).unwrap(), "Hello, world");
    }

    #[test]
    fn blocked_prompt_is_invalid_response() {
        let response = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = extract_candidate_text(&response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
