use std::path::Path;

use async_trait::async_trait;

use crate::types::VideoResource;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Invalid API response: {reason}")]
    InvalidResponse { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Shape the caller expects back from a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    Json,
}

/// A remote vision-language service able to ingest a video and answer prompts about it.
#[async_trait]
pub trait VlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Upload a local video. The returned resource is usually still processing.
    async fn upload(&self, path: &Path) -> Result<VideoResource, ProviderError>;

    /// Fetch the current state of an uploaded resource.
    async fn get_state(&self, resource: &VideoResource) -> Result<VideoResource, ProviderError>;

    async fn generate(
        &self,
        model: &str,
        video: &VideoResource,
        prompt: &str,
        format: ResponseFormat,
    ) -> Result<String, ProviderError>;
}

/// Read an API key from the environment
pub fn api_key_from_env(env_var: &str) -> Result<String, ProviderError> {
    std::env::var(env_var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| ProviderError::MissingApiKey {
            env_var: env_var.to_string(),
        })
}

/// Best-effort MIME type for an uploaded video, based on its extension.
pub fn video_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mpeg" | "mpg" => "video/mpeg",
        _ => "video/mp4",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(video_mime_type(Path::new("a/b.MOV")), "video/quicktime");
        assert_eq!(video_mime_type(Path::new("rec.mkv")), "video/x-matroska");
        assert_eq!(video_mime_type(Path::new("rec.mp4")), "video/mp4");
        assert_eq!(video_mime_type(Path::new("noext")), "video/mp4");
    }

    #[test]
    fn missing_api_key_is_reported_by_name() {
        let err = api_key_from_env("WORKREPORT_TEST_UNSET_KEY").unwrap_err();
        assert!(matches!(
            err,
            ProviderError::MissingApiKey { ref env_var } if env_var == "WORKREPORT_TEST_UNSET_KEY"
        ));
    }
}
