use std::path::PathBuf;

use thiserror::Error;

use crate::{fallback::FallbackError, frames::FrameError, provider::ProviderError};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Video not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Missing API key: {env_var} environment variable is not set")]
    AuthMissing { env_var: String },

    #[error("Upload failed for {path}: {reason}")]
    UploadFailed { path: PathBuf, reason: String },

    #[error("Remote processing failed for {name}")]
    RemoteProcessingFailed { name: String },

    #[error("Structure analysis failed: {0}")]
    StructureAnalysisFailed(FallbackError),

    #[error("Frame extraction failed for section {section_id} at {timestamp}: {source}")]
    FrameExtractionFailed {
        section_id: u32,
        timestamp: String,
        #[source]
        source: FrameError,
    },

    #[error("Section {section_id} generation failed: {source}")]
    SectionGenerationFailed {
        section_id: u32,
        #[source]
        source: FallbackError,
    },

    #[error("Summary generation failed: {0}")]
    SummaryFailed(FallbackError),

    #[error("Timelapse conversion failed for {path}: {reason}")]
    TimelapseFailed { path: PathBuf, reason: String },

    #[error("Remote service error: {0}")]
    Provider(ProviderError),

    #[error("Config error in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<ProviderError> for ReportError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::MissingApiKey { env_var } => ReportError::AuthMissing { env_var },
            other => ReportError::Provider(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
