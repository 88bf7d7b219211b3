//! Workreport Core Library
//!
//! Turns a screen recording into an illustrated markdown work report using a
//! remote vision-language model: structure analysis, per-section screenshots and
//! per-section narrative, written incrementally to one document.

pub mod analyzer;
pub mod assembler;
pub mod config;
pub mod error;
pub mod fallback;
pub mod format;
pub mod frames;
pub mod gemini;
pub mod layout;
pub mod pipeline;
pub mod provider;
pub mod reporter;
pub mod timelapse;
pub mod types;
pub mod upload;

// Re-export commonly used items at crate root
pub use assembler::ReportWriter;
pub use config::{Config, ReportOptions, load_config};
pub use error::{ReportError, Result};
pub use fallback::{FallbackError, FallbackInvoker, GenerationRequest};
pub use format::{format_timestamp, parse_timestamp, safe_timestamp};
pub use frames::{FfmpegDecoder, FrameError, FrameExtractor, VideoDecoder};
pub use gemini::GeminiClient;
pub use layout::OutputLayout;
pub use pipeline::{
    NoopObserver, PipelineObserver, PipelineSettings, ReportPipeline, ReportSummary, summarize,
};
pub use provider::{ProviderError, ResponseFormat, VlmProvider};
pub use types::{
    ExtractedFrame, FileState, ReportStructure, Section, SectionContent, VideoResource,
};
pub use upload::UploadTracker;
