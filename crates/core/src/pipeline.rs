use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::{info, warn};

use crate::{
    analyzer,
    assembler::ReportWriter,
    config::Config,
    error::{ReportError, Result},
    fallback::{FallbackInvoker, GenerationRequest},
    frames::{FrameExtractor, VideoDecoder},
    layout::OutputLayout,
    provider::{ResponseFormat, VlmProvider},
    reporter::{self, compose_failed_section},
    types::{ExtractedFrame, ReportStructure, Section, SectionContent, VideoResource},
    upload::UploadTracker,
};

/// Progress callbacks. Every method defaults to doing nothing.
#[allow(unused_variables)]
pub trait PipelineObserver {
    fn upload_started(&mut self, path: &Path) {}
    fn video_ready(&mut self, video: &VideoResource) {}
    fn structure_ready(&mut self, structure: &ReportStructure) {}
    fn section_started(&mut self, index: usize, total: usize, section: &Section) {}
    fn frame_failed(&mut self, section: &Section, error: &ReportError) {}
    fn section_finished(&mut self, index: usize, total: usize, content: &SectionContent) {}
}

pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub title: String,
    pub report_path: PathBuf,
    pub sections: usize,
    pub failed_sections: Vec<u32>,
    pub screenshots: Vec<ExtractedFrame>,
}

/// Settings the pipeline reads from [`Config`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub models: Vec<String>,
    pub language: String,
    pub include_screenshots: bool,
    pub layout: OutputLayout,
    pub poll_interval: Duration,
    /// Pause after each successful section except the last; skipped after a failed one.
    pub section_delay: Duration,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            models: config.models(),
            language: config.report.language.clone(),
            include_screenshots: config.report.include_screenshots,
            layout: config.layout(),
            poll_interval: config.poll_interval(),
            section_delay: config.section_delay(),
        }
    }
}

/// Upload, analyze, then illustrate and narrate each section into one document.
pub struct ReportPipeline<P: VlmProvider, D: VideoDecoder> {
    provider: P,
    decoder: D,
    settings: PipelineSettings,
}

impl<P: VlmProvider, D: VideoDecoder> ReportPipeline<P, D> {
    pub fn new(provider: P, decoder: D, settings: PipelineSettings) -> Self {
        Self {
            provider,
            decoder,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn run<O: PipelineObserver>(
        &self,
        video_path: &Path,
        observer: &mut O,
    ) -> Result<ReportSummary> {
        if !video_path.exists() {
            return Err(ReportError::InputNotFound {
                path: video_path.to_path_buf(),
            });
        }

        observer.upload_started(video_path);
        let video = UploadTracker::new(&self.provider, self.settings.poll_interval)
            .upload_and_wait(video_path)
            .await?;
        observer.video_ready(&video);

        let structure = analyzer::analyze(
            &self.provider,
            &video,
            &self.settings.models,
            &self.settings.language,
        )
        .await?;
        observer.structure_ready(&structure);

        let report_path = self.settings.layout.report_path();
        let writer = ReportWriter::init(&report_path, &structure.title).await?;

        let total = structure.sections.len();
        let mut failed_sections = Vec::new();
        let mut screenshots = Vec::new();

        for (index, section) in structure.sections.iter().enumerate() {
            observer.section_started(index, total, section);

            let frame = if self.settings.include_screenshots {
                self.capture(video_path, section, observer).await
            } else {
                None
            };

            let content = match reporter::report(
                &self.provider,
                &video,
                &self.settings.models,
                section,
                frame.as_ref(),
                &self.settings.language,
            )
            .await
            {
                Ok(content) => content,
                Err(e) => {
                    warn!(section = section.id, error = %e, "section failed, continuing");
                    failed_sections.push(section.id);
                    compose_failed_section(section, frame.as_ref(), &e)
                }
            };

            writer.append_section(&content).await?;
            observer.section_finished(index, total, &content);

            let is_last = index + 1 == total;
            if !content.failed && !is_last && !self.settings.section_delay.is_zero() {
                tokio::time::sleep(self.settings.section_delay).await;
            }

            screenshots.extend(frame);
        }

        info!(
            path = %report_path.display(),
            sections = total,
            failed = failed_sections.len(),
            "report complete"
        );

        Ok(ReportSummary {
            title: structure.title,
            report_path,
            sections: total,
            failed_sections,
            screenshots,
        })
    }

    async fn capture<O: PipelineObserver>(
        &self,
        video_path: &Path,
        section: &Section,
        observer: &mut O,
    ) -> Option<ExtractedFrame> {
        let extractor = FrameExtractor::new(&self.decoder, &self.settings.layout);
        match extractor.extract_for_section(video_path, section).await {
            Ok(frame) => frame,
            Err(source) => {
                let error = ReportError::FrameExtractionFailed {
                    section_id: section.id,
                    timestamp: section.screenshot_timestamp.clone().unwrap_or_default(),
                    source,
                };
                warn!(error = %error, "continuing without screenshot");
                observer.frame_failed(section, &error);
                None
            }
        }
    }
}

/// Upload a video and produce a single free-form summary of it.
pub async fn summarize<P: VlmProvider + ?Sized>(
    provider: &P,
    video_path: &Path,
    models: &[String],
    language: &str,
    poll_interval: Duration,
) -> Result<String> {
    if !video_path.exists() {
        return Err(ReportError::InputNotFound {
            path: video_path.to_path_buf(),
        });
    }

    let video = UploadTracker::new(provider, poll_interval)
        .upload_and_wait(video_path)
        .await?;

    let prompt = format!("Summarize the content of this video in detail, in {language}.");
    FallbackInvoker::new(provider)
        .invoke(
            models,
            GenerationRequest {
                video: &video,
                prompt: &prompt,
                format: ResponseFormat::Text,
            },
        )
        .await
        .map_err(ReportError::SummaryFailed)
}
