use std::collections::HashSet;

use tracing::info;

use crate::{
    error::{ReportError, Result},
    fallback::{FallbackInvoker, GenerationRequest},
    format::{parse_timestamp, strip_code_fence},
    provider::{ResponseFormat, VlmProvider},
    types::{ReportStructure, VideoResource},
};

fn structure_prompt(language: &str) -> String {
    format!(
        r#"You are analyzing a screen recording of someone's work session in order to write a work report.

IMPORTANT: Write the title and all section titles and reasons in {language}.

TASK:
1. Give the whole recording a short, descriptive report title.
2. Split the recording into sequential sections that follow the flow of the work. Aim for roughly 3-5 minutes of video per section, but prefer natural boundaries between tasks.
3. For every section choose ONE moment whose screenshot best illustrates what was done, and explain briefly why.

OUTPUT: Return ONLY valid JSON matching this structure (no markdown, no explanation):
{{
  "title": "Report title",
  "sections": [
    {{
      "id": 1,
      "title": "Section title",
      "start_time": "MM:SS",
      "end_time": "MM:SS",
      "screenshot_timestamp": "MM:SS",
      "screenshot_reason": "Why this moment is representative"
    }}
  ]
}}

RULES:
- Timestamps are MM:SS, or HH:MM:SS for recordings longer than an hour
- ids start at 1 and increase by one
- Sections are in chronological order and together cover the whole recording"#
    )
}

/// Parse and validate a structure response.
pub fn parse_structure(text: &str) -> std::result::Result<ReportStructure, String> {
    let structure: ReportStructure =
        serde_json::from_str(strip_code_fence(text)).map_err(|e| format!("malformed JSON: {e}"))?;

    let mut ids = HashSet::new();
    for section in &structure.sections {
        if !ids.insert(section.id) {
            return Err(format!("duplicate section id {}", section.id));
        }
        for timestamp in [&section.start_time, &section.end_time] {
            parse_timestamp(timestamp)
                .map_err(|e| format!("section {}: {e}", section.id))?;
        }
    }

    Ok(structure)
}

/// Phase 1: decompose the recording into titled sections.
pub async fn analyze<P: VlmProvider + ?Sized>(
    provider: &P,
    video: &VideoResource,
    models: &[String],
    language: &str,
) -> Result<ReportStructure> {
    let prompt = structure_prompt(language);
    let request = GenerationRequest {
        video,
        prompt: &prompt,
        format: ResponseFormat::Json,
    };

    let structure = FallbackInvoker::new(provider)
        .invoke_parsed(models, request, parse_structure)
        .await
        .map_err(ReportError::StructureAnalysisFailed)?;

    info!(
        title = %structure.title,
        sections = structure.sections.len(),
        "structure analyzed"
    );
    Ok(structure)
}
