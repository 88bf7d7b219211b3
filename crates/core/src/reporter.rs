use tracing::info;

use crate::{
    error::{ReportError, Result},
    fallback::{FallbackInvoker, GenerationRequest},
    provider::{ResponseFormat, VlmProvider},
    types::{ExtractedFrame, Section, SectionContent, VideoResource},
};

fn section_prompt(section: &Section, image: Option<&ExtractedFrame>, language: &str) -> String {
    let mut prompt = format!(
        r#"You are writing one section of a work report based on a screen recording.

IMPORTANT: Write in {language}.

SECTION: "{title}", from {start} to {end} of the video. Only describe what happens in this time range.

Describe in detail:
- The concrete operations performed, in order
- The tools, applications and files used
- What was typed, entered or configured
- Any inefficiencies or wasted effort, and any good practices worth keeping

Write the body as markdown. Do not repeat the section title as a heading."#,
        title = section.title,
        start = section.start_time,
        end = section.end_time,
    );

    if let Some(frame) = image {
        prompt.push_str(&format!(
            "\n\nA screenshot taken at {} has already been inserted above your text. \
             Do not insert or describe image links yourself; write text that reads naturally \
             next to that screenshot.",
            frame.timestamp
        ));
    }

    prompt
}

fn heading(section: &Section) -> String {
    format!(
        "## {} ({} - {})\n\n",
        section.title, section.start_time, section.end_time
    )
}

fn image_block(section: &Section, frame: &ExtractedFrame) -> String {
    let caption = section
        .screenshot_reason
        .as_deref()
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .unwrap_or(&section.title);
    format!("![{}]({})\n\n*{}*\n\n", caption, frame.reference, caption)
}

/// Render a section from generated narrative.
pub fn compose_section(
    section: &Section,
    image: Option<&ExtractedFrame>,
    narrative: &str,
) -> SectionContent {
    let mut fragment = heading(section);
    if let Some(frame) = image {
        fragment.push_str(&image_block(section, frame));
    }
    fragment.push_str(narrative.trim());
    fragment.push('\n');

    SectionContent {
        section_id: section.id,
        fragment,
        failed: false,
    }
}

/// Render a visible error marker in place of a section's narrative.
pub fn compose_failed_section(
    section: &Section,
    image: Option<&ExtractedFrame>,
    error: &ReportError,
) -> SectionContent {
    let mut fragment = heading(section);
    if let Some(frame) = image {
        fragment.push_str(&image_block(section, frame));
    }
    fragment.push_str(&format!(
        "> **Error:** this section could not be generated ({}).\n",
        error
    ));

    SectionContent {
        section_id: section.id,
        fragment,
        failed: true,
    }
}

/// Phase 3: write the narrative for one section.
pub async fn report<P: VlmProvider + ?Sized>(
    provider: &P,
    video: &VideoResource,
    models: &[String],
    section: &Section,
    image: Option<&ExtractedFrame>,
    language: &str,
) -> Result<SectionContent> {
    let prompt = section_prompt(section, image, language);
    let request = GenerationRequest {
        video,
        prompt: &prompt,
        format: ResponseFormat::Text,
    };

    let narrative = FallbackInvoker::new(provider)
        .invoke(models, request)
        .await
        .map_err(|source| ReportError::SectionGenerationFailed {
            section_id: section.id,
            source,
        })?;

    info!(section = section.id, chars = narrative.len(), "section generated");
    Ok(compose_section(section, image, &narrative))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::fallback::FallbackError;

    fn section() -> Section {
        Section {
            id: 2,
            title: "Writing tests".to_string(),
            start_time: "04:10".to_string(),
            end_time: "08:00".to_string(),
            screenshot_timestamp: Some("05:00".to_string()),
            screenshot_reason: Some("Test runner output".to_string()),
        }
    }

    fn frame() -> ExtractedFrame {
        ExtractedFrame {
            section_id: 2,
            timestamp: "05:00".to_string(),
            path: PathBuf::from("output/images/sec_2_05-00.jpg"),
            reference: "images/sec_2_05-00.jpg".to_string(),
        }
    }

    #[test]
    fn fragment_orders_heading_image_then_text() {
        let content = compose_section(&section(), Some(&frame()), "  Ran the suite.\n");
        assert_eq!(
            content.fragment,
            "## Writing tests (04:10 - 08:00)\n\n\
             ![Test runner output](images/sec_2_05-00.jpg)\n\n\
             *Test runner output*\n\n\
             Ran the suite.\n"
        );
        assert!(!content.failed);
    }

    #[test]
    fn fragment_without_image_has_no_embed() {
        let content = compose_section(&section(), None, "Text");
        assert!(!content.fragment.contains("!["));
    }

    #[test]
    fn caption_falls_back_to_title() {
        let mut s = section();
        s.screenshot_reason = None;
        let content = compose_section(&s, Some(&frame()), "Text");
        assert!(content.fragment.contains("![Writing tests](images/sec_2_05-00.jpg)"));
    }

    #[test]
    fn failed_section_has_visible_marker() {
        let error = ReportError::SectionGenerationFailed {
            section_id: 2,
            source: FallbackError::Exhausted { attempted: 3 },
        };
        let content = compose_failed_section(&section(), None, &error);
        assert!(content.failed);
        assert!(content.fragment.starts_with("## Writing tests"));
        assert!(content.fragment.contains("**Error:**"));
        assert!(content.fragment.contains("all 3 models failed"));
    }

    #[test]
    fn prompt_mentions_range_and_inserted_image() {
        let with_image = section_prompt(&section(), Some(&frame()), "English");
        assert!(with_image.contains("from 04:10 to 08:00"));
        assert!(with_image.contains("already been inserted"));

        let without = section_prompt(&section(), None, "English");
        assert!(!without.contains("already been inserted"));
    }
}
