use std::{
    path::Path,
    time::{Duration, Instant},
};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use workreport_core::{
    PipelineObserver, ReportError, ReportStructure, Section, SectionContent, VideoResource,
};

pub fn format_duration(d: Duration) -> String {
    if d.as_secs() < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        let secs = d.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn elapsed(start: Instant) -> String {
    style(format!("[{}]", format_duration(start.elapsed())))
        .dim()
        .to_string()
}

/// Narrates pipeline progress with spinners, one step at a time.
pub struct CliProgress {
    spinner: Option<ProgressBar>,
    step_start: Instant,
}

impl CliProgress {
    pub fn new() -> Self {
        Self {
            spinner: None,
            step_start: Instant::now(),
        }
    }

    fn start(&mut self, msg: &str) {
        self.abandon();
        self.step_start = Instant::now();
        self.spinner = Some(create_spinner(msg));
    }

    fn finish(&mut self, msg: String) {
        match self.spinner.take() {
            Some(spinner) => spinner.finish_with_message(msg),
            None => println!("{}", msg),
        }
    }

    /// Stop the current spinner without a success line.
    pub fn abandon(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl PipelineObserver for CliProgress {
    fn upload_started(&mut self, path: &Path) {
        self.start(&format!("Uploading {}...", path.display()));
    }

    fn video_ready(&mut self, video: &VideoResource) {
        let msg = format!(
            "{} Uploaded and processed: {} {}",
            style("✓").green().bold(),
            style(&video.name).dim(),
            elapsed(self.step_start)
        );
        self.finish(msg);
        self.start("Analyzing structure...");
    }

    fn structure_ready(&mut self, structure: &ReportStructure) {
        let msg = format!(
            "{} Structure: {} ({} sections) {}",
            style("✓").green().bold(),
            style(&structure.title).cyan(),
            structure.sections.len(),
            elapsed(self.step_start)
        );
        self.finish(msg);
    }

    fn section_started(&mut self, index: usize, total: usize, section: &Section) {
        self.start(&format!(
            "[{}/{}] {} ({} - {})...",
            index + 1,
            total,
            section.title,
            section.start_time,
            section.end_time
        ));
    }

    fn frame_failed(&mut self, section: &Section, error: &ReportError) {
        if let Some(spinner) = &self.spinner {
            spinner.println(format!(
                "  {} No screenshot for section {}: {}",
                style("!").yellow().bold(),
                section.id,
                error
            ));
        }
    }

    fn section_finished(&mut self, index: usize, total: usize, content: &SectionContent) {
        let mark = if content.failed {
            style("✗").red().bold()
        } else {
            style("✓").green().bold()
        };
        let msg = format!(
            "{} [{}/{}] Section {}{} {}",
            mark,
            index + 1,
            total,
            content.section_id,
            if content.failed { " failed" } else { "" },
            elapsed(self.step_start)
        );
        self.finish(msg);
    }
}
