use std::path::{Path, PathBuf};

use crate::format::safe_timestamp;

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "mkv"];

/// Where the report and its screenshots are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub output_dir: PathBuf,
    pub report_file: String,
    pub screenshot_dir: String,
}

impl OutputLayout {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        report_file: impl Into<String>,
        screenshot_dir: impl Into<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            report_file: report_file.into(),
            screenshot_dir: screenshot_dir.into(),
        }
    }

    /// Get the path of the report document
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file)
    }

    pub fn screenshot_dir_path(&self) -> PathBuf {
        self.output_dir.join(&self.screenshot_dir)
    }

    pub fn screenshot_path(&self, section_id: u32, timestamp: &str) -> PathBuf {
        self.screenshot_dir_path()
            .join(screenshot_file_name(section_id, timestamp))
    }

    /// Path of a screenshot relative to the report document.
    pub fn screenshot_reference(&self, section_id: u32, timestamp: &str) -> String {
        format!(
            "{}/{}",
            self.screenshot_dir.trim_end_matches('/'),
            screenshot_file_name(section_id, timestamp)
        )
    }
}

pub fn screenshot_file_name(section_id: u32, timestamp: &str) -> String {
    format!("sec_{}_{}.jpg", section_id, safe_timestamp(timestamp))
}

/// List video files directly inside `dir`, sorted by name
pub fn find_videos(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut videos: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        })
        .collect();
    videos.sort();
    videos
}
