use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Processing state of an uploaded file on the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    Processing,
    Active,
    Failed,
    /// Also covers `STATE_UNSPECIFIED` and any state this client does not know.
    #[serde(other)]
    Pending,
}

impl FileState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FileState::Active | FileState::Failed)
    }
}

/// Handle to a video uploaded to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoResource {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    pub state: FileState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportStructure {
    pub title: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: u32,
    pub title: String,
    #[serde(alias = "start")]
    pub start_time: String,
    #[serde(alias = "end")]
    pub end_time: String,
    #[serde(default, alias = "screenshot_time")]
    pub screenshot_timestamp: Option<String>,
    #[serde(default)]
    pub screenshot_reason: Option<String>,
}

/// A still image persisted for one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFrame {
    pub section_id: u32,
    pub timestamp: String,
    /// Where the image was written.
    pub path: PathBuf,
    /// Path relative to the report document.
    pub reference: String,
}

/// One rendered section, ready to append to the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionContent {
    pub section_id: u32,
    pub fragment: String,
    pub failed: bool,
}
