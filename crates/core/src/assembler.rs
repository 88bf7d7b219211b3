use std::path::{Path, PathBuf};

use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::debug;

use crate::{error::Result, types::SectionContent};

pub const PREAMBLE: &str =
    "This report was generated automatically from a screen recording of the work session.";
pub const SEPARATOR: &str = "\n---\n\n";

/// Append-only writer for the report document.
///
/// Every call opens the file, writes, syncs and closes it again, so whatever was
/// appended before a crash stays on disk.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    /// Create (or truncate) the document with its title and preamble.
    pub async fn init(path: impl Into<PathBuf>, title: &str) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&path).await?;
        file.write_all(format!("# {}\n\n{}\n\n", title.trim(), PREAMBLE).as_bytes())
            .await?;
        file.flush().await?;
        file.sync_all().await?;
        debug!(path = %path.display(), "report initialized");

        Ok(Self { path })
    }

    /// Append a fragment followed by the section separator.
    pub async fn append(&self, fragment: &str) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path).await?;
        let mut block = String::with_capacity(fragment.len() + SEPARATOR.len() + 1);
        block.push_str(fragment);
        if !fragment.ends_with('\n') {
            block.push('\n');
        }
        block.push_str(SEPARATOR);
        file.write_all(block.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    pub async fn append_section(&self, content: &SectionContent) -> Result<()> {
        debug!(section = content.section_id, failed = content.failed, "appending section");
        self.append(&content.fragment).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_then_appends_keep_call_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.md");

        let writer = ReportWriter::init(&path, "Title").await.unwrap();
        writer.append("first fragment").await.unwrap();
        writer.append("second fragment\n").await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("# Title").count(), 1);
        assert!(text.starts_with("# Title\n\n"));
        assert!(text.contains(PREAMBLE));

        let first = text.find("first fragment").unwrap();
        let second = text.find("second fragment").unwrap();
        assert!(first < second);
        assert!(text[first..second].contains("---"));
        assert!(text.ends_with(SEPARATOR));
    }

    #[tokio::test]
    async fn init_overwrites_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        std::fs::write(&path, "stale content").unwrap();

        ReportWriter::init(&path, "Fresh").await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("stale content"));
        assert!(text.starts_with("# Fresh"));
    }

    #[tokio::test]
    async fn append_without_init_fails() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter {
            path: dir.path().join("missing.md"),
        };
        assert!(writer.append("x").await.is_err());
    }
}
