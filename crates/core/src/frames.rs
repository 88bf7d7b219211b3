use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::{fs, process::Command};
use tracing::{debug, info};

use crate::{
    format::{TimestampError, parse_timestamp},
    layout::OutputLayout,
    types::{ExtractedFrame, Section},
};

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] TimestampError),

    #[error("cannot open {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("frame {index} is past the end of the stream ({frame_count} frames)")]
    PastEnd { index: u64, frame_count: u64 },

    #[error("decoder returned no frame at index {index}")]
    NoFrame { index: u64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Random-access frame source for a local video.
#[async_trait]
pub trait VideoDecoder: Send + Sync {
    type Handle: Send + Sync;

    async fn open(&self, path: &Path) -> Result<Self::Handle, FrameError>;

    fn frame_rate(&self, handle: &Self::Handle) -> f64;

    /// Decode exactly one frame and return it as encoded image bytes.
    async fn seek_and_read(&self, handle: &Self::Handle, index: u64) -> Result<Vec<u8>, FrameError>;
}

/// Frame index shown at `seconds` into a stream running at `fps`.
pub fn frame_index(fps: f64, seconds: u64) -> u64 {
    (fps * seconds as f64).round().max(0.0) as u64
}

/// Produces one still per section and persists it under the output layout.
pub struct FrameExtractor<'a, D: VideoDecoder> {
    decoder: &'a D,
    layout: &'a OutputLayout,
}

impl<'a, D: VideoDecoder> FrameExtractor<'a, D> {
    pub fn new(decoder: &'a D, layout: &'a OutputLayout) -> Self {
        Self { decoder, layout }
    }

    /// Decode the frame shown at `timestamp` (`MM:SS` or `HH:MM:SS`).
    pub async fn extract(&self, video_path: &Path, timestamp: &str) -> Result<Vec<u8>, FrameError> {
        let seconds = parse_timestamp(timestamp)?;
        let handle = self.decoder.open(video_path).await?;
        let fps = self.decoder.frame_rate(&handle);
        let index = frame_index(fps, seconds);
        debug!(timestamp, seconds, fps, index, "seeking frame");
        self.decoder.seek_and_read(&handle, index).await
    }

    /// Extract the section's screenshot, if it names one, and write it to disk.
    pub async fn extract_for_section(
        &self,
        video_path: &Path,
        section: &Section,
    ) -> Result<Option<ExtractedFrame>, FrameError> {
        let Some(timestamp) = section.screenshot_timestamp.as_deref() else {
            return Ok(None);
        };

        let image = self.extract(video_path, timestamp).await?;
        let path = self.layout.screenshot_path(section.id, timestamp);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &image).await?;
        info!(section = section.id, path = %path.display(), "screenshot saved");

        Ok(Some(ExtractedFrame {
            section_id: section.id,
            timestamp: timestamp.to_string(),
            reference: self.layout.screenshot_reference(section.id, timestamp),
            path,
        }))
    }
}

/// Stream metadata reported by ffprobe.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub fps: f64,
    pub frame_count: Option<u64>,
    pub bit_rate: Option<u64>,
}

/// Parse an ffprobe rational such as `30000/1001`.
pub fn parse_frame_rate(value: &str) -> Option<f64> {
    let (num, den) = match value.split_once('/') {
        Some((num, den)) => (num.trim().parse::<f64>().ok()?, den.trim().parse::<f64>().ok()?),
        None => (value.trim().parse::<f64>().ok()?, 1.0),
    };
    (den > 0.0 && num > 0.0).then(|| num / den)
}

fn parse_probe_output(json: &serde_json::Value) -> Option<VideoInfo> {
    let stream = &json["streams"][0];
    let fps = parse_frame_rate(stream["r_frame_rate"].as_str()?)?;
    let number = |value: &serde_json::Value| -> Option<f64> {
        value
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .or_else(|| value.as_f64())
    };

    let frame_count = number(&stream["nb_frames"])
        .or_else(|| number(&json["format"]["duration"]).map(|duration| duration * fps))
        .map(|count| count.round() as u64);
    let bit_rate = number(&stream["bit_rate"])
        .or_else(|| number(&json["format"]["bit_rate"]))
        .map(|rate| rate as u64);

    Some(VideoInfo {
        fps,
        frame_count,
        bit_rate,
    })
}

/// Probe the first video stream with ffprobe.
pub async fn probe_video(path: &Path) -> Result<VideoInfo, FrameError> {
    let open_error = |reason: String| FrameError::Open {
        path: path.to_path_buf(),
        reason,
    };

    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-select_streams")
        .arg("v:0")
        .arg("-show_entries")
        .arg("stream=r_frame_rate,nb_frames,bit_rate:format=duration,bit_rate")
        .arg("-of")
        .arg("json")
        .arg(path)
        .output()
        .await?;

    if !output.status.success() {
        return Err(open_error(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| open_error(format!("unreadable ffprobe output: {e}")))?;
    parse_probe_output(&json).ok_or_else(|| open_error("no video stream".to_string()))
}

/// Decoder backed by the ffprobe and ffmpeg executables.
#[derive(Debug, Default, Clone)]
pub struct FfmpegDecoder;

pub struct FfmpegHandle {
    path: PathBuf,
    info: VideoInfo,
}

#[async_trait]
impl VideoDecoder for FfmpegDecoder {
    type Handle = FfmpegHandle;

    async fn open(&self, path: &Path) -> Result<FfmpegHandle, FrameError> {
        if !path.exists() {
            return Err(FrameError::Open {
                path: path.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }
        let info = probe_video(path).await?;
        Ok(FfmpegHandle {
            path: path.to_path_buf(),
            info,
        })
    }

    fn frame_rate(&self, handle: &FfmpegHandle) -> f64 {
        handle.info.fps
    }

    async fn seek_and_read(&self, handle: &FfmpegHandle, index: u64) -> Result<Vec<u8>, FrameError> {
        if let Some(frame_count) = handle.info.frame_count
            && index >= frame_count
        {
            return Err(FrameError::PastEnd { index, frame_count });
        }

        let output = Command::new("ffmpeg")
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(&handle.path)
            .arg("-vf")
            .arg(format!("select=eq(n\\,{})", index))
            .arg("-vframes")
            .arg("1")
            .arg("-q:v")
            .arg("2")
            .arg("-f")
            .arg("image2pipe")
            .arg("-vcodec")
            .arg("mjpeg")
            .arg("pipe:1")
            .output()
            .await?;

        if !output.status.success() || output.stdout.is_empty() {
            return Err(FrameError::NoFrame { index });
        }
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn frame_index_rounds_to_nearest() {
        assert_eq!(frame_index(30.0, 0), 0);
        assert_eq!(frame_index(30.0, 10), 300);
        assert_eq!(frame_index(29.97, 10), 300);
        assert_eq!(frame_index(23.976, 61), 1463);
    }

    #[test]
    fn parses_rational_frame_rates() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn probe_prefers_stream_frame_count() {
        let probe = json!({
            "streams": [{ "r_frame_rate": "30/1", "nb_frames": "900", "bit_rate": "200000" }],
            "format": { "duration": "31.0" }
        });
        let info = parse_probe_output(&probe).unwrap();
        assert_eq!(info.fps, 30.0);
        assert_eq!(info.frame_count, Some(900));
        assert_eq!(info.bit_rate, Some(200_000));
    }

    #[test]
    fn probe_falls_back_to_duration() {
        let probe = json!({
            "streams": [{ "r_frame_rate": "10/1" }],
            "format": { "duration": "12.5", "bit_rate": "64000" }
        });
        let info = parse_probe_output(&probe).unwrap();
        assert_eq!(info.frame_count, Some(125));
        assert_eq!(info.bit_rate, Some(64_000));
    }

    #[test]
    fn probe_without_stream_is_none() {
        assert_eq!(parse_probe_output(&json!({ "streams": [] })), None);
    }
}
