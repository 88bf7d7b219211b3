use std::path::{Path, PathBuf};

use tokio::{fs, process::Command};
use tracing::{info, warn};

use crate::{
    error::{ReportError, Result},
    frames::probe_video,
    layout::find_videos,
};

/// Playback speed-up for a recording running at `fps`.
pub fn speed_factor(fps: f64) -> f64 {
    fps / 2.0
}

pub fn timelapse_filter(fps: f64) -> String {
    format!("setpts=PTS/{},fps={}", speed_factor(fps), fps)
}

/// Convert one screen recording into a compact timelapse.
pub async fn convert_video(input: &Path, output: &Path) -> Result<()> {
    let failed = |reason: String| ReportError::TimelapseFailed {
        path: input.to_path_buf(),
        reason,
    };

    let info = probe_video(input).await.map_err(|e| failed(e.to_string()))?;
    info!(
        input = %input.display(),
        fps = info.fps,
        bit_rate_kbps = info.bit_rate.unwrap_or(0) / 1000,
        speed = speed_factor(info.fps),
        "converting to timelapse"
    );

    // CRF keeps quality stable once consecutive frames stop being similar.
    let output_status = Command::new("ffmpeg")
        .arg("-y")
        .arg("-v")
        .arg("error")
        .arg("-i")
        .arg(input)
        .arg("-filter:v")
        .arg(timelapse_filter(info.fps))
        .arg("-c:v")
        .arg("libx264")
        .arg("-crf")
        .arg("28")
        .arg("-preset")
        .arg("veryslow")
        .arg("-an")
        .arg(output)
        .output()
        .await?;

    if !output_status.status.success() {
        return Err(failed(
            String::from_utf8_lossy(&output_status.stderr).trim().to_string(),
        ));
    }
    Ok(())
}

/// Convert every video in `input_dir`, writing results with the same name to `output_dir`.
///
/// Returns the converted outputs alongside the per-file failures.
pub async fn convert_dir(
    input_dir: &Path,
    output_dir: &Path,
) -> Result<(Vec<PathBuf>, Vec<ReportError>)> {
    fs::create_dir_all(output_dir).await?;

    let mut converted = Vec::new();
    let mut failures = Vec::new();
    for input in find_videos(input_dir) {
        let Some(name) = input.file_name() else {
            continue;
        };
        let output = output_dir.join(name);
        match convert_video(&input, &output).await {
            Ok(()) => converted.push(output),
            Err(e) => {
                warn!(input = %input.display(), error = %e, "timelapse conversion failed");
                failures.push(e);
            }
        }
    }
    Ok((converted, failures))
}
