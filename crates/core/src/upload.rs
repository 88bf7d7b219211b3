use std::{path::Path, time::Duration};

use tracing::{debug, info};

use crate::{
    error::{ReportError, Result},
    provider::{ProviderError, VlmProvider},
    types::{FileState, VideoResource},
};

/// Default pause between state polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Uploads a video and waits for the remote service to finish ingesting it.
pub struct UploadTracker<'a, P: VlmProvider + ?Sized> {
    provider: &'a P,
    poll_interval: Duration,
}

impl<'a, P: VlmProvider + ?Sized> UploadTracker<'a, P> {
    pub fn new(provider: &'a P, poll_interval: Duration) -> Self {
        Self {
            provider,
            poll_interval,
        }
    }

    pub async fn upload(&self, path: &Path) -> Result<VideoResource> {
        info!(path = %path.display(), provider = self.provider.name(), "uploading video");
        let resource = self
            .provider
            .upload(path)
            .await
            .map_err(|e| upload_error(path, e))?;
        info!(name = %resource.name, state = ?resource.state, "upload complete");
        Ok(resource)
    }

    /// Poll until the resource is `ACTIVE` or `FAILED`. No timeout is applied here.
    pub async fn await_ready(&self, mut resource: VideoResource) -> Result<VideoResource> {
        let mut polls = 0u32;
        while !resource.state.is_terminal() {
            tokio::time::sleep(self.poll_interval).await;
            resource = self.provider.get_state(&resource).await?;
            polls += 1;
            debug!(name = %resource.name, state = ?resource.state, polls, "polled video state");
        }

        match resource.state {
            FileState::Active => {
                info!(name = %resource.name, polls, "video is ready");
                Ok(resource)
            }
            _ => Err(ReportError::RemoteProcessingFailed {
                name: resource.name,
            }),
        }
    }

    /// Upload, then wait for the remote copy to become usable.
    pub async fn upload_and_wait(&self, path: &Path) -> Result<VideoResource> {
        let resource = self.upload(path).await?;
        self.await_ready(resource).await
    }
}

fn upload_error(path: &Path, err: ProviderError) -> ReportError {
    match err {
        ProviderError::MissingApiKey { env_var } => ReportError::AuthMissing { env_var },
        other => ReportError::UploadFailed {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}
