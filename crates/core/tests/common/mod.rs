#![allow(dead_code)]

use std::{
    collections::VecDeque,
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use workreport_core::{
    FileState, FrameError, ProviderError, ResponseFormat, VideoDecoder, VideoResource,
    VlmProvider,
};

type Responder =
    Box<dyn Fn(&str, &str, ResponseFormat) -> Result<String, ProviderError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateCall {
    pub model: String,
    pub prompt: String,
    pub format: ResponseFormat,
}

/// Scripted stand-in for the remote service.
pub struct FakeProvider {
    initial_state: FileState,
    poll_states: Mutex<VecDeque<FileState>>,
    responder: Responder,
    pub uploads: Mutex<u32>,
    pub polls: Mutex<u32>,
    pub calls: Arc<Mutex<Vec<GenerateCall>>>,
}

impl FakeProvider {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &str, ResponseFormat) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            initial_state: FileState::Active,
            poll_states: Mutex::new(VecDeque::new()),
            responder: Box::new(responder),
            uploads: Mutex::new(0),
            polls: Mutex::new(0),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// State right after upload, then the states returned by successive polls.
    pub fn with_states(mut self, initial: FileState, polls: &[FileState]) -> Self {
        self.initial_state = initial;
        self.poll_states = Mutex::new(polls.iter().copied().collect());
        self
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn models_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.model).collect()
    }

    pub fn poll_count(&self) -> u32 {
        *self.polls.lock().unwrap()
    }

    fn resource(&self, state: FileState) -> VideoResource {
        VideoResource {
            name: "files/fake-video".to_string(),
            uri: "https://example.test/files/fake-video".to_string(),
            mime_type: "video/mp4".to_string(),
            state,
        }
    }
}

pub fn remote_error(body: &str) -> ProviderError {
    ProviderError::ApiError {
        status: 503,
        body: body.to_string(),
    }
}

#[async_trait]
impl VlmProvider for FakeProvider {
    fn name(&self) -> &str {
        "Fake"
    }

    async fn upload(&self, _path: &Path) -> Result<VideoResource, ProviderError> {
        *self.uploads.lock().unwrap() += 1;
        Ok(self.resource(self.initial_state))
    }

    async fn get_state(&self, _resource: &VideoResource) -> Result<VideoResource, ProviderError> {
        *self.polls.lock().unwrap() += 1;
        let state = self
            .poll_states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FileState::Active);
        Ok(self.resource(state))
    }

    async fn generate(
        &self,
        model: &str,
        _video: &VideoResource,
        prompt: &str,
        format: ResponseFormat,
    ) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(GenerateCall {
            model: model.to_string(),
            prompt: prompt.to_string(),
            format,
        });
        (self.responder)(model, prompt, format)
    }
}

/// Decoder that records requested frame indices.
pub struct FakeDecoder {
    pub fps: f64,
    pub frame_count: u64,
    pub fail_open: bool,
    pub requested: Mutex<Vec<u64>>,
}

impl FakeDecoder {
    pub fn new(fps: f64, frame_count: u64) -> Self {
        Self {
            fps,
            frame_count,
            fail_open: false,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<u64> {
        self.requested.lock().unwrap().clone()
    }
}

pub fn frame_bytes(index: u64) -> Vec<u8> {
    format!("frame-{index}").into_bytes()
}

#[async_trait]
impl VideoDecoder for FakeDecoder {
    type Handle = ();

    async fn open(&self, path: &Path) -> Result<(), FrameError> {
        if self.fail_open {
            return Err(FrameError::Open {
                path: path.to_path_buf(),
                reason: "corrupt container".to_string(),
            });
        }
        Ok(())
    }

    fn frame_rate(&self, _handle: &()) -> f64 {
        self.fps
    }

    async fn seek_and_read(&self, _handle: &(), index: u64) -> Result<Vec<u8>, FrameError> {
        self.requested.lock().unwrap().push(index);
        if index >= self.frame_count {
            return Err(FrameError::PastEnd {
                index,
                frame_count: self.frame_count,
            });
        }
        Ok(frame_bytes(index))
    }
}

pub fn models(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
