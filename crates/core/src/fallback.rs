use thiserror::Error;
use tracing::{info, warn};

use crate::{
    provider::{ResponseFormat, VlmProvider},
    types::VideoResource,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FallbackError {
    #[error("no models configured")]
    NoModels,

    #[error("all {attempted} models failed")]
    Exhausted { attempted: usize },
}

/// A prompt sent together with the uploaded video.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub video: &'a VideoResource,
    pub prompt: &'a str,
    pub format: ResponseFormat,
}

/// Tries an ordered list of models until one produces a usable response.
pub struct FallbackInvoker<'a, P: VlmProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: VlmProvider + ?Sized> FallbackInvoker<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Return the first non-empty text produced by `models`, tried in order.
    pub async fn invoke(
        &self,
        models: &[String],
        request: GenerationRequest<'_>,
    ) -> Result<String, FallbackError> {
        self.invoke_parsed(models, request, |text| {
            if text.trim().is_empty() {
                Err("empty response".to_string())
            } else {
                Ok(text.to_string())
            }
        })
        .await
    }

    /// Like [`invoke`](Self::invoke), but a response rejected by `parse` counts as
    /// that model's failure and the next model is tried.
    pub async fn invoke_parsed<T, F>(
        &self,
        models: &[String],
        request: GenerationRequest<'_>,
        parse: F,
    ) -> Result<T, FallbackError>
    where
        F: Fn(&str) -> Result<T, String>,
    {
        if models.is_empty() {
            return Err(FallbackError::NoModels);
        }

        for model in models {
            info!(model = %model, "generating");
            let text = match self
                .provider
                .generate(model, request.video, request.prompt, request.format)
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    warn!(model = %model, error = %e, "model failed, trying next");
                    continue;
                }
            };

            match parse(&text) {
                Ok(value) => return Ok(value),
                Err(reason) => {
                    warn!(model = %model, %reason, "unusable response, trying next");
                }
            }
        }

        Err(FallbackError::Exhausted {
            attempted: models.len(),
        })
    }
}
