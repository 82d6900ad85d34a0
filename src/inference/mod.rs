//! Client side of the hosted model endpoint.
//!
//! The endpoint is an external collaborator: slow, non-deterministic and
//! sometimes down. Callers get either the model's reply text or an
//! [`InferenceError`] saying which way the call failed.

mod fake;
mod http;

pub use fake::FakeInferenceClient;
pub use http::HttpInferenceClient;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::{InferenceConfig, InferenceProvider};

/// Everything the endpoint needs to generate one recipe. The structured fields
/// mirror what is already rendered into `prompt`, for endpoints that build
/// their own prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferenceRequest {
    pub system: String,
    pub prompt: String,
    pub ingredients: String,
    pub dietary_prefs: String,
    pub allergies: String,
    pub favorite_cuisines: String,
}

/// Raw reply text from the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceReply {
    pub text: String,
}

impl InferenceReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// True when the model answered but ignored the JSON instruction: there is
    /// no `{ ... }` span anywhere in the reply.
    pub fn is_prose_only(&self) -> bool {
        match (self.text.find('{'), self.text.rfind('}')) {
            (Some(start), Some(end)) => end < start,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("could not reach inference service: {0}")]
    Connect(String),

    #[error("inference service unavailable (HTTP {status})")]
    Unavailable { status: u16 },

    #[error("inference service returned a malformed reply: {0}")]
    MalformedReply(String),

    #[error("inference service returned an empty reply")]
    EmptyReply,
}

#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn generate(&self, request: &InferenceRequest) -> Result<InferenceReply, InferenceError>;

    /// Short name for logs ("http", "fake").
    fn name(&self) -> &'static str;
}

pub fn from_config(config: &InferenceConfig) -> anyhow::Result<Arc<dyn InferenceClient>> {
    match config.provider {
        InferenceProvider::Fake => Ok(Arc::new(FakeInferenceClient::canned())),
        InferenceProvider::Http => {
            let endpoint = config
                .endpoint
                .clone()
                .ok_or_else(|| anyhow::anyhow!("inference endpoint is not configured"))?;
            let client = HttpInferenceClient::new(
                endpoint,
                config.protocol,
                config.api_token.clone(),
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Arc::new(client))
        }
    }
}
