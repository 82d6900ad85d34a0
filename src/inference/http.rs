use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{InferenceClient, InferenceError, InferenceReply, InferenceRequest};
use crate::config::InferenceProtocol;
use crate::profiles::services::{ANY_CUISINE, NO_DIETARY_PREFS};

/// Model endpoint reached over HTTP with a JSON request body.
#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    client: reqwest::Client,
    endpoint: String,
    protocol: InferenceProtocol,
    api_token: Option<String>,
}

impl HttpInferenceClient {
    pub fn new(
        endpoint: impl Into<String>,
        protocol: InferenceProtocol,
        api_token: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build inference http client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            protocol,
            api_token,
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    repetition_penalty: f32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            max_new_tokens: 1000,
            temperature: 0.7,
            top_p: 0.9,
            repetition_penalty: 1.2,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    #[serde(flatten)]
    request: &'a InferenceRequest,
    parameters: GenerationParameters,
}

/// Positional Gradio predict input. The Space spells its empty defaults
/// "None" and "Any".
#[derive(Debug, Serialize)]
struct GradioBody<'a> {
    data: [&'a str; 4],
}

impl<'a> GradioBody<'a> {
    fn new(request: &'a InferenceRequest) -> Self {
        let dietary = match request.dietary_prefs.as_str() {
            NO_DIETARY_PREFS => "None",
            other => other,
        };
        let cuisines = match request.favorite_cuisines.as_str() {
            ANY_CUISINE => "Any",
            other => other,
        };
        Self {
            data: [
                request.ingredients.as_str(),
                dietary,
                request.allergies.as_str(),
                cuisines,
            ],
        }
    }
}

/// Reply shapes accepted from JSON endpoints.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplyBody {
    // Gradio predict: {"data": ["<markdown>", ...]}
    Predict { data: Vec<Value> },
    // text-generation: {"generated_text": "..."}
    Generated { generated_text: String },
    // text-generation batch: [{"generated_text": "..."}]
    GeneratedBatch(Vec<GeneratedText>),
    // chat completions: {"choices": [{"message": {"content": "..."}}]}
    Chat { choices: Vec<ChatChoice> },
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl ReplyBody {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Predict { data } => data.into_iter().next().and_then(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            }),
            Self::Generated { generated_text } => Some(generated_text),
            Self::GeneratedBatch(items) => items.into_iter().next().map(|g| g.generated_text),
            Self::Chat { choices } => choices.into_iter().next().and_then(|c| c.message.content),
        }
    }
}

/// Turns a successful HTTP body into reply text. JSON bodies must match one
/// of the known shapes; anything else is taken as plain text.
pub(crate) fn parse_reply(
    content_type: Option<&str>,
    body: &str,
) -> Result<InferenceReply, InferenceError> {
    if body.trim().is_empty() {
        return Err(InferenceError::EmptyReply);
    }

    let is_json = content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));
    let text = if is_json {
        let parsed: ReplyBody = serde_json::from_str(body)
            .map_err(|e| InferenceError::MalformedReply(e.to_string()))?;
        parsed.into_text().ok_or_else(|| {
            InferenceError::MalformedReply("reply carries no text output".into())
        })?
    } else {
        body.to_string()
    };

    if text.trim().is_empty() {
        return Err(InferenceError::EmptyReply);
    }
    Ok(InferenceReply::new(text))
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn generate(&self, request: &InferenceRequest) -> Result<InferenceReply, InferenceError> {
        let req = self.client.post(&self.endpoint);
        let mut req = match self.protocol {
            InferenceProtocol::Gradio => req.json(&GradioBody::new(request)),
            InferenceProtocol::Json => req.json(&GenerateBody {
                request,
                parameters: GenerationParameters::default(),
            }),
        };
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await.map_err(|e| {
            warn!(error = %e, endpoint = %self.endpoint, "inference request failed");
            InferenceError::Connect(e.to_string())
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let text = response.text().await.map_err(|e| {
            warn!(error = %e, "reading inference reply failed");
            InferenceError::Connect(e.to_string())
        })?;

        if !status.is_success() {
            let preview: String = text.chars().take(300).collect();
            warn!(%status, body = %preview, "inference service returned error status");
            return Err(InferenceError::Unavailable {
                status: status.as_u16(),
            });
        }

        let reply = parse_reply(content_type.as_deref(), &text)?;
        debug!(len = reply.text.len(), "inference reply received");
        Ok(reply)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
