//! Deterministic stand-in for the model endpoint.
//!
//! Used by tests, and by local development with `INFERENCE_PROVIDER=fake`,
//! where it answers every request with a small recipe built from the
//! submitted ingredients.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use super::{InferenceClient, InferenceError, InferenceReply, InferenceRequest};

#[derive(Debug)]
enum Fallback {
    Canned,
    #[cfg(test)]
    Reply(String),
    #[cfg(test)]
    Fail(InferenceError),
}

#[derive(Debug)]
pub struct FakeInferenceClient {
    /// (prompt substring, reply), matched case-insensitively in order.
    replies: Vec<(String, String)>,
    fallback: Fallback,
    seen: Mutex<Vec<InferenceRequest>>,
}

impl FakeInferenceClient {
    fn with_fallback(fallback: Fallback) -> Self {
        Self {
            replies: Vec::new(),
            fallback,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Answers with a recipe assembled from the request's ingredients.
    pub fn canned() -> Self {
        Self::with_fallback(Fallback::Canned)
    }

    /// Answers every unmatched prompt with `reply`.
    #[cfg(test)]
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::with_fallback(Fallback::Reply(reply.into()))
    }

    /// Fails every unmatched prompt with `error`.
    #[cfg(test)]
    pub fn failing(error: InferenceError) -> Self {
        Self::with_fallback(Fallback::Fail(error))
    }

    #[cfg(test)]
    pub fn with_reply(mut self, prompt_contains: &str, reply: &str) -> Self {
        self.replies
            .push((prompt_contains.to_lowercase(), reply.to_string()));
        self
    }

    /// Requests received so far, oldest first.
    #[cfg(test)]
    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    fn canned_reply(request: &InferenceRequest) -> String {
        let ingredients: Vec<String> = request
            .ingredients
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let recipe = json!({
            "title": "Pantry Skillet",
            "description": format!("A quick skillet using {}.", request.ingredients),
            "ingredients": ingredients,
            "instructions": [
                "Prep all ingredients.",
                "Cook everything in a hot skillet with a little oil.",
                "Season with salt and pepper and serve."
            ],
            "prep_time": "20 minutes"
        });
        format!("Here is a recipe for you.\n\n```json\n{recipe:#}\n```")
    }
}

#[async_trait]
impl InferenceClient for FakeInferenceClient {
    async fn generate(&self, request: &InferenceRequest) -> Result<InferenceReply, InferenceError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }

        let prompt = request.prompt.to_lowercase();
        if let Some((_, reply)) = self
            .replies
            .iter()
            .find(|(pattern, _)| prompt.contains(pattern.as_str()))
        {
            return Ok(InferenceReply::new(reply.clone()));
        }

        match &self.fallback {
            Fallback::Canned => Ok(InferenceReply::new(Self::canned_reply(request))),
            #[cfg(test)]
            Fallback::Reply(reply) => Ok(InferenceReply::new(reply.clone())),
            #[cfg(test)]
            Fallback::Fail(error) => Err(error.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
