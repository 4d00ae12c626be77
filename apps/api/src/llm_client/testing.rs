//! Scripted provider for unit tests. Responses are chosen per call by a closure that
//! sees the full request, so concurrent agents can be scripted independently.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{Completion, CompletionRequest, LlmProvider, ProviderError};

type Responder = dyn Fn(&CompletionRequest<'_>) -> Result<Completion, ProviderError> + Send + Sync;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub system: String,
    pub model: String,
}

pub struct ScriptedProvider {
    responder: Box<Responder>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&CompletionRequest<'_>) -> Result<Completion, ProviderError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            delay: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Like `new`, but every call sleeps first. Pair with a paused tokio clock.
    pub fn with_delay<F>(delay: Duration, responder: F) -> Arc<Self>
    where
        F: Fn(&CompletionRequest<'_>) -> Result<Completion, ProviderError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            delay: Some(delay),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Always answers with the same text.
    pub fn fixed(text: &str, input_tokens: u64, output_tokens: u64) -> Arc<Self> {
        let text = text.to_string();
        Self::new(move |_| Ok(completion(&text, input_tokens, output_tokens)))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn models_for(&self, system: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.system == system)
            .map(|c| c.model)
            .collect()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn invoke(&self, request: CompletionRequest<'_>) -> Result<Completion, ProviderError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: request.system.to_string(),
            model: request.model.to_string(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(&request)
    }
}

pub fn completion(text: &str, input_tokens: u64, output_tokens: u64) -> Completion {
    Completion {
        text: text.to_string(),
        input_tokens,
        output_tokens,
    }
}
