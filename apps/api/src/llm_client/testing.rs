//! Scripted `CompletionGateway` double for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatMessage, CompletionGateway, LlmError};

type Responder = Box<dyn Fn(&[ChatMessage]) -> Result<String, LlmError> + Send + Sync>;

/// Answers completion calls from a queue of canned results. Once the queue is
/// drained, every further call is answered by the responder.
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    responder: Responder,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedGateway {
    /// Every call returns `text`.
    pub fn always(text: &str) -> Self {
        let text = text.to_string();
        Self::responding(move |_| Ok(text.clone()))
    }

    /// Every call fails with `error`.
    pub fn failing(error: LlmError) -> Self {
        Self::responding(move |_| Err(error.clone()))
    }

    /// Every call is answered by `f`, which sees the prompt.
    pub fn responding(
        f: impl Fn(&[ChatMessage]) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            responder: Box::new(f),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queues results served before the responder is consulted.
    pub fn then(self, replies: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
        self.replies.lock().unwrap().extend(replies);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let queued = self.replies.lock().unwrap().pop_front();
        match queued {
            Some(reply) => reply,
            None => (self.responder)(messages),
        }
    }
}

/// Concatenated prompt text, for routing scripted replies by content.
pub fn prompt_text(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
